//! Portal entry-point: loads settings, wires the HTTP server and runs it.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use budget_portal::inbound::http::health::HealthState;
use budget_portal::inbound::http::session_config::fingerprint::key_fingerprint;
use budget_portal::inbound::http::session_config::{BuildMode, session_settings};
use server::{PortalSettings, ServerConfig, create_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = PortalSettings::load().map_err(|err| std::io::Error::other(err.to_string()))?;
    let session = session_settings(&settings.session_inputs(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session signing key loaded"
    );

    let bind_addr = settings.bind_addr();
    let config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    );
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, &settings, config).await?;
    info!(%bind_addr, "budget portal listening");
    server.await
}
