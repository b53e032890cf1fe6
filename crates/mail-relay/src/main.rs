//! Mail relay entry-point.

use std::net::{Ipv4Addr, SocketAddr};

use actix_web::{App, HttpServer, web};
use mail_relay::{RelaySettings, build_state, configure};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        RelaySettings::load().map_err(|err| std::io::Error::other(err.to_string()))?;
    let state = web::Data::new(build_state(&settings).map_err(std::io::Error::other)?);
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port()));
    info!(
        %addr,
        provider_configured = state.provider_configured(),
        "mail relay listening"
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(addr)?
        .run()
        .await
}
