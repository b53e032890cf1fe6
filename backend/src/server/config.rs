//! Portal settings loaded via OrthoConfig and the server configuration built
//! from them.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use budget_portal::inbound::http::session_config::SessionInputs;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAIL_RELAY_TIMEOUT_MS: u64 = 10_000;

/// Startup settings read from CLI flags, `PORTAL_*` variables and config
/// files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// File holding the session signing key material.
    pub session_key_file: Option<PathBuf>,
    /// Fall back to a generated key when the key file cannot be read.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Mark session cookies `Secure`.
    pub cookie_secure: Option<bool>,
    /// `SameSite` policy for the session cookie: Strict, Lax or None.
    pub cookie_same_site: Option<String>,
    /// Directory for the JSON document store; memory when unset.
    pub data_dir: Option<PathBuf>,
    /// Base URL of the mail relay delivering login codes.
    pub mail_relay_url: Option<String>,
    /// Upper bound on one code delivery, in milliseconds.
    pub mail_relay_timeout_ms: Option<u64>,
    /// Administrator created when the directory is empty.
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    /// Seed demonstration municipalities and ledgers on an empty store.
    #[ortho_config(default = false)]
    pub seed_demo_data: bool,
    /// Random seed for the demonstration figures.
    pub demo_seed: Option<u64>,
}

impl PortalSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }

    pub fn mail_relay_timeout(&self) -> Duration {
        Duration::from_millis(
            self.mail_relay_timeout_ms
                .unwrap_or(DEFAULT_MAIL_RELAY_TIMEOUT_MS),
        )
    }

    /// Session toggles for [`session_settings`](budget_portal::inbound::http::session_config::session_settings).
    pub fn session_inputs(&self) -> SessionInputs {
        SessionInputs {
            key_file: self.session_key_file.clone(),
            allow_ephemeral: self.session_allow_ephemeral,
            cookie_secure: self.cookie_secure.unwrap_or(true),
            same_site: self.cookie_same_site.clone(),
        }
    }

    /// Both bootstrap credentials, when configured.
    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_email, &self.bootstrap_admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Validated inputs for [`create_server`](super::create_server).
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "PORTAL_BIND_ADDR",
        "PORTAL_COOKIE_SECURE",
        "PORTAL_DATA_DIR",
        "PORTAL_MAIL_RELAY_URL",
        "PORTAL_MAIL_RELAY_TIMEOUT_MS",
        "PORTAL_SEED_DEMO_DATA",
    ];

    fn load() -> PortalSettings {
        PortalSettings::load_from_iter([OsString::from("budget-portal")])
            .expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));
        let settings = load();
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080".parse().expect("addr"));
        assert_eq!(settings.mail_relay_timeout(), Duration::from_secs(10));
        assert!(settings.session_inputs().cookie_secure);
        assert!(settings.data_dir.is_none());
        assert!(!settings.seed_demo_data);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PORTAL_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("PORTAL_COOKIE_SECURE", Some("false".to_owned())),
            ("PORTAL_DATA_DIR", Some("/srv/portal".to_owned())),
            ("PORTAL_MAIL_RELAY_URL", Some("http://relay:3001".to_owned())),
            ("PORTAL_MAIL_RELAY_TIMEOUT_MS", Some("2500".to_owned())),
            ("PORTAL_SEED_DEMO_DATA", Some("true".to_owned())),
        ]);
        let settings = load();
        assert_eq!(settings.bind_addr(), "127.0.0.1:9000".parse().expect("addr"));
        assert!(!settings.session_inputs().cookie_secure);
        assert_eq!(settings.data_dir, Some(PathBuf::from("/srv/portal")));
        assert_eq!(settings.mail_relay_url.as_deref(), Some("http://relay:3001"));
        assert_eq!(settings.mail_relay_timeout(), Duration::from_millis(2500));
        assert!(settings.seed_demo_data);
    }

    #[rstest]
    fn bootstrap_admin_needs_both_credentials() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));
        let mut settings = load();
        settings.bootstrap_admin_email = Some("admin@mairie.tn".to_owned());
        assert!(settings.bootstrap_admin().is_none());
        settings.bootstrap_admin_password = Some("change-me-now".to_owned());
        assert_eq!(
            settings.bootstrap_admin(),
            Some(("admin@mairie.tn", "change-me-now"))
        );
    }
}
