//! Relay settings loaded via OrthoConfig from flags, `MAIL_RELAY_*`
//! variables and configuration files.

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_FROM_EMAIL: &str = "onboarding@resend.dev";
const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
/// Value shipped in sample environment files; treated as unset.
pub const PLACEHOLDER_API_KEY: &str = "your_resend_api_key";

/// Startup settings for the relay.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MAIL_RELAY")]
pub struct RelaySettings {
    /// TCP port to listen on.
    pub port: Option<u16>,
    /// Resend API key; the relay answers 503 without one.
    pub resend_api_key: Option<String>,
    /// Sender address shown to recipients.
    pub from_email: Option<String>,
    /// Base URL of the Resend API.
    pub resend_base_url: Option<String>,
}

impl RelaySettings {
    /// Port to listen on, 3001 by default.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Usable API key: blank values and the sample placeholder count as
    /// missing.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.resend_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }

    /// Sender address, `onboarding@resend.dev` by default.
    #[must_use]
    pub fn from_email(&self) -> &str {
        self.from_email.as_deref().unwrap_or(DEFAULT_FROM_EMAIL)
    }

    /// Resend API base URL.
    #[must_use]
    pub fn resend_base_url(&self) -> &str {
        self.resend_base_url
            .as_deref()
            .unwrap_or(DEFAULT_RESEND_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests fail loudly on bad fixtures")]

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    #[rstest]
    #[case(None, None)]
    #[case(Some("   "), None)]
    #[case(Some(PLACEHOLDER_API_KEY), None)]
    #[case(Some("re_live_key"), Some("re_live_key"))]
    fn api_key_ignores_placeholders(#[case] raw: Option<&str>, #[case] expected: Option<&str>) {
        let settings = RelaySettings {
            resend_api_key: raw.map(str::to_owned),
            ..RelaySettings::default()
        };
        assert_eq!(settings.api_key(), expected);
    }

    #[rstest]
    fn environment_overrides_defaults() {
        let _guard = lock_env([
            ("MAIL_RELAY_PORT", Some("4100".to_owned())),
            ("MAIL_RELAY_RESEND_API_KEY", Some("re_test".to_owned())),
            ("MAIL_RELAY_FROM_EMAIL", Some("budget@mairie.tn".to_owned())),
            ("MAIL_RELAY_RESEND_BASE_URL", None::<String>),
        ]);
        let settings = RelaySettings::load_from_iter([OsString::from("mail-relay")])
            .expect("settings load");
        assert_eq!(settings.port(), 4100);
        assert_eq!(settings.api_key(), Some("re_test"));
        assert_eq!(settings.from_email(), "budget@mairie.tn");
        assert_eq!(settings.resend_base_url(), DEFAULT_RESEND_BASE_URL);
    }
}
