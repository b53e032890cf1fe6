//! Session cookie settings: signing key, `Secure` flag and `SameSite` policy.
//!
//! Values come from the portal settings; this module validates them against
//! the build mode so release binaries refuse weak configurations.

use actix_web::cookie::{Key, SameSite};
use std::path::{Path, PathBuf};
use tracing::warn;
use zeroize::Zeroize;

pub mod fingerprint;

/// Default location of the session key file.
pub const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
/// Shortest master key `Key::derive_from` accepts.
const DEBUG_SESSION_KEY_MIN_LEN: usize = 32;

/// Build mode used to pick defaults and strictness.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds fall back to defaults with a warning.
    Debug,
    /// Release builds reject invalid toggles and short keys.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// ```rust
    /// use budget_portal::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Raw session toggles as read from configuration.
#[derive(Debug, Clone)]
pub struct SessionInputs {
    pub key_file: Option<PathBuf>,
    pub allow_ephemeral: bool,
    pub cookie_secure: bool,
    pub same_site: Option<String>,
}

/// Validated settings for the cookie session middleware.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("invalid cookie SameSite policy '{value}'; expected Strict|Lax|None")]
    InvalidSameSite { value: String },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Browsers drop `SameSite=None` cookies that are not `Secure`.
    #[error("SameSite=None requires secure cookies")]
    InsecureSameSiteNone,
}

/// Validate session toggles and load the signing key.
///
/// # Errors
///
/// Release builds fail on an unknown `SameSite` value, `None` without
/// `Secure`, a short key, or an unreadable key file unless ephemeral keys are
/// allowed.
pub fn session_settings(
    inputs: &SessionInputs,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let same_site = same_site(inputs.same_site.as_deref(), mode, inputs.cookie_secure)?;
    let path = inputs
        .key_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH));
    let key = load_key(&path, mode, inputs.allow_ephemeral)?;
    if !inputs.cookie_secure {
        warn!("session cookies are not marked Secure");
    }
    Ok(SessionSettings {
        key,
        cookie_secure: inputs.cookie_secure,
        same_site,
    })
}

fn same_site(
    raw: Option<&str>,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" if mode.is_debug() => {
            warn!("SameSite=None without Secure; browsers may reject the session cookie");
            Ok(SameSite::None)
        }
        "none" => Err(SessionConfigError::InsecureSameSiteNone),
        _ if mode.is_debug() => {
            warn!(value, "invalid SameSite policy; using default");
            Ok(default)
        }
        _ => Err(SessionConfigError::InvalidSameSite {
            value: value.to_owned(),
        }),
    }
}

fn load_key(path: &Path, mode: BuildMode, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            let min_len = if mode.is_debug() {
                DEBUG_SESSION_KEY_MIN_LEN
            } else {
                SESSION_KEY_MIN_LEN
            };
            if length < min_len {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key; sessions will not survive a restart"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}
