use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;

use super::{ConfigError, MIN_SECRET_KEY_LEN};

/// The resolved configuration of an application.
///
/// Every recognized key is a typed field. Keys the framework does not know
/// about are kept in `extra` and can be read with [`Settings::get`].
///
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub session_cookie_name: String,
    pub secret_key: Option<String>,
    /// Lifetime of a permanent session in seconds.
    pub permanent_session_lifetime: u64,
    pub session_cookie_domain: Option<String>,
    pub session_cookie_path: Option<String>,
    pub session_cookie_httponly: bool,
    pub session_cookie_secure: bool,
    pub flash_cookie_name: String,
    pub preferred_url_scheme: String,
    pub logger_name: Option<String>,
    pub server_name: Option<String>,
    pub application_root: Option<String>,
    pub propagate_exceptions: Option<bool>,
    pub debug: bool,
    pub testing: bool,
    /// `Cache-Control` max-age of static files in seconds.
    pub static_cache_timeout: u64,
    pub static_folder: PathBuf,
    pub static_url_path: String,
    /// Number of leading path segments to strip before routing.
    pub shift_path_info: usize,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Settings {
    /// Deserialize an unrecognized key from `extra`.
    ///
    /// Returns `None` if the key is absent or has an incompatible type.
    ///
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.extra.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Returns true if unhandled errors should escape the dispatch cascade
    /// instead of being converted into a `500` response.
    ///
    /// Unless set explicitly, errors propagate in testing and debug mode.
    ///
    pub fn propagate_exceptions(&self) -> bool {
        self.propagate_exceptions
            .unwrap_or(self.testing || self.debug)
    }

    /// The path attribute of the session and flash cookies.
    ///
    pub fn cookie_path(&self) -> &str {
        self.session_cookie_path
            .as_deref()
            .or(self.application_root.as_deref())
            .unwrap_or("/")
    }

    /// Returns the secret key after checking that it is present and long
    /// enough to derive signing keys from.
    ///
    pub fn secret_key(&self) -> Result<&[u8], ConfigError> {
        let secret = self
            .secret_key
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::MissingKey("secret_key"))?;

        if secret.len() < MIN_SECRET_KEY_LEN {
            return Err(ConfigError::InvalidSecretKey(secret.len()));
        }

        Ok(secret.as_bytes())
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Settings")
            .field("session_cookie_name", &self.session_cookie_name)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("permanent_session_lifetime", &self.permanent_session_lifetime)
            .field("session_cookie_domain", &self.session_cookie_domain)
            .field("session_cookie_path", &self.session_cookie_path)
            .field("session_cookie_httponly", &self.session_cookie_httponly)
            .field("session_cookie_secure", &self.session_cookie_secure)
            .field("flash_cookie_name", &self.flash_cookie_name)
            .field("preferred_url_scheme", &self.preferred_url_scheme)
            .field("logger_name", &self.logger_name)
            .field("server_name", &self.server_name)
            .field("application_root", &self.application_root)
            .field("propagate_exceptions", &self.propagate_exceptions)
            .field("debug", &self.debug)
            .field("testing", &self.testing)
            .field("static_cache_timeout", &self.static_cache_timeout)
            .field("static_folder", &self.static_folder)
            .field("static_url_path", &self.static_url_path)
            .field("shift_path_info", &self.shift_path_info)
            .field("extra", &self.extra)
            .finish()
    }
}
