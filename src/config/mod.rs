//! Application configuration.
//!
//! Settings are layered, from lowest to highest priority:
//!
//! 1. Framework defaults (`session_cookie_name = "s"`, ...)
//! 2. Application defaults from [`Hooks::defaults`](crate::Hooks::defaults)
//! 3. Sources registered on the builder: TOML files, `FLYER__*` environment
//!    variables, or explicit key/value maps
//! 4. Explicit overrides set with [`Builder::set`](crate::Builder::set)
//!
//! The result is deserialized into [`Settings`]. A missing or short
//! `secret_key` is rejected when the application is built.
//!

mod settings;
mod sources;

pub use ::config::Value;
pub use settings::Settings;
pub(crate) use sources::Layers;
pub use sources::{ENV_PREFIX, ENV_SEPARATOR};

/// The minimum length of `secret_key` in bytes.
///
pub const MIN_SECRET_KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required configuration key: {0}")]
    MissingKey(&'static str),

    #[error("secret_key must be at least {MIN_SECRET_KEY_LEN} bytes, got {0}")]
    InvalidSecretKey(usize),

    #[error("endpoint {0:?} is registered more than once")]
    DuplicateEndpoint(String),

    #[error("endpoint {0:?} has no handler")]
    MissingHandler(String),

    #[error("route {path:?} accepts {method} more than once")]
    DuplicateRoute { path: String, method: String },

    #[error("invalid route {path:?}: {source}")]
    Route {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}
