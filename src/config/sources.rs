use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, Source, Value};
use std::path::PathBuf;

use super::{ConfigError, Settings};

pub const ENV_PREFIX: &str = "FLYER";
pub const ENV_SEPARATOR: &str = "__";

/// The configuration layers of an application, in the order they are
/// applied by [`Layers::load`].
///
#[derive(Default)]
pub(crate) struct Layers {
    defaults: Vec<(String, Value)>,
    sources: Vec<Layer>,
    overrides: Vec<(String, Value)>,
}

enum Layer {
    File(PathBuf),
    Env(Environment),
    Values(Vec<(String, Value)>),
    Custom(Box<dyn Source + Send + Sync>),
}

impl Layers {
    pub(crate) fn set_default(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.defaults.push((key.into(), value.into()));
    }

    pub(crate) fn set_override(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.overrides.push((key.into(), value.into()));
    }

    pub(crate) fn add_file(&mut self, path: impl Into<PathBuf>) {
        self.sources.push(Layer::File(path.into()));
    }

    pub(crate) fn add_env(&mut self) {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        self.sources.push(Layer::Env(environment()));
    }

    pub(crate) fn add_values(&mut self, values: Vec<(String, Value)>) {
        self.sources.push(Layer::Values(values));
    }

    pub(crate) fn add_source(&mut self, source: Box<dyn Source + Send + Sync>) {
        self.sources.push(Layer::Custom(source));
    }

    pub(crate) fn load(self) -> Result<Settings, ConfigError> {
        let mut builder = framework_defaults()?;

        for (key, value) in self.defaults {
            builder = builder.set_default(key, value)?;
        }

        for layer in self.sources {
            builder = match layer {
                Layer::File(path) => {
                    tracing::debug!("loading configuration from {}", path.display());
                    builder.add_source(File::from(path))
                }
                Layer::Env(env) => builder.add_source(env),
                Layer::Values(values) => {
                    let mut table = config::Config::builder();

                    for (key, value) in values {
                        table = table.set_override(key, value)?;
                    }

                    builder.add_source(table.build()?)
                }
                Layer::Custom(source) => builder.add_source(vec![source]),
            };
        }

        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}

impl Settings {
    /// Load settings from the framework defaults, a `.env` file if one
    /// exists, and `FLYER__*` environment variables.
    ///
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut layers = Layers::default();

        layers.add_env();
        layers.load()
    }
}

fn environment() -> Environment {
    // FLYER__SECRET_KEY -> secret_key
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn framework_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = config::Config::builder()
        .set_default("session_cookie_name", "s")?
        .set_default("permanent_session_lifetime", 31 * 24 * 60 * 60)?
        .set_default("session_cookie_httponly", true)?
        .set_default("session_cookie_secure", false)?
        .set_default("flash_cookie_name", "m")?
        .set_default("preferred_url_scheme", "http")?
        .set_default("debug", false)?
        .set_default("testing", false)?
        .set_default("static_cache_timeout", 12 * 60 * 60)?
        .set_default("static_folder", "static")?
        .set_default("static_url_path", "/static")?
        .set_default("shift_path_info", 0)?;

    Ok(builder)
}
