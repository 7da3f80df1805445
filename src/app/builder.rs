use config::{Source, Value};
use cookie::Key;
use http::StatusCode;
use std::error::Error as StdError;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use super::error_handlers::ErrorHandlers;
use super::routes::Routes;
use super::{App, Hooks, Url};
use crate::config::{ConfigError, Layers};
use crate::error::Error;
use crate::handler::{ErrorHandler, StaticFiles};
use crate::render::Render;
use crate::session::{SecureCookieSessionInterface, SessionInterface};

/// Configures and builds an [`App`].
///
/// ```
/// use flyer::{App, Url, handler};
/// use flyer::{Context, Response, Result};
///
/// fn hello(cx: &mut Context) -> Result {
///     let name = cx.param("name").unwrap_or("world");
///     Ok(Response::text(format!("Hello, {}!", name)))
/// }
///
/// # fn main() -> std::result::Result<(), flyer::config::ConfigError> {
/// let mut app = App::builder(());
///
/// app.route(Url::new("/hello/{name}", "hello", handler::get(hello)))
///     .set("secret_key", "a secret that is at least 32 bytes long");
///
/// let app = app.build()?;
/// let response = app.dispatch(flyer::Request::builder().uri("/hello/ada")).unwrap();
///
/// assert_eq!(response.text_body(), "Hello, ada!");
/// # Ok(())
/// # }
/// ```
///
pub struct Builder<S> {
    state: S,
    urls: Vec<Url<S>>,
    layers: Layers,
    error_handlers: ErrorHandlers<S>,
    sessions: Option<Box<dyn SessionInterface>>,
    renderer: Option<Box<dyn Render>>,
}

impl<S: Hooks> Builder<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            urls: Vec::new(),
            layers: Layers::default(),
            error_handlers: ErrorHandlers::new(),
            sessions: None,
            renderer: None,
        }
    }

    pub fn route(&mut self, url: Url<S>) -> &mut Self {
        self.urls.push(url);
        self
    }

    /// Loads settings from a TOML file.
    ///
    pub fn config_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.layers.add_file(path);
        self
    }

    /// Loads settings from `FLYER__*` environment variables and a `.env`
    /// file if one exists.
    ///
    pub fn config_env(&mut self) -> &mut Self {
        self.layers.add_env();
        self
    }

    /// Loads settings from explicit key/value pairs.
    ///
    pub fn config<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        self.layers.add_values(values);
        self
    }

    /// Loads settings from any [`config::Source`].
    ///
    pub fn config_source<T>(&mut self, source: T) -> &mut Self
    where
        T: Source + Send + Sync + 'static,
    {
        self.layers.add_source(Box::new(source));
        self
    }

    /// Overrides a setting. Overrides take precedence over every source.
    ///
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.layers.set_override(key, value);
        self
    }

    /// Registers `handler` for HTTP errors with `status`. Registering a
    /// status again replaces the earlier handler.
    ///
    pub fn error_handler<H>(&mut self, status: StatusCode, handler: H) -> &mut Self
    where
        H: ErrorHandler<S>,
    {
        self.error_handlers.insert_status(status, Arc::new(handler));
        self
    }

    /// Registers `handler` for unclassified errors whose source is an `E`.
    ///
    pub fn rescue<E, H>(&mut self, handler: H) -> &mut Self
    where
        E: StdError + 'static,
        H: ErrorHandler<S>,
    {
        self.rescue_if(|error| error.is::<E>(), handler)
    }

    /// Registers `handler` for unclassified errors that match `predicate`.
    ///
    /// Predicates are tested in registration order and the first match
    /// wins.
    ///
    pub fn rescue_if<F, H>(&mut self, predicate: F, handler: H) -> &mut Self
    where
        F: Fn(&Error) -> bool + Send + Sync + 'static,
        H: ErrorHandler<S>,
    {
        self.error_handlers
            .push_predicate(Box::new(predicate), Arc::new(handler));
        self
    }

    /// Replaces the signed cookie session storage.
    ///
    pub fn session_interface<T: SessionInterface>(&mut self, sessions: T) -> &mut Self {
        self.sessions = Some(Box::new(sessions));
        self
    }

    pub fn renderer<R: Render>(&mut self, renderer: R) -> &mut Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Loads the configuration, compiles the route table, and returns the
    /// application.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be loaded, `secret_key` is missing
    /// or shorter than 32 bytes, an endpoint is registered twice, or a path
    /// pattern is invalid.
    ///
    pub fn build(mut self) -> Result<App<S>, ConfigError> {
        for (key, value) in S::defaults() {
            self.layers.set_default(key, value);
        }

        S::finalize_setup(&mut self);

        let settings = mem::take(&mut self.layers).load()?;
        let key = Key::derive_from(settings.secret_key()?);

        let static_url_path = settings.static_url_path.trim_matches('/');
        let has_static = self.urls.iter().any(|url| url.endpoint == "static");

        if !static_url_path.is_empty() && !has_static {
            self.urls.push(Url::new(
                format!("/{}/{{*filename}}", static_url_path),
                "static",
                StaticFiles,
            ));
        }

        let routes = Routes::compile(self.urls)?;

        tracing::debug!(?settings, "application configured");

        Ok(App {
            state: self.state,
            settings,
            key,
            routes,
            error_handlers: self.error_handlers,
            sessions: match self.sessions {
                Some(sessions) => sessions,
                None => Box::new(SecureCookieSessionInterface),
            },
            renderer: self.renderer,
            got_first_request: AtomicBool::new(false),
        })
    }
}
