use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, ToSocketAddrs};

use super::accept::accept;
use crate::app::{App, Hooks};
use crate::error::BoxError;

/// The default value of the maximum number of concurrent connections.
const DEFAULT_MAX_CONNECTIONS: usize = 256;

/// The default value of the maximum request body size in bytes.
const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024; // 1MB

/// The default value of the shutdown timeout in seconds.
const DEFAULT_SHUTDOWN_TIMEOUT: u64 = 30;

/// A development server for an [`App`].
///
/// ```no_run
/// use std::process::ExitCode;
/// use flyer::{App, BoxError, Server};
///
/// #[tokio::main]
/// async fn main() -> Result<ExitCode, BoxError> {
///     flyer::init_tracing();
///
///     let mut app = App::builder(());
///
///     app.config_env();
///     Server::new(app.build()?).listen(("127.0.0.1", 8080)).await
/// }
/// ```
///
pub struct Server<S> {
    app: Arc<App<S>>,
    config: ServerConfig,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ServerConfig {
    pub(super) max_connections: usize,
    pub(super) max_body_size: usize,
    pub(super) shutdown_timeout: Duration,
}

impl<S: Hooks> Server<S> {
    pub fn new(app: App<S>) -> Self {
        Self {
            app: Arc::new(app),
            config: ServerConfig {
                max_connections: DEFAULT_MAX_CONNECTIONS,
                max_body_size: DEFAULT_MAX_BODY_SIZE,
                shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT),
            },
        }
    }

    /// Sets the maximum number of concurrent connections that the server can
    /// accept. The default value is 256.
    ///
    pub fn max_connections(mut self, n: usize) -> Self {
        self.config.max_connections = n;
        self
    }

    /// Sets the maximum size of a request body in bytes. Larger bodies are
    /// answered with `413 Payload Too Large`. The default value is 1MB.
    ///
    pub fn max_body_size(mut self, limit: usize) -> Self {
        self.config.max_body_size = limit;
        self
    }

    /// Sets the amount of time the server waits for inflight connections
    /// to complete before shutting down. The default value is 30 seconds.
    ///
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Binds to `address` and serves connections until the process receives
    /// `ctrl-c`.
    ///
    pub async fn listen<A: ToSocketAddrs>(self, address: A) -> Result<ExitCode, BoxError> {
        let listener = TcpListener::bind(address).await?;

        if let Ok(address) = listener.local_addr() {
            tracing::info!("listening on http://{}", address);
        }

        Ok(accept(listener, self.app, self.config).await)
    }
}
