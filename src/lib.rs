//! A micro web framework with signed cookie sessions, flash messages, and
//! form validation.
//!
//! Requests are dispatched synchronously. An [`App`] routes each request to
//! a [`Handler`], and every error raised on the way is translated into a
//! response by the application's error handlers. [`Server`] adapts the
//! synchronous core to HTTP/1.1 connections.
//!
//! ```
//! use flyer::{App, Context, Request, Response, Result, Url, handler};
//!
//! fn visit(cx: &mut Context) -> Result {
//!     let visits = cx.session().get_as::<u64>("visits").unwrap_or(0) + 1;
//!
//!     cx.session_mut().insert("visits", visits);
//!     Ok(Response::text(format!("visit #{}", visits)))
//! }
//!
//! let mut app = App::builder(());
//!
//! app.route(Url::new("/", "visit", handler::get(visit)))
//!     .set("secret_key", "a secret that is at least 32 bytes long");
//!
//! let app = app.build().unwrap();
//! let first = app.dispatch(Request::builder().uri("/")).unwrap();
//! let second = app
//!     .dispatch(Request::builder().uri("/").cookies_from(&first))
//!     .unwrap();
//!
//! assert_eq!(second.text_body(), "visit #2");
//! ```
//!

pub mod app;
pub mod config;
pub mod error;
pub mod form;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;
pub mod session;

mod render;
mod util;

pub use app::{App, Builder, Hooks, Url};
pub use error::{BoxError, Error, HttpError, Result};
pub use handler::{Context, ErrorHandler, FlashMessage, Handler};
pub use render::Render;
pub use request::{FormData, Request, RequestBuilder, Submitted};
pub use response::{Redirect, Response, ResponseBuilder};
pub use server::Server;
pub use session::{Session, SessionInterface};

pub use http;

/// Installs a `tracing` subscriber that prints to stderr and reads its
/// filter from `RUST_LOG`, defaulting to `info`.
///
/// Does nothing if a global subscriber is already installed.
///
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
