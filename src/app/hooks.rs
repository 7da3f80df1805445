use config::Value;

use super::Builder;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;

/// Customization points of an application, implemented by its state type.
///
/// Every method has a default that does nothing, so an application that
/// needs no hooks can use `()` or an empty impl:
///
/// ```
/// use flyer::{Hooks, Request, Result};
///
/// struct Blog;
///
/// impl Hooks for Blog {
///     fn defaults() -> Vec<(&'static str, flyer::config::Value)> {
///         vec![("session_cookie_name", "blog".into())]
///     }
///
///     fn before_first_request(&self, request: &Request) -> Result<()> {
///         tracing::info!("first request: {}", request.url());
///         Ok(())
///     }
/// }
/// ```
///
pub trait Hooks: Sized + Send + Sync + 'static {
    /// Settings applied on top of the framework defaults and below every
    /// configuration source.
    ///
    fn defaults() -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    /// Called by [`Builder::build`] before the configuration is loaded.
    /// Routes, error handlers, and settings added here are part of the
    /// application.
    ///
    fn finalize_setup(builder: &mut Builder<Self>) {
        let _ = builder;
    }

    /// Called once, before the handler of the first request that was
    /// routed successfully. An error is handled like an error of the
    /// handler and the hook is not called again.
    ///
    fn before_first_request(&self, request: &Request) -> Result<()> {
        let _ = request;
        Ok(())
    }

    /// A final pass over every response produced by the application.
    ///
    fn finalize_response(&self, response: Response) -> Response {
        response
    }
}

impl Hooks for () {}
