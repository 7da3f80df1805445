//! The application: configuration, the route table, and the dispatch of
//! requests through handlers and error handlers.
//!

mod app;
mod builder;
mod error_handlers;
mod hooks;
mod routes;
mod url;

pub use app::App;
pub use builder::Builder;
pub use hooks::Hooks;
pub use url::Url;

use http::Method;

/// A client sent a form to a URL that only matches with a trailing slash.
///
/// Raised instead of the redirect in debug mode for requests other than
/// `GET`, `HEAD`, and `OPTIONS`, since clients do not resend form data when
/// they follow a redirect.
///
#[derive(Debug, thiserror::Error)]
#[error(
    "a {method} request was sent to {url:?} but the routing system redirected it to \
     {location:?}. The route is defined with a trailing slash. Send the {method} \
     request to {location:?} directly, since clients cannot follow redirects with \
     form data reliably."
)]
pub struct FormDataRoutingRedirect {
    pub method: Method,
    pub url: String,
    pub location: String,
}

/// An error from [`App::url_for`].
///
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("no route is registered for endpoint {0:?}")]
    UnknownEndpoint(String),

    #[error("building a URL for {endpoint:?} requires the parameter {param:?}")]
    MissingParam { endpoint: String, param: String },
}
