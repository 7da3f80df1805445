//! Error handling.
//!
//! Every failure that can occur while dispatching a request is represented by
//! [`Error`]. An error is either an [`HttpError`], which knows the status code
//! it maps to and can render itself as a response, or an unclassified error
//! that wraps an arbitrary source and is escalated through the application's
//! error handlers.
//!

mod http_error;
mod raise;

use http::{Method, StatusCode};
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};

#[doc(hidden)]
pub use http::StatusCode as Status; // Required for the raise macro.

pub use http_error::HttpError;

use crate::response::Response;

/// A type alias for `Box<dyn Error + Send + Sync>`.
///
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The result of a handler, hook, or error handler.
///
pub type Result<T = Response, E = Error> = std::result::Result<T, E>;

/// An error that occurred while processing a request.
///
pub struct Error {
    repr: Repr,
}

enum Repr {
    Http(HttpError),
    Other(BoxError),
}

impl Error {
    /// Returns a new HTTP error with the provided status and message.
    ///
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HttpError::new(status).with_message(message).into()
    }

    /// Returns a new HTTP error that uses the canonical reason of `status`
    /// as its message.
    ///
    pub fn status(status: StatusCode) -> Self {
        HttpError::new(status).into()
    }

    /// Returns a new unclassified error from the provided source.
    ///
    /// If `source` is an [`HttpError`], the returned error is an HTTP error.
    ///
    pub fn from_source(source: BoxError) -> Self {
        match source.downcast::<HttpError>() {
            Ok(http) => Self {
                repr: Repr::Http(*http),
            },
            Err(other) => Self {
                repr: Repr::Other(other),
            },
        }
    }

    /// Returns a new HTTP error with the provided status that keeps `source`
    /// for logging.
    ///
    pub fn with_status(status: StatusCode, source: BoxError) -> Self {
        HttpError::new(status).with_source(source).into()
    }

    pub fn not_found() -> Self {
        Self::status(StatusCode::NOT_FOUND)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Returns a `405 Method Not Allowed` error with an `Allow` header that
    /// lists the provided methods.
    ///
    pub fn method_not_allowed(allow: &[Method]) -> Self {
        HttpError::new(StatusCode::METHOD_NOT_ALLOWED)
            .with_allow(allow)
            .into()
    }

    /// Returns a `308 Permanent Redirect` error that points the client to
    /// `location`.
    ///
    pub fn redirect(location: impl Into<String>) -> Self {
        HttpError::new(StatusCode::PERMANENT_REDIRECT)
            .with_location(location)
            .into()
    }

    pub fn internal_server_error() -> Self {
        Self::status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl Error {
    /// Returns a reference to the HTTP error if this is an HTTP-level error.
    ///
    pub fn http(&self) -> Option<&HttpError> {
        match &self.repr {
            Repr::Http(http) => Some(http),
            Repr::Other(_) => None,
        }
    }

    /// Returns the status code of an HTTP-level error.
    ///
    pub fn status_code(&self) -> Option<StatusCode> {
        self.http().map(HttpError::status)
    }

    /// Returns true if the error is an HTTP redirect raised during routing.
    ///
    pub fn is_redirect(&self) -> bool {
        self.status_code()
            .is_some_and(|status| status.is_redirection())
    }

    /// Returns true if the source of an unclassified error is of type `T`.
    ///
    pub fn is<T>(&self) -> bool
    where
        T: StdError + 'static,
    {
        self.downcast_ref::<T>().is_some()
    }

    /// Attempts to downcast the source of an unclassified error to `T`.
    ///
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: StdError + 'static,
    {
        match &self.repr {
            Repr::Other(source) => source.downcast_ref(),
            Repr::Http(_) => None,
        }
    }

    /// Returns a reference to the error source.
    ///
    pub fn source(&self) -> &(dyn StdError + 'static) {
        match &self.repr {
            Repr::Http(http) => http,
            Repr::Other(source) => &**source,
        }
    }

    /// Converts the error into a response.
    ///
    /// HTTP errors render themselves. Unclassified errors become a generic
    /// `500 Internal Server Error` so their details never reach the client.
    ///
    pub fn into_response(self) -> Response {
        match self.repr {
            Repr::Http(http) => http.into(),
            Repr::Other(_) => HttpError::new(StatusCode::INTERNAL_SERVER_ERROR).into(),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.repr {
            Repr::Http(http) => Debug::fmt(http, f),
            Repr::Other(source) => Debug::fmt(source, f),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.repr {
            Repr::Http(http) => Display::fmt(http, f),
            Repr::Other(source) => Display::fmt(source, f),
        }
    }
}

impl<E> From<E> for Error
where
    E: StdError + Send + Sync + 'static,
{
    fn from(source: E) -> Self {
        Self::from_source(Box::new(source))
    }
}
