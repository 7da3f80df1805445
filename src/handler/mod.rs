//! Request handlers.
//!
//! A [`Handler`] has one method per HTTP verb. The verb is read from the
//! `method` form or query value when present, so HTML forms can submit a
//! `PUT` or `DELETE`, and from the request method otherwise. Verbs a handler
//! does not implement answer with `405 Method Not Allowed`.
//!
//! Closures can be grouped into a handler with the verb functions of this
//! module:
//!
//! ```
//! use flyer::handler;
//! use flyer::{Context, Response, Result};
//!
//! fn show(cx: &mut Context) -> Result {
//!     Ok(Response::text(format!("item {}", cx.param("id").unwrap_or("?"))))
//! }
//!
//! fn update(cx: &mut Context) -> Result {
//!     cx.flash("saved");
//!     cx.redirect("/items")
//! }
//!
//! let _item = handler::get(show).put(update);
//! ```
//!

mod context;
mod flash;
mod static_files;
mod verbs;

pub use context::Context;
pub use flash::FlashMessage;
pub use static_files::StaticFiles;
pub use verbs::{Verbs, delete, get, head, options, patch, post, put};

pub(crate) use flash::Flash;

use http::StatusCode;
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::request::Request;

/// Handles the requests of an endpoint.
///
/// Every verb method has a default implementation that returns
/// `405 Method Not Allowed`, except [`Handler::head`], which calls
/// [`Handler::get`].
///
pub trait Handler<S = ()>: Send + Sync + 'static {
    /// Called before the verb method. Returning an error skips the verb
    /// method and hands the error to the application's error handlers.
    ///
    fn prepare(&self, cx: &mut Context<'_, S>) -> Result<()> {
        let _ = cx;
        Ok(())
    }

    fn get(&self, cx: &mut Context<'_, S>) -> Result {
        method_not_allowed(cx)
    }

    fn post(&self, cx: &mut Context<'_, S>) -> Result {
        method_not_allowed(cx)
    }

    fn put(&self, cx: &mut Context<'_, S>) -> Result {
        method_not_allowed(cx)
    }

    fn patch(&self, cx: &mut Context<'_, S>) -> Result {
        method_not_allowed(cx)
    }

    fn delete(&self, cx: &mut Context<'_, S>) -> Result {
        method_not_allowed(cx)
    }

    fn head(&self, cx: &mut Context<'_, S>) -> Result {
        self.get(cx)
    }

    fn options(&self, cx: &mut Context<'_, S>) -> Result {
        method_not_allowed(cx)
    }

    /// Adjusts the data of every template this handler renders, for
    /// example to add variables shared by all of its pages.
    ///
    fn prepare_render(&self, cx: &Context<'_, S>, data: Map<String, Value>) -> Map<String, Value> {
        let _ = cx;
        data
    }
}

/// Handles errors raised while processing a request.
///
/// Error handlers are registered per status code or per error type on the
/// [`Builder`](crate::Builder). The error being handled is available with
/// [`Context::error`].
///
pub trait ErrorHandler<S = ()>: Send + Sync + 'static {
    fn handle(&self, cx: &mut Context<'_, S>) -> Result;
}

/// A verb a [`Handler`] can respond to.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown verb: {0:?}")]
pub struct UnknownVerb(String);

impl<S, F> ErrorHandler<S> for F
where
    F: Fn(&mut Context<'_, S>) -> Result + Send + Sync + 'static,
{
    fn handle(&self, cx: &mut Context<'_, S>) -> Result {
        self(cx)
    }
}

impl Verb {
    /// Returns the verb a request asks for: the `method` form or query value
    /// if present, the request method otherwise.
    ///
    pub fn from_request(request: &Request) -> Result<Self, UnknownVerb> {
        request
            .value("method")
            .as_str()
            .unwrap_or_else(|| request.method().as_str())
            .parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
        }
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "patch" => Ok(Self::Patch),
            "delete" => Ok(Self::Delete),
            "head" => Ok(Self::Head),
            "options" => Ok(Self::Options),
            _ => Err(UnknownVerb(value.to_owned())),
        }
    }
}

/// Prepares `handler` and calls the method for the verb of the request.
///
pub(crate) fn dispatch<S: 'static>(handler: &dyn Handler<S>, cx: &mut Context<'_, S>) -> Result {
    handler.prepare(cx)?;

    let verb = match Verb::from_request(cx.request()) {
        Ok(verb) => verb,
        Err(error) => {
            tracing::debug!("{}", error);
            return Err(Error::status(StatusCode::METHOD_NOT_ALLOWED));
        }
    };

    tracing::debug!(%verb, "calling handler");

    match verb {
        Verb::Get => handler.get(cx),
        Verb::Post => handler.post(cx),
        Verb::Put => handler.put(cx),
        Verb::Patch => handler.patch(cx),
        Verb::Delete => handler.delete(cx),
        Verb::Head => handler.head(cx),
        Verb::Options => handler.options(cx),
    }
}

fn method_not_allowed<S>(_: &mut Context<'_, S>) -> Result {
    Err(Error::status(StatusCode::METHOD_NOT_ALLOWED))
}
