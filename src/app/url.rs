use http::Method;
use std::sync::Arc;

use crate::handler::Handler;

/// A route definition: a path pattern, the name of its endpoint, and the
/// handler of the endpoint.
///
/// Path patterns use `{name}` for a segment parameter and `{*name}` for a
/// parameter that matches the rest of the path.
///
/// ```
/// use flyer::{App, Url, handler};
/// use flyer::{Context, Response, Result};
///
/// fn index(_: &mut Context) -> Result {
///     Ok(Response::text("hello".to_owned()))
/// }
///
/// let mut app = App::builder(());
///
/// app.route(Url::new("/", "index", handler::get(index)));
/// app.route(Url::endpoint("/index.html", "index").methods([http::Method::GET]));
/// ```
///
pub struct Url<S> {
    pub(crate) path: String,
    pub(crate) endpoint: String,
    pub(crate) handler: Option<Arc<dyn Handler<S>>>,
    pub(crate) methods: Option<Vec<Method>>,
}

impl<S> Url<S> {
    pub fn new<H>(path: impl Into<String>, endpoint: impl Into<String>, handler: H) -> Self
    where
        H: Handler<S>,
    {
        Self {
            path: path.into(),
            endpoint: endpoint.into(),
            handler: Some(Arc::new(handler)),
            methods: None,
        }
    }

    /// An additional path for an endpoint whose handler is registered by
    /// another route.
    ///
    pub fn endpoint(path: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            endpoint: endpoint.into(),
            handler: None,
            methods: None,
        }
    }

    /// Restricts the route to `methods`. A route accepts every method by
    /// default. Accepting `GET` implies `HEAD`.
    ///
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn endpoint_name(&self) -> &str {
        &self.endpoint
    }
}
