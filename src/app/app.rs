use cookie::Key;
use http::{Method, StatusCode};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error_handlers::ErrorHandlers;
use super::routes::{RouteError, Routes};
use super::{Builder, FormDataRoutingRedirect, Hooks, UrlError};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::handler::{self, Context, ErrorHandler, Handler};
use crate::render::Render;
use crate::request::{FormData, Request, RequestBuilder};
use crate::response::Response;
use crate::session::SessionInterface;

/// Characters that are percent-encoded in a path segment.
///
const SEGMENT: &AsciiSet = &PATH.add(b'/');

/// Characters that are percent-encoded in a path.
///
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A configured application.
///
/// `App` is immutable once built. It is `Send + Sync` when its state is, so
/// a server can share it between threads behind an `Arc`.
///
pub struct App<S = ()> {
    pub(super) state: S,
    pub(super) settings: Settings,
    pub(super) key: Key,
    pub(super) routes: Routes<S>,
    pub(super) error_handlers: ErrorHandlers<S>,
    pub(super) sessions: Box<dyn SessionInterface>,
    pub(super) renderer: Option<Box<dyn Render>>,
    pub(super) got_first_request: AtomicBool,
}

impl<S: Hooks> App<S> {
    /// Returns a builder for an application with the provided `state`.
    ///
    pub fn builder(state: S) -> Builder<S> {
        Builder::new(state)
    }
}

impl<S> App<S> {
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn renderer(&self) -> Option<&dyn Render> {
        self.renderer.as_deref()
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn sessions(&self) -> &dyn SessionInterface {
        &*self.sessions
    }

    /// Builds the path of `endpoint` by substituting `params` into the path
    /// pattern of its first route. Parameters the pattern does not use are
    /// appended as the query string.
    ///
    pub fn url_for(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, UrlError> {
        let Some(mut rest) = self.routes.pattern(endpoint) else {
            return Err(UrlError::UnknownEndpoint(endpoint.to_owned()));
        };

        let mut url = String::with_capacity(rest.len());
        let mut used = Vec::new();

        while let Some(start) = rest.find('{') {
            url.push_str(&rest[..start].replace("}}", "}"));
            rest = &rest[start + 1..];

            if let Some(escaped) = rest.strip_prefix('{') {
                url.push('{');
                rest = escaped;
                continue;
            }

            let end = rest.find('}').unwrap_or(rest.len());
            let (name, set) = match rest[..end].strip_prefix('*') {
                Some(name) => (name, PATH),
                None => (&rest[..end], SEGMENT),
            };

            let Some((_, value)) = params.iter().find(|(param, _)| *param == name) else {
                return Err(UrlError::MissingParam {
                    endpoint: endpoint.to_owned(),
                    param: name.to_owned(),
                });
            };

            url.extend(utf8_percent_encode(value, set));
            used.push(name);
            rest = rest.get(end + 1..).unwrap_or_default();
        }

        url.push_str(&rest.replace("}}", "}"));

        let query: FormData = params
            .iter()
            .filter(|(param, _)| !used.contains(param))
            .map(|(param, value)| (*param, *value))
            .collect();

        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.encode());
        }

        Ok(url)
    }
}

impl<S: Hooks> App<S> {
    /// Processes `request` and returns the response.
    ///
    /// Errors that no error handler matched are logged and answered with
    /// `500 Internal Server Error`, unless exceptions propagate, in which
    /// case they are returned.
    ///
    pub fn call(&self, mut request: Request) -> Result {
        if self.settings.shift_path_info > 0 {
            request.shift_path(self.settings.shift_path_info);
        }

        match self.process_request(&mut request) {
            Ok(response) => Ok(response),
            Err(error) => self.handle_exception(&request, error),
        }
    }

    /// Routes `request`, calls its handler, and handles the errors raised
    /// on the way with the registered error handlers.
    ///
    /// Returns an error if no error handler matched an unclassified error.
    ///
    pub fn process_request(&self, request: &mut Request) -> Result {
        let routed = self.find_handler(request);
        let request = &*request;
        let mut context = None;

        let result = routed.and_then(|handler| {
            self.check_first_request(request)?;

            let cx = context.insert(Context::new(self, request, handler.as_ref()));
            self.run_handler(handler.as_ref(), cx)
        });

        let mut response = match result {
            Ok(response) => response,
            Err(error) => self.handle_user_exception(request, error)?,
        };

        if let Some(cx) = context {
            cx.finish(&mut response);
        }

        Ok(self.state.finalize_response(response))
    }

    /// Finishes `builder` into a request for this application.
    ///
    pub fn make_request(&self, builder: RequestBuilder) -> Result<Request> {
        builder.finish()
    }

    /// Runs a request through [`App::process_request`] only.
    ///
    pub fn run_request(&self, builder: RequestBuilder) -> Result {
        let mut request = self.make_request(builder)?;
        self.process_request(&mut request)
    }

    /// Runs a request through [`App::call`].
    ///
    pub fn dispatch(&self, builder: RequestBuilder) -> Result {
        self.call(self.make_request(builder)?)
    }
}

impl<S: Hooks> App<S> {
    fn find_handler(&self, request: &mut Request) -> Result<&Arc<dyn Handler<S>>> {
        let route = match self.routes.lookup(request.method(), request.path()) {
            Ok(route) => route,
            Err(error) => return Err(self.raise_routing_exception(request, error)),
        };

        let Some(handler) = self.routes.handler(route.endpoint()) else {
            return Err(Error::not_found());
        };

        request.set_route(route);
        Ok(handler)
    }

    fn raise_routing_exception(&self, request: &Request, error: RouteError) -> Error {
        let location = match error {
            RouteError::NotFound => return Error::not_found(),
            RouteError::MethodNotAllowed(allow) => return Error::method_not_allowed(&allow),
            RouteError::Redirect => match request.uri().query() {
                Some(query) => format!("{}{}/?{}", request.script_name(), request.path(), query),
                None => format!("{}{}/", request.script_name(), request.path()),
            },
        };

        let method = request.method();

        if self.settings.debug && ![Method::GET, Method::HEAD, Method::OPTIONS].contains(method) {
            return FormDataRoutingRedirect {
                method: method.clone(),
                url: request.url(),
                location,
            }
            .into();
        }

        Error::redirect(location)
    }

    fn check_first_request(&self, request: &Request) -> Result<()> {
        if !self.got_first_request.swap(true, Ordering::AcqRel) {
            tracing::debug!("running before_first_request");
            self.state.before_first_request(request)?;
        }

        Ok(())
    }

    fn run_handler(&self, handler: &dyn Handler<S>, cx: &mut Context<'_, S>) -> Result {
        let request = cx.request();
        let span = tracing::info_span!(
            "request",
            app = self.settings.logger_name.as_deref().unwrap_or("flyer"),
            id = %request.id(),
            method = %request.method(),
            url = %request.url(),
            remote_addr = ?request.remote_addr(),
            endpoint = request.endpoint().unwrap_or_default(),
        );

        let _entered = span.enter();
        handler::dispatch(handler, cx)
    }

    fn handle_user_exception(&self, request: &Request, error: Error) -> Result {
        if error.http().is_some() {
            return self.handle_http_exception(request, error);
        }

        match self.error_handlers.for_error(&error) {
            Some(handler) => Ok(self.call_error_handler(handler.as_ref(), request, &error)),
            None => Err(error),
        }
    }

    fn handle_http_exception(&self, request: &Request, error: Error) -> Result {
        let handler = error
            .status_code()
            .and_then(|status| self.error_handlers.for_status(status));

        match handler {
            Some(handler) => Ok(self.call_error_handler(handler.as_ref(), request, &error)),
            None => Ok(error.into_response()),
        }
    }

    fn handle_exception(&self, request: &Request, error: Error) -> Result {
        if self.settings.propagate_exceptions() {
            return Err(error);
        }

        tracing::error!(url = %request.url(), "unhandled error: {}", error);

        match self.error_handlers.for_status(StatusCode::INTERNAL_SERVER_ERROR) {
            Some(handler) => Ok(self.call_error_handler(handler.as_ref(), request, &error)),
            None => Ok(Error::internal_server_error().into_response()),
        }
    }

    fn call_error_handler(
        &self,
        handler: &dyn ErrorHandler<S>,
        request: &Request,
        error: &Error,
    ) -> Response {
        let mut cx = Context::for_error(self, request, error);

        match handler.handle(&mut cx) {
            Ok(response) => response,
            Err(failure) => {
                tracing::error!(original = %error, "error handler failed: {}", failure);
                Error::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The error handler failed while handling another error.",
                )
                .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::App;
    use crate::app::{Url, UrlError};
    use crate::handler::{self, Context};
    use crate::{Response, Result};

    fn ok(_: &mut Context) -> Result {
        Ok(Response::text("ok".to_owned()))
    }

    fn app() -> App {
        let mut builder = App::builder(());

        builder
            .route(Url::new("/", "index", handler::get(ok)))
            .route(Url::new("/users/{name}", "user", handler::get(ok)))
            .route(Url::new("/files/{*path}", "file", handler::get(ok)))
            .set("secret_key", "0123456789abcdef0123456789abcdef");

        builder.build().unwrap()
    }

    #[test]
    fn builds_urls_for_endpoints() {
        let app = app();

        assert_eq!(app.url_for("index", &[]).unwrap(), "/");
        assert_eq!(
            app.url_for("user", &[("name", "ada lovelace")]).unwrap(),
            "/users/ada%20lovelace"
        );
        assert_eq!(
            app.url_for("file", &[("path", "css/site.css"), ("v", "2")]).unwrap(),
            "/files/css/site.css?v=2"
        );
        assert_eq!(
            app.url_for("static", &[("filename", "app.js")]).unwrap(),
            "/static/app.js"
        );
    }

    #[test]
    fn reports_url_errors() {
        let app = app();

        assert!(matches!(
            app.url_for("missing", &[]),
            Err(UrlError::UnknownEndpoint(_))
        ));
        assert!(matches!(
            app.url_for("user", &[]),
            Err(UrlError::MissingParam { param, .. }) if param == "name"
        ));
    }
}
