use http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Flash, FlashMessage, Handler};
use crate::app::App;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::{Redirect, Response};
use crate::session::Session;

/// The per-request state of a handler.
///
/// A context is created once routing succeeded. It opens the session and
/// reads the flash cookie of the request. When the handler returns, both are
/// written to the response.
///
pub struct Context<'a, S = ()> {
    app: &'a App<S>,
    request: &'a Request,
    session: Session,
    flash: Flash,
    handler: Option<&'a dyn Handler<S>>,
    error: Option<&'a Error>,
}

impl<'a, S> Context<'a, S> {
    pub(crate) fn new(app: &'a App<S>, request: &'a Request, handler: &'a dyn Handler<S>) -> Self {
        let settings = app.settings();
        let sessions = app.sessions();

        let session = match sessions.open_session(settings, app.key(), request) {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!("unable to open session: {}", error);
                sessions.make_null_session()
            }
        };

        Self {
            app,
            request,
            session,
            flash: Flash::open(settings, app.key(), request),
            handler: Some(handler),
            error: None,
        }
    }

    /// A context for an error handler. It starts with a null session and
    /// no flash messages, and neither is saved.
    ///
    pub(crate) fn for_error(app: &'a App<S>, request: &'a Request, error: &'a Error) -> Self {
        Self {
            app,
            request,
            session: app.sessions().make_null_session(),
            flash: Flash::default(),
            handler: None,
            error: Some(error),
        }
    }

    /// Writes the session and the flash messages to `response`.
    ///
    pub(crate) fn finish(self, response: &mut Response) {
        let settings = self.app.settings();
        let key = self.app.key();
        let sessions = self.app.sessions();

        if !sessions.is_null_session(&self.session) {
            if let Err(error) = sessions.save_session(settings, key, &self.session, response) {
                tracing::error!("unable to save session: {}", error);
            }
        }

        if let Err(error) = self.flash.save(settings, key, response) {
            tracing::error!("unable to save flash messages: {}", error);
        }
    }
}

impl<'a, S> Context<'a, S> {
    pub fn app(&self) -> &'a App<S> {
        self.app
    }

    /// Returns a reference to the application state.
    ///
    pub fn state(&self) -> &'a S {
        self.app.state()
    }

    pub fn settings(&self) -> &'a Settings {
        self.app.settings()
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// Returns the percent-decoded path parameter `name` of the matched
    /// route.
    ///
    pub fn param(&self, name: &str) -> Option<&'a str> {
        self.request.param(name)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The error being handled when the context belongs to an error
    /// handler.
    ///
    pub fn error(&self) -> Option<&'a Error> {
        self.error
    }

    /// Queues a flash message with the category `"message"`.
    ///
    pub fn flash(&mut self, message: impl Into<String>) {
        self.flash.push(FlashMessage::new(message));
    }

    pub fn flash_with(&mut self, message: FlashMessage) {
        self.flash.push(message);
    }

    /// Returns the flash messages from the previous request followed by the
    /// ones queued in this request. Messages returned here are not shown
    /// again.
    ///
    pub fn flash_messages(&mut self) -> Vec<FlashMessage> {
        self.flash.take()
    }

    /// Builds the data passed to a template.
    ///
    /// The returned map holds every entry of `extra` plus `values`, `errors`
    /// and `flash_messages`, passed through [`Handler::prepare_render`].
    ///
    pub fn render_data<V, E>(
        &mut self,
        values: &V,
        errors: &E,
        extra: Map<String, Value>,
    ) -> Result<Map<String, Value>>
    where
        S: 'static,
        V: Serialize + ?Sized,
        E: Serialize + ?Sized,
    {
        let mut data = extra;

        data.insert("values".to_owned(), serde_json::to_value(values)?);
        data.insert("errors".to_owned(), serde_json::to_value(errors)?);
        data.insert(
            "flash_messages".to_owned(),
            serde_json::to_value(self.flash.take())?,
        );

        match self.handler {
            Some(handler) => Ok(handler.prepare_render(self, data)),
            None => Ok(data),
        }
    }

    /// Renders `template` with the registered [`Render`](crate::Render)
    /// implementation and returns it as an HTML response.
    ///
    pub fn render(&mut self, template: &str, extra: Map<String, Value>) -> Result
    where
        S: 'static,
    {
        let data = self.render_data(&Map::new(), &Map::new(), extra)?;
        self.render_with(template, data)
    }

    /// Renders `template` with data built by [`Context::render_data`].
    ///
    pub fn render_with(&self, template: &str, data: Map<String, Value>) -> Result {
        let Some(renderer) = self.app.renderer() else {
            tracing::error!(template, "no template renderer is registered");
            return Err(Error::status(StatusCode::INTERNAL_SERVER_ERROR));
        };

        Ok(Response::html(renderer.render(template, &Value::Object(data))?))
    }

    /// Redirects the client to `location` with `302 Found`.
    ///
    pub fn redirect(&self, location: &str) -> Result {
        Redirect::found(location)
    }

    /// Builds the URL of `endpoint`, including the script name of the
    /// request. Parameters that are not part of the route are appended as
    /// the query string.
    ///
    pub fn url_for(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
        let path = self.app.url_for(endpoint, params)?;
        Ok(format!("{}{}", self.request.script_name(), path))
    }
}
