#![allow(dead_code)]

use flyer::{App, Builder, Hooks, Request, RequestBuilder, Response};

pub const SECRET: &str = "0123456789abcdef0123456789abcdef";

/// Returns a builder with a valid secret key.
///
pub fn builder<S: Hooks>(state: S) -> Builder<S> {
    let mut builder = App::builder(state);

    builder.set("secret_key", SECRET);
    builder
}

/// Keeps the cookies of previous responses and sends them with each
/// request, the way a browser would.
///
#[derive(Default)]
pub struct Browser {
    cookies: Vec<(String, String)>,
}

impl Browser {
    pub fn dispatch<S: Hooks>(&mut self, app: &App<S>, request: RequestBuilder) -> Response {
        let request = self
            .cookies
            .iter()
            .fold(request, |request, (name, value)| request.cookie(name.as_str(), value.as_str()));

        let response = app.dispatch(request).unwrap();

        for cookie in response.cookies().delta() {
            self.cookies.retain(|(name, _)| name != cookie.name());

            if cookie.max_age() != Some(time::Duration::ZERO) {
                self.cookies
                    .push((cookie.name().to_owned(), cookie.value().to_owned()));
            }
        }

        response
    }

    pub fn get<S: Hooks>(&mut self, app: &App<S>, uri: &str) -> Response {
        self.dispatch(app, Request::builder().uri(uri))
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }
}
