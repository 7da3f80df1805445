use bytes::Bytes;
use cookie::CookieJar;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, StatusCode, Version};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};

use super::ResponseBuilder;
use super::{APPLICATION_JSON, TEXT_HTML, TEXT_PLAIN};
use crate::error::Error;

/// A fully buffered response.
///
/// Cookies added to the jar are written as `Set-Cookie` headers when the
/// response is converted with [`Response::into_http`].
///
pub struct Response {
    cookies: Box<CookieJar>,
    response: http::Response<Bytes>,
}

impl Response {
    pub fn body(&self) -> &Bytes {
        self.response.body()
    }

    pub fn body_mut(&mut self) -> &mut Bytes {
        self.response.body_mut()
    }

    /// Returns the body as UTF-8, replacing invalid sequences.
    ///
    pub fn text_body(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.body())
    }

    /// Returns a reference to the response cookies.
    ///
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Returns a mutable reference to the response cookies.
    ///
    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.response.headers_mut()
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn status_mut(&mut self) -> &mut StatusCode {
        self.response.status_mut()
    }

    /// A shorthand method for `*self.status_mut() = status`.
    ///
    pub fn set_status(&mut self, status: StatusCode) {
        *self.response.status_mut() = status;
    }

    pub fn version(&self) -> Version {
        self.response.version()
    }
}

impl Response {
    #[inline]
    pub fn new(body: Bytes) -> Self {
        Self {
            cookies: Box::new(CookieJar::new()),
            response: http::Response::new(body),
        }
    }

    #[inline]
    pub fn build() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    pub fn html(body: String) -> Self {
        Self::with_content_type(body.into(), TEXT_HTML)
    }

    pub fn text(body: String) -> Self {
        Self::with_content_type(body.into(), TEXT_PLAIN)
    }

    pub fn json<T>(body: &T) -> Result<Self, Error>
    where
        T: Serialize,
    {
        let buf = serde_json::to_vec(body)?;
        Ok(Self::with_content_type(buf.into(), APPLICATION_JSON))
    }

    fn with_content_type(body: Bytes, content_type: HeaderValue) -> Self {
        let len = body.len();
        let mut response = Self::new(body);
        let headers = response.headers_mut();

        headers.insert(CONTENT_TYPE, content_type);
        headers.insert(CONTENT_LENGTH, len.into());

        response
    }
}

impl Response {
    /// Consumes the response and returns an `http::Response` with a
    /// `Set-Cookie` header for every cookie that changed.
    ///
    pub fn into_http(self) -> http::Response<Bytes> {
        let (mut parts, body) = self.response.into_parts();

        let set_cookie_headers = self.cookies.delta().filter_map(|cookie| {
            match cookie.encoded().to_string().parse() {
                Ok(header) => Some((SET_COOKIE, header)),
                Err(error) => {
                    tracing::warn!(cookie = cookie.name(), "dropping invalid cookie: {}", error);
                    None
                }
            }
        });

        parts.headers.extend(set_cookie_headers);
        http::Response::from_parts(parts, body)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(Bytes::new())
    }
}

impl Debug for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.response, f)
    }
}

impl From<http::Response<Bytes>> for Response {
    fn from(response: http::Response<Bytes>) -> Self {
        Self {
            response,
            cookies: Box::new(CookieJar::new()),
        }
    }
}
