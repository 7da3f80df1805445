use bytes::Bytes;
use cookie::Cookie;
use http::header::{CONTENT_TYPE, COOKIE};
use http::request::Builder;
use http::{HeaderName, HeaderValue, Method};
use std::net::SocketAddr;
use time::Duration;

use super::{FormData, Request};
use crate::error::Error;
use crate::response::Response;

/// Builds a [`Request`] without a server. Used to drive an application in
/// tests.
///
/// ```
/// use flyer::Request;
///
/// let request = Request::builder()
///     .method(http::Method::POST)
///     .uri("/login")
///     .form([("user", "ada")])
///     .cookie("s", "opaque")
///     .finish()
///     .unwrap();
///
/// assert_eq!(request.value("user").as_str(), Some("ada"));
/// ```
///
pub struct RequestBuilder {
    inner: Builder,
    body: Bytes,
    cookies: Vec<(String, String)>,
    remote_addr: Option<SocketAddr>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            inner: Builder::new(),
            body: Bytes::new(),
            cookies: Vec::new(),
            remote_addr: None,
        }
    }

    pub fn method(self, method: Method) -> Self {
        Self {
            inner: self.inner.method(method),
            ..self
        }
    }

    pub fn uri(self, uri: &str) -> Self {
        Self {
            inner: self.inner.uri(uri),
            ..self
        }
    }

    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        Self {
            inner: self.inner.header(key, value),
            ..self
        }
    }

    pub fn body(self, body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..self
        }
    }

    /// Sets a url-encoded form body and the matching content type.
    ///
    pub fn form<I, K, V>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let encoded = fields.into_iter().collect::<FormData>().encode();

        Self {
            inner: self
                .inner
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded"),
            body: encoded.into(),
            ..self
        }
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();

        self.cookies.retain(|(existing, _)| *existing != name);
        self.cookies.push((name, value.into()));
        self
    }

    /// Sends back the cookies that `response` set, the way a browser would.
    /// Removal cookies delete the matching cookie instead.
    ///
    pub fn cookies_from(mut self, response: &Response) -> Self {
        for cookie in response.cookies().delta() {
            let name = cookie.name().to_owned();

            if cookie.max_age() == Some(Duration::ZERO) {
                self.cookies.retain(|(existing, _)| *existing != name);
            } else {
                self = self.cookie(name, cookie.value());
            }
        }

        self
    }

    pub fn remote_addr(self, addr: SocketAddr) -> Self {
        Self {
            remote_addr: Some(addr),
            ..self
        }
    }

    pub fn finish(self) -> Result<Request, Error> {
        let mut inner = self.inner;

        if !self.cookies.is_empty() {
            let header = self
                .cookies
                .iter()
                .map(|(name, value)| {
                    let cookie = Cookie::new(name.as_str(), value.as_str());
                    cookie.encoded().stripped().to_string()
                })
                .collect::<Vec<_>>()
                .join("; ");

            inner = inner.header(COOKIE, header);
        }

        let request = inner.body(self.body)?;
        Ok(Request::from_http(request, self.remote_addr))
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
