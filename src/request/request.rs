use bytes::Bytes;
use cookie::{Cookie, CookieJar};
use delegate::delegate;
use http::header::{CONTENT_TYPE, COOKIE};
use http::request::Parts;
use http::{HeaderMap, Method, Uri, Version};
use percent_encoding::percent_decode_str;
use smallvec::SmallVec;
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

use super::builder::RequestBuilder;
use super::form_data::{FormData, Submitted};

/// The endpoint and path parameters of the route that matched a request.
///
#[derive(Clone, Debug)]
pub struct MatchedRoute {
    endpoint: Arc<str>,
    params: SmallVec<[(String, String); 4]>,
}

/// Everything about a request except its body.
///
pub struct Envelope {
    parts: Parts,
    cookies: CookieJar,
    query: FormData,
    form: FormData,
    script_name: String,
    path: String,
    route: Option<MatchedRoute>,
    remote_addr: Option<SocketAddr>,
    id: Uuid,
}

/// A fully buffered request.
///
pub struct Request {
    envelope: Envelope,
    body: Bytes,
}

impl MatchedRoute {
    pub(crate) fn new<'a, I>(endpoint: Arc<str>, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let params = params
            .into_iter()
            .map(|(name, value)| {
                let value = percent_decode_str(value).decode_utf8_lossy();
                (name.to_owned(), value.into_owned())
            })
            .collect();

        Self { endpoint, params }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the percent-decoded value of the path parameter `name`.
    ///
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl Envelope {
    /// Returns a reference to the request's method.
    ///
    #[inline]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Returns a reference to the request's URI.
    ///
    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the HTTP version that was used to make the request.
    ///
    #[inline]
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Returns a reference to the request's headers.
    ///
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Returns the value of the header `name` if it is visible ASCII.
    ///
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)?.to_str().ok()
    }

    /// Returns reference to the cookies associated with the request.
    ///
    #[inline]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    #[inline]
    pub fn query(&self) -> &FormData {
        &self.query
    }

    /// Returns the url-encoded form body. Empty for other content types.
    ///
    #[inline]
    pub fn form(&self) -> &FormData {
        &self.form
    }

    /// Returns the first value of `name` in the form body, falling back to
    /// the query string.
    ///
    pub fn value(&self, name: &str) -> Submitted<'_> {
        match self.form.get(name) {
            Submitted::Absent => self.query.get(name),
            present => present,
        }
    }

    /// Returns every value of `name` in the form body, or in the query
    /// string if the form body has none.
    ///
    pub fn values<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        if self.form.contains(name) {
            self.form.get_all(name).collect()
        } else {
            self.query.get_all(name).collect()
        }
    }

    /// The path used for routing, without the prefix removed by
    /// `shift_path_info`.
    ///
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path prefix that was shifted off before routing.
    ///
    #[inline]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Returns the full path of the request including the shifted prefix and
    /// query string.
    ///
    pub fn url(&self) -> String {
        match self.uri().query() {
            Some(query) => format!("{}{}?{}", self.script_name, self.path, query),
            None => format!("{}{}", self.script_name, self.path),
        }
    }

    #[inline]
    pub fn route(&self) -> Option<&MatchedRoute> {
        self.route.as_ref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.route().map(MatchedRoute::endpoint)
    }

    /// Returns the percent-decoded path parameter `name` of the matched
    /// route.
    ///
    pub fn param(&self, name: &str) -> Option<&str> {
        self.route()?.param(name)
    }

    #[inline]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// A unique id assigned to the request when it was received.
    ///
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Envelope {
    fn new(parts: Parts, body: &Bytes, remote_addr: Option<SocketAddr>) -> Self {
        let cookies = parse_cookies(&parts.headers);
        let query = parts.uri.query().map(FormData::parse).unwrap_or_default();
        let form = if is_form_urlencoded(&parts.headers) {
            FormData::parse(&String::from_utf8_lossy(body))
        } else {
            FormData::new()
        };

        Self {
            path: parts.uri.path().to_owned(),
            script_name: String::new(),
            route: None,
            id: Uuid::new_v4(),
            parts,
            cookies,
            query,
            form,
            remote_addr,
        }
    }
}

impl Debug for Envelope {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct CookieJar;

        f.debug_struct("Envelope")
            .field("id", &self.id)
            .field("method", self.method())
            .field("uri", self.uri())
            .field("route", &self.route)
            .field("version", &self.version())
            .field("headers", self.headers())
            .field("cookies", &CookieJar)
            .field("remote_addr", &self.remote_addr)
            .finish()
    }
}

impl Request {
    /// Returns a builder for requests that are dispatched without a server.
    ///
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Builds a request from a buffered `http::Request`. Cookies, the query
    /// string, and url-encoded form bodies are parsed eagerly.
    ///
    pub fn from_http(request: http::Request<Bytes>, remote_addr: Option<SocketAddr>) -> Self {
        let (parts, body) = request.into_parts();

        Self {
            envelope: Envelope::new(parts, &body, remote_addr),
            body,
        }
    }

    #[inline]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    delegate! {
        to self.envelope() {
            /// Returns a reference to the request's method.
            pub fn method(&self) -> &Method;

            /// Returns a reference to the request's URI.
            pub fn uri(&self) -> &Uri;

            /// Returns the HTTP version that was used to make the request.
            pub fn version(&self) -> Version;

            /// Returns a reference to the request's headers.
            pub fn headers(&self) -> &HeaderMap;

            pub fn header(&self, name: &str) -> Option<&str>;

            /// Returns reference to the cookies associated with the request.
            pub fn cookies(&self) -> &CookieJar;

            pub fn query(&self) -> &FormData;

            pub fn form(&self) -> &FormData;

            pub fn value(&self, name: &str) -> Submitted<'_>;

            pub fn values<'a>(&'a self, name: &'a str) -> Vec<&'a str>;

            pub fn path(&self) -> &str;

            pub fn script_name(&self) -> &str;

            pub fn url(&self) -> String;

            pub fn route(&self) -> Option<&MatchedRoute>;

            pub fn endpoint(&self) -> Option<&str>;

            pub fn param(&self, name: &str) -> Option<&str>;

            pub fn remote_addr(&self) -> Option<SocketAddr>;

            pub fn id(&self) -> Uuid;
        }
    }

    pub(crate) fn set_route(&mut self, route: MatchedRoute) {
        self.envelope.route = Some(route);
    }

    /// Moves the first `count` segments of the path to the script name.
    ///
    pub(crate) fn shift_path(&mut self, count: usize) {
        let envelope = &mut self.envelope;

        for _ in 0..count {
            let rest = envelope.path.trim_start_matches('/');

            if rest.is_empty() {
                break;
            }

            let (segment, tail) = rest.split_at(rest.find('/').unwrap_or(rest.len()));

            envelope.script_name.push('/');
            envelope.script_name.push_str(segment);
            envelope.path = if tail.is_empty() {
                "/".to_owned()
            } else {
                tail.to_owned()
            };
        }
    }
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Request")
            .field("envelope", self.envelope())
            .field("body", &self.body.len())
            .finish()
    }
}

fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn parse_cookies(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();

    for header in headers.get_all(COOKIE) {
        let input = match header.to_str() {
            Ok(input) => input.to_owned(),
            Err(error) => {
                tracing::debug!("ignoring cookie header that is not visible ascii: {}", error);
                continue;
            }
        };

        for result in Cookie::split_parse_encoded(input) {
            match result {
                Ok(cookie) => jar.add_original(cookie),
                Err(error) => tracing::debug!("ignoring malformed cookie: {}", error),
            }
        }
    }

    jar
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::header::{CONTENT_TYPE, COOKIE};

    use super::{MatchedRoute, Request};
    use crate::request::Submitted;

    fn request(uri: &str) -> http::request::Builder {
        http::Request::builder().uri(uri)
    }

    #[test]
    fn parses_query_form_and_cookies() {
        let http = request("/items?page=2&name=query")
            .method("POST")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(COOKIE, "a=1; b=hello%20world")
            .body(Bytes::from_static(b"name=form&tag=x&tag=y"))
            .unwrap();

        let request = Request::from_http(http, None);

        assert_eq!(request.value("name"), Submitted::Present("form"));
        assert_eq!(request.value("page"), Submitted::Present("2"));
        assert_eq!(request.values("tag"), ["x", "y"]);
        assert_eq!(request.cookies().get("b").unwrap().value(), "hello world");
        assert_eq!(request.url(), "/items?page=2&name=query");
    }

    #[test]
    fn ignores_bodies_that_are_not_forms() {
        let http = request("/items")
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(b"name=form"))
            .unwrap();

        let request = Request::from_http(http, None);

        assert!(request.form().is_empty());
        assert_eq!(request.body().len(), 9);
    }

    #[test]
    fn shifts_path_segments() {
        let http = request("/prefix/app/hello?x=1").body(Bytes::new()).unwrap();
        let mut request = Request::from_http(http, None);

        request.shift_path(1);
        assert_eq!(request.script_name(), "/prefix");
        assert_eq!(request.path(), "/app/hello");

        request.shift_path(5);
        assert_eq!(request.script_name(), "/prefix/app/hello");
        assert_eq!(request.path(), "/");
        assert_eq!(request.url(), "/prefix/app/hello/?x=1");
    }

    #[test]
    fn decodes_route_params() {
        let route = MatchedRoute::new("item".into(), [("name", "a%20b")]);

        assert_eq!(route.endpoint(), "item");
        assert_eq!(route.param("name"), Some("a b"));
        assert_eq!(route.param("missing"), None);
    }
}
