use http::header::{ALLOW, HeaderValue, LOCATION};
use http::{HeaderMap, Method, StatusCode};
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};

use super::BoxError;
use crate::response::Response;
use crate::util::escape_html;

/// An error that maps directly to an HTTP status code.
///
/// Converting an `HttpError` into a [`Response`] renders a small HTML page
/// with the status, its reason phrase, and a description. Headers attached to
/// the error (`Allow` for a 405, `Location` for a redirect) are copied to the
/// response.
///
pub struct HttpError {
    status: StatusCode,
    message: Option<String>,
    headers: HeaderMap,
    source: Option<BoxError>,
}

impl HttpError {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
            headers: HeaderMap::new(),
            source: None,
        }
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    pub fn with_source(self, source: BoxError) -> Self {
        Self {
            source: Some(source),
            ..self
        }
    }

    pub(crate) fn with_allow(mut self, allow: &[Method]) -> Self {
        let list = allow.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");

        if let Ok(value) = HeaderValue::from_str(&list) {
            self.headers.insert(ALLOW, value);
        }

        self
    }

    pub(crate) fn with_location(mut self, location: impl Into<String>) -> Self {
        let location = location.into();

        if let Ok(value) = HeaderValue::from_str(&location) {
            self.headers.insert(LOCATION, value);
        }

        self
    }
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the `Location` of a redirect error.
    ///
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION)?.to_str().ok()
    }

    fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown Error")
    }

    fn description(&self) -> String {
        if let Some(message) = &self.message {
            return escape_html(message);
        }

        if self.status.is_redirection() {
            let location = escape_html(self.location().unwrap_or_default());
            return format!(
                "You should be redirected automatically to the target URL: \
                 <a href=\"{0}\">{0}</a>. If not, click the link.",
                location
            );
        }

        let text = match self.status {
            StatusCode::BAD_REQUEST => {
                "The browser (or proxy) sent a request that this server could not understand."
            }
            StatusCode::UNAUTHORIZED => {
                "The server could not verify that you are authorized to access the URL requested."
            }
            StatusCode::FORBIDDEN => {
                "You don't have the permission to access the requested resource."
            }
            StatusCode::NOT_FOUND => {
                "The requested URL was not found on the server. If you entered the URL manually \
                 please check your spelling and try again."
            }
            StatusCode::METHOD_NOT_ALLOWED => "The method is not allowed for the requested URL.",
            StatusCode::PAYLOAD_TOO_LARGE => "The data value transmitted exceeds the capacity limit.",
            StatusCode::INTERNAL_SERVER_ERROR => {
                "The server encountered an internal error and was unable to complete your \
                 request. Either the server is overloaded or there is an error in the \
                 application."
            }
            _ => "",
        };

        escape_html(text)
    }
}

impl Debug for HttpError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("HttpError")
            .field("status", &self.status)
            .field("message", &self.message)
            .field("source", &self.source)
            .finish()
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.reason())?;

        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }

        Ok(())
    }
}

impl StdError for HttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let source = self.source.as_ref()?;
        Some(&**source)
    }
}

impl From<HttpError> for Response {
    fn from(error: HttpError) -> Self {
        let code = error.status.as_u16();
        let reason = error.reason();
        let body = format!(
            "<!doctype html>\n<html lang=en>\n<title>{code} {reason}</title>\n\
             <h1>{reason}</h1>\n<p>{}</p>\n",
            error.description()
        );

        let mut response = Response::html(body);

        response.set_status(error.status);
        response.headers_mut().extend(error.headers);
        response
    }
}

#[cfg(test)]
mod tests {
    use http::header::{ALLOW, LOCATION};
    use http::{Method, StatusCode};

    use super::HttpError;
    use crate::response::Response;

    #[test]
    fn renders_an_html_page() {
        let response = Response::from(HttpError::new(StatusCode::NOT_FOUND));
        let body = response.text_body();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body.contains("<title>404 Not Found</title>"));
        assert!(body.contains("<h1>Not Found</h1>"));
    }

    #[test]
    fn escapes_messages() {
        let error = HttpError::new(StatusCode::BAD_REQUEST).with_message("<script>");
        let response = Response::from(error);

        assert!(response.text_body().contains("&lt;script&gt;"));
    }

    #[test]
    fn copies_headers_to_the_response() {
        let error = HttpError::new(StatusCode::METHOD_NOT_ALLOWED)
            .with_allow(&[Method::GET, Method::POST]);
        let response = Response::from(error);

        assert_eq!(response.headers()[ALLOW], "GET, POST");

        let error = HttpError::new(StatusCode::PERMANENT_REDIRECT).with_location("/a/");
        let response = Response::from(error);

        assert_eq!(response.headers()[LOCATION], "/a/");
        assert!(response.text_body().contains("<a href=\"/a/\">/a/</a>"));
    }
}
