mod builder;
mod redirect;
mod response;

pub use builder::ResponseBuilder;
pub use redirect::Redirect;
pub use response::Response;

use http::HeaderValue;

pub(crate) const APPLICATION_JSON: HeaderValue =
    HeaderValue::from_static("application/json; charset=utf-8");
pub(crate) const TEXT_HTML: HeaderValue = HeaderValue::from_static("text/html; charset=utf-8");
pub(crate) const TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");
