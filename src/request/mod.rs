mod builder;
mod form_data;
mod request;

pub use builder::RequestBuilder;
pub use form_data::{FormData, Submitted};
pub use request::{Envelope, MatchedRoute, Request};
