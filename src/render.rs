//! The template rendering seam.
//!
//! The framework does not ship a template engine. Applications register an
//! implementation of [`Render`] with
//! [`Builder::renderer`](crate::Builder::renderer), usually a thin wrapper
//! around the engine of their choice.
//!

use serde_json::Value;

use crate::error::Error;

pub trait Render: Send + Sync + 'static {
    /// Render the template named `template` with `data` as its context.
    ///
    fn render(&self, template: &str, data: &Value) -> Result<String, Error>;
}

impl<F> Render for F
where
    F: Fn(&str, &Value) -> Result<String, Error> + Send + Sync + 'static,
{
    fn render(&self, template: &str, data: &Value) -> Result<String, Error> {
        self(template, data)
    }
}
