use serde_json::{Map, Value};

use super::{Form, ProcessError, Widget};
use crate::error::Error;
use crate::render::Render;

/// A widget bound to the form it is rendered in.
///
/// The attributes start as a copy of the form context and can be extended
/// per field with [`RenderContext::with`].
///
pub struct RenderContext<'f, 'a> {
    form: &'f Form<'a>,
    widget: &'a Widget,
    attrs: Map<String, Value>,
}

impl<'f, 'a> RenderContext<'f, 'a> {
    pub(crate) fn new(form: &'f Form<'a>, widget: &'a Widget) -> Self {
        Self {
            attrs: form.context().clone(),
            form,
            widget,
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    pub fn form(&self) -> &'f Form<'a> {
        self.form
    }

    pub fn widget(&self) -> &'a Widget {
        self.widget
    }

    pub fn attrs(&self) -> &Map<String, Value> {
        &self.attrs
    }

    /// The error of this widget from a previous submission.
    ///
    pub fn error(&self) -> Option<&'f ProcessError> {
        self.form.error(self.widget.name())
    }

    /// The value to display. See [`Widget::to_form`].
    ///
    pub fn value(&self) -> Result<Value, ProcessError> {
        self.widget.to_form(self)
    }

    /// Renders only the widget tag.
    ///
    pub fn tag(&self, add_class: &str, overrides: &[(&str, &str)]) -> Result<String, ProcessError> {
        self.widget.render(self, add_class, overrides)
    }

    /// Renders the widget tag and wraps it in the field template.
    ///
    /// The template receives `data` (the widget's attributes), `tag`,
    /// `error` (the message or `null`), `has_errors`, and every entry of
    /// `field_attrs`. `template` defaults to the schema's widget template.
    ///
    pub fn render(
        &self,
        engine: &dyn Render,
        widget_attrs: &[(&str, &str)],
        field_attrs: Map<String, Value>,
        template: Option<&str>,
    ) -> Result<String, Error> {
        let template = template.unwrap_or(self.form.schema().widget_template());
        let add_class = if self.error().is_some() { "error" } else { "" };
        let tag = self.tag(add_class, widget_attrs)?;

        let mut data = field_attrs;

        data.insert("data".to_owned(), self.widget.to_json());
        data.insert("tag".to_owned(), Value::String(tag));
        data.insert(
            "error".to_owned(),
            self.error()
                .map_or(Value::Null, |error| Value::from(error.message())),
        );
        data.insert("has_errors".to_owned(), Value::Bool(self.form.has_errors()));

        engine.render(template, &Value::Object(data))
    }
}
