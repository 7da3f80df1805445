use super::processor::{self, BoxProcessor, Processor};
use super::{Form, FormBuilder, Widget};

const WIDGET_TEMPLATE: &str = "widget.html";

/// An ordered collection of widgets plus form-level processors.
///
/// A schema is built once and shared. Each request creates a [`Form`] that
/// borrows it.
///
/// ```
/// use flyer::form::{processor, Schema, Widget};
///
/// let schema = Schema::new()
///     .widget(Widget::text("title").with_label("Title").required())
///     .widget(
///         Widget::text("year")
///             .with_processor_out(processor::trim())
///             .with_processor_out(processor::integer()),
///     );
///
/// assert_eq!(schema.widgets().len(), 2);
/// ```
///
#[derive(Clone)]
pub struct Schema {
    widgets: Vec<Widget>,
    processors_in: Vec<BoxProcessor>,
    processors_out: Vec<BoxProcessor>,
    widget_template: String,
}

impl Schema {
    pub fn new() -> Self {
        Self {
            widgets: Vec::new(),
            processors_in: Vec::new(),
            processors_out: Vec::new(),
            widget_template: WIDGET_TEMPLATE.to_owned(),
        }
    }

    pub fn widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self
    }

    /// Appends a processor that runs on the form defaults when a form is
    /// created.
    ///
    pub fn with_processor_in(mut self, processor: impl Processor) -> Self {
        self.processors_in.push(processor::boxed(processor));
        self
    }

    /// Appends a processor that runs on the `{"object", "fielddata"}`
    /// envelope after every widget validated.
    ///
    pub fn with_processor_out(mut self, processor: impl Processor) -> Self {
        self.processors_out.push(processor::boxed(processor));
        self
    }

    /// Sets the template that wraps each rendered widget.
    ///
    pub fn with_widget_template(self, template: impl Into<String>) -> Self {
        Self {
            widget_template: template.into(),
            ..self
        }
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn get(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|widget| widget.name() == name)
    }

    pub fn widget_template(&self) -> &str {
        &self.widget_template
    }

    pub(crate) fn processors_in(&self) -> &[BoxProcessor] {
        &self.processors_in
    }

    pub(crate) fn processors_out(&self) -> &[BoxProcessor] {
        &self.processors_out
    }

    /// Starts a per-request form for this schema.
    ///
    pub fn form(&self) -> FormBuilder<'_> {
        Form::builder(self)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
