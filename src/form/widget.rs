use serde_json::{Map, Value};

use super::processor::{self, BoxProcessor, Processor, ProcessorContext};
use super::{Form, ProcessError, RenderContext};
use crate::request::Submitted;
use crate::util::{escape_html, push_attr};

const REQUIRED_MESSAGE: &str = "This field is required";

/// The kind of control a [`Widget`] renders.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Text,
    Password,
    Email,
    Url,
    DatePicker,
    Hidden,
    Textarea,
    Checkbox,
    Select,
}

/// The definition of a form field.
///
/// Widgets are immutable once built and are shared by every request that
/// uses the [`Schema`](super::Schema) they belong to. Per-request state such
/// as submitted values and errors lives in the [`Form`].
///
#[derive(Clone)]
pub struct Widget {
    name: String,
    id: String,
    label: String,
    description: String,
    required: bool,
    kind: Kind,
    css_class: String,
    attrs: Vec<(String, String)>,
    options: Option<Vec<(String, String)>>,
    multiple: bool,
    processors_out: Vec<BoxProcessor>,
    processors_in: Vec<BoxProcessor>,
    required_message: String,
}

impl Kind {
    fn input_type(self) -> Option<&'static str> {
        match self {
            Self::Text | Self::DatePicker => Some("text"),
            Self::Password => Some("password"),
            Self::Email => Some("email"),
            Self::Url => Some("url"),
            Self::Hidden => Some("hidden"),
            Self::Checkbox => Some("checkbox"),
            Self::Textarea | Self::Select => None,
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            Self::Text => "widget widget-text",
            Self::Password => "widget widget-password",
            Self::Email => "widget widget-email",
            Self::Url => "widget widget-url",
            Self::DatePicker => "widget widget-datepicker",
            Self::Hidden => "widget widget-hidden",
            Self::Textarea => "widget widget-textarea",
            Self::Checkbox => "widget widget-checkbox",
            Self::Select => "widget widget-select",
        }
    }

    fn default_attrs(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Text | Self::Password | Self::Email | Self::Url | Self::DatePicker => {
                &[("size", "10"), ("maxlength", "100")]
            }
            Self::Textarea => &[("cols", "40"), ("rows", "10")],
            Self::Hidden | Self::Checkbox | Self::Select => &[],
        }
    }
}

impl Widget {
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        let name = name.into();
        let attrs = kind
            .default_attrs()
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();

        Self {
            id: name.clone(),
            name,
            label: String::new(),
            description: String::new(),
            required: false,
            kind,
            css_class: kind.css_class().to_owned(),
            attrs,
            options: None,
            multiple: false,
            processors_out: Vec::new(),
            processors_in: Vec::new(),
            required_message: REQUIRED_MESSAGE.to_owned(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(Kind::Text, name)
    }

    pub fn password(name: impl Into<String>) -> Self {
        Self::new(Kind::Password, name)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(Kind::Email, name)
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(Kind::Url, name)
    }

    /// A text input styled as a date picker. The client-side script is up to
    /// the application.
    ///
    pub fn date_picker(name: impl Into<String>) -> Self {
        Self::new(Kind::DatePicker, name)
    }

    pub fn hidden(name: impl Into<String>) -> Self {
        Self::new(Kind::Hidden, name)
    }

    pub fn textarea(name: impl Into<String>) -> Self {
        Self::new(Kind::Textarea, name)
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(Kind::Checkbox, name)
    }

    /// A select box. Options come from [`Widget::with_options`] or, if unset, from
    /// the form vocabulary with the widget's name.
    ///
    pub fn select(name: impl Into<String>) -> Self {
        Self::new(Kind::Select, name)
    }
}

impl Widget {
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self
        }
    }

    pub fn with_label(self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self
        }
    }

    pub fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub fn with_required_message(self, message: impl Into<String>) -> Self {
        Self {
            required_message: message.into(),
            ..self
        }
    }

    pub fn with_css_class(self, css_class: impl Into<String>) -> Self {
        Self {
            css_class: css_class.into(),
            ..self
        }
    }

    /// Sets an additional attribute of the rendered tag, replacing an
    /// existing attribute with the same name.
    ///
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_attr(&mut self.attrs, name.into(), value.into());
        self
    }

    pub fn with_options<I, K, V>(self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        Self {
            options: Some(options),
            ..self
        }
    }

    pub fn multiple(self) -> Self {
        Self {
            multiple: true,
            ..self
        }
    }

    /// Appends a processor that runs on submitted values.
    ///
    pub fn with_processor_out(mut self, processor: impl Processor) -> Self {
        self.processors_out.push(processor::boxed(processor));
        self
    }

    /// Appends a processor that runs on values before they are displayed.
    ///
    pub fn with_processor_in(mut self, processor: impl Processor) -> Self {
        self.processors_in.push(processor::boxed(processor));
        self
    }
}

impl Widget {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The widget's public attributes, as exposed to field templates.
    ///
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "id": self.id,
            "label": self.label,
            "description": self.description,
            "required": self.required,
        })
    }
}

impl Widget {
    /// Reads the raw submitted value and enforces `required`.
    ///
    /// Input-like widgets treat a whitespace-only value as missing. A
    /// checkbox yields whether it was submitted. A multiple select yields
    /// every submitted value.
    ///
    pub fn from_form(&self, form: &Form<'_>) -> Result<Value, ProcessError> {
        let submitted = form.submitted_value(&self.name);

        match self.kind {
            Kind::Checkbox => {
                if self.required && submitted.is_absent() {
                    return Err(self.required_error());
                }

                Ok(Value::Bool(!submitted.is_absent()))
            }
            Kind::Select if self.multiple => {
                let values = form.submitted_values(&self.name);

                if self.required && values.iter().all(|value| value.trim().is_empty()) {
                    return Err(self.required_error());
                }

                Ok(values.into_iter().map(Value::from).collect())
            }
            _ => {
                if self.required && submitted.is_blank() {
                    return Err(self.required_error());
                }

                Ok(submitted.as_str().map_or(Value::Null, Value::from))
            }
        }
    }

    /// Returns the typed value of the widget: the raw value read by
    /// [`Widget::from_form`] passed through the outbound processors.
    ///
    pub fn get_value(&self, form: &Form<'_>) -> Result<Value, ProcessError> {
        let value = self.from_form(form)?;
        self.process_out(value, form.context())
    }

    /// Returns the value to display in the widget: the submitted value if
    /// there is one, else the form default, else an empty string. The value
    /// passes through the inbound processors.
    ///
    pub fn to_form(&self, cx: &RenderContext<'_, '_>) -> Result<Value, ProcessError> {
        let form = cx.form();
        let submitted = form.submitted_value(&self.name);

        let value = match (self.kind, submitted) {
            (Kind::Select, Submitted::Present(_)) if self.multiple => {
                form.submitted_values(&self.name)
                    .into_iter()
                    .map(Value::from)
                    .collect()
            }
            (Kind::Checkbox, _) if form.is_submitted() => Value::Bool(!submitted.is_absent()),
            (_, Submitted::Present(value)) => Value::from(value),
            (_, Submitted::Absent) => form
                .default_value(&self.name)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new())),
        };

        self.process_in(value, cx.attrs())
    }

    /// Renders the widget tag.
    ///
    /// `add_class` is appended to the CSS class. `overrides` replace or
    /// extend the widget's attributes.
    ///
    pub fn render(
        &self,
        cx: &RenderContext<'_, '_>,
        add_class: &str,
        overrides: &[(&str, &str)],
    ) -> Result<String, ProcessError> {
        let value = self.to_form(cx)?;
        let mut attrs = Vec::with_capacity(self.attrs.len() + overrides.len() + 4);

        if let Some(input_type) = self.kind.input_type() {
            attrs.push(("type".to_owned(), input_type.to_owned()));
        }

        attrs.push(("name".to_owned(), self.name.clone()));
        attrs.push(("class".to_owned(), join_class(&self.css_class, add_class)));
        attrs.push(("id".to_owned(), self.id.clone()));

        if self.kind == Kind::Select && self.multiple {
            attrs.push(("multiple".to_owned(), "multiple".to_owned()));
        }

        for (name, value) in self.attrs.iter() {
            set_attr(&mut attrs, name.clone(), value.clone());
        }

        for (name, value) in overrides {
            set_attr(&mut attrs, (*name).to_owned(), (*value).to_owned());
        }

        let mut html = String::new();

        match self.kind {
            Kind::Textarea => {
                html.push_str("<textarea");
                push_attrs(&mut html, &attrs);
                html.push('>');
                html.push_str(&escape_html(&display(&value)));
                html.push_str("</textarea>");
            }
            Kind::Select => {
                let options = self
                    .options
                    .as_deref()
                    .or_else(|| cx.form().vocab(&self.name))
                    .unwrap_or_default();

                html.push_str("<select");
                push_attrs(&mut html, &attrs);
                html.push('>');

                for (key, label) in options {
                    html.push_str("<option");
                    push_attr(&mut html, "value", key);

                    if is_selected(&value, key) {
                        html.push_str(" selected");
                    }

                    html.push('>');
                    html.push_str(&escape_html(label));
                    html.push_str("</option>");
                }

                html.push_str("</select>");
            }
            Kind::Checkbox => {
                set_attr(&mut attrs, "value".to_owned(), "1".to_owned());
                html.push_str("<input");
                push_attrs(&mut html, &attrs);

                if is_checked(&value) {
                    html.push_str(" checked");
                }

                html.push_str(" />");
            }
            _ => {
                set_attr(&mut attrs, "value".to_owned(), display(&value));
                html.push_str("<input");
                push_attrs(&mut html, &attrs);
                html.push_str(" />");
            }
        }

        Ok(html)
    }

    /// Runs the outbound processors on `value`.
    ///
    pub fn process_out(
        &self,
        value: Value,
        extra: &Map<String, Value>,
    ) -> Result<Value, ProcessError> {
        let cx = ProcessorContext::new(Some(&self.name), extra);
        processor::process(value, &self.processors_out, &cx)
    }

    /// Runs the inbound processors on `value`.
    ///
    pub fn process_in(
        &self,
        value: Value,
        extra: &Map<String, Value>,
    ) -> Result<Value, ProcessError> {
        let cx = ProcessorContext::new(Some(&self.name), extra);
        processor::process(value, &self.processors_in, &cx)
    }

    fn required_error(&self) -> ProcessError {
        ProcessError::new("required", self.required_message.clone())
    }
}

fn set_attr(attrs: &mut Vec<(String, String)>, name: String, value: String) {
    match attrs.iter_mut().find(|(existing, _)| *existing == name) {
        Some(entry) => entry.1 = value,
        None => attrs.push((name, value)),
    }
}

fn push_attrs(html: &mut String, attrs: &[(String, String)]) {
    for (name, value) in attrs {
        push_attr(html, name, value);
    }
}

fn join_class(css_class: &str, add_class: &str) -> String {
    format!("{} {}", css_class, add_class).trim().to_owned()
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn is_selected(value: &Value, key: &str) -> bool {
    match value {
        Value::Array(items) => items.iter().any(|item| display(item) == key),
        other => display(other) == key,
    }
}

fn is_checked(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Null => false,
        Value::String(text) => !matches!(text.as_str(), "" | "0" | "false" | "off"),
        _ => true,
    }
}
