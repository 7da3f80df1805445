use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};

use super::processor::{self, ProcessorContext};
use super::{FormError, ProcessError, RenderContext, Schema};
use crate::request::{FormData, Request, Submitted};

/// The per-request state of a [`Schema`]: defaults, submitted data, errors,
/// render context, and vocabularies.
///
pub struct Form<'a> {
    schema: &'a Schema,
    defaults: Map<String, Value>,
    submitted: Option<&'a FormData>,
    errors: BTreeMap<String, ProcessError>,
    context: Map<String, Value>,
    vocabs: HashMap<String, Vec<(String, String)>>,
}

pub struct FormBuilder<'a> {
    schema: &'a Schema,
    defaults: Value,
    submitted: Option<&'a FormData>,
    context: Map<String, Value>,
    vocabs: HashMap<String, Vec<(String, String)>>,
}

impl<'a> FormBuilder<'a> {
    /// Initial values, usually taken from a stored record. Passed through the
    /// schema's inbound processors when the form is built.
    ///
    pub fn defaults(self, defaults: Value) -> Self {
        Self { defaults, ..self }
    }

    pub fn submitted(self, submitted: &'a FormData) -> Self {
        Self {
            submitted: Some(submitted),
            ..self
        }
    }

    /// Uses the url-encoded body of `request` as the submitted data.
    ///
    pub fn request(self, request: &'a Request) -> Self {
        self.submitted(request.form())
    }

    /// Adds a keyword argument that processors and render contexts can read.
    ///
    pub fn context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Sets the options of the select widget `name`.
    ///
    pub fn vocab<I, K, V>(mut self, name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        self.vocabs.insert(name.into(), options);
        self
    }

    pub fn finish(self) -> Result<Form<'a>, ProcessError> {
        let cx = ProcessorContext::new(None, &self.context);
        let defaults = match processor::process(self.defaults, self.schema.processors_in(), &cx)? {
            Value::Object(defaults) => defaults,
            Value::Null => Map::new(),
            _ => {
                return Err(ProcessError::new(
                    "invalid_defaults",
                    "Form defaults must be an object.",
                ));
            }
        };

        Ok(Form {
            schema: self.schema,
            defaults,
            submitted: self.submitted,
            errors: BTreeMap::new(),
            context: self.context,
            vocabs: self.vocabs,
        })
    }
}

impl<'a> Form<'a> {
    pub fn builder(schema: &'a Schema) -> FormBuilder<'a> {
        FormBuilder {
            schema,
            defaults: Value::Null,
            submitted: None,
            context: Map::new(),
            vocabs: HashMap::new(),
        }
    }

    /// Attaches the errors of a failed [`Form::process`] so the form can be
    /// rendered again with inline messages.
    ///
    pub fn with_errors(self, errors: FormError) -> Self {
        Self {
            errors: errors.into_fields(),
            ..self
        }
    }

    /// Validates every widget against the submitted data.
    ///
    /// Every widget is evaluated even if an earlier one fails. If any fails,
    /// the returned [`FormError`] contains all failures. Otherwise the
    /// envelope `{"object": obj, "fielddata": {...}}` is passed through the
    /// schema's outbound processors, with `extra` merged into the context.
    ///
    pub fn process(&self, obj: Value, extra: Map<String, Value>) -> Result<Value, FormError> {
        let mut fielddata = Map::new();
        let mut errors = BTreeMap::new();

        for widget in self.schema.widgets() {
            match widget.get_value(self) {
                Ok(value) => {
                    fielddata.insert(widget.name().to_owned(), value);
                }
                Err(error) => {
                    errors.insert(widget.name().to_owned(), error);
                }
            }
        }

        if !errors.is_empty() {
            return Err(FormError::new(errors));
        }

        let mut context = self.context.clone();
        context.extend(extra);

        let envelope = json!({ "object": obj, "fielddata": fielddata });
        let cx = ProcessorContext::new(None, &context);

        processor::process(envelope, self.schema.processors_out(), &cx).map_err(FormError::form)
    }

    /// Returns the render context of the widget `name`.
    ///
    pub fn field(&self, name: &str) -> Option<RenderContext<'_, 'a>> {
        let widget = self.schema.get(name)?;
        Some(RenderContext::new(self, widget))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, ProcessError> {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&ProcessError> {
        self.errors.get(name)
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    pub fn default_value(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn vocab(&self, name: &str) -> Option<&[(String, String)]> {
        self.vocabs.get(name).map(Vec::as_slice)
    }

    /// Returns true if the form was built with submitted data.
    ///
    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn submitted_value(&self, name: &str) -> Submitted<'a> {
        self.submitted
            .map_or(Submitted::Absent, |submitted| submitted.get(name))
    }

    pub fn submitted_values(&self, name: &str) -> Vec<&'a str> {
        match self.submitted {
            Some(submitted) => submitted.get_all(name).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::form::processor::{self, ProcessorContext};
    use crate::form::{ProcessError, Schema, Widget};
    use crate::request::FormData;

    fn schema() -> Schema {
        Schema::new()
            .widget(Widget::text("title").required())
            .widget(
                Widget::text("year")
                    .required()
                    .with_processor_out(processor::integer()),
            )
            .widget(Widget::checkbox("published"))
            .widget(Widget::select("tags").multiple())
    }

    #[test]
    fn collects_every_error() {
        let schema = schema();
        let submitted = FormData::parse("title=+++&year=soon");
        let form = schema.form().submitted(&submitted).finish().unwrap();

        let errors = form.process(Value::Null, Map::new()).unwrap_err();

        assert_eq!(errors.fields().len(), 2);
        assert_eq!(errors.get("title").unwrap().kind(), "required");
        assert_eq!(errors.get("year").unwrap().kind(), "invalid_integer");
        assert_eq!(errors.messages()["title"], "This field is required");
    }

    #[test]
    fn evaluates_widgets_after_a_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let schema = Schema::new()
            .widget(Widget::text("first").required())
            .widget(Widget::text("second").with_processor_out(processor::from_fn(
                move |value, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(value)
                },
            )));

        let submitted = FormData::new();
        let form = schema.form().submitted(&submitted).finish().unwrap();

        assert!(form.process(Value::Null, Map::new()).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn builds_the_envelope() {
        let schema = schema().with_processor_out(processor::from_fn(
            |mut envelope: Value, cx: &ProcessorContext| {
                envelope["user"] = cx.get("user").cloned().unwrap_or_default();
                Ok(envelope)
            },
        ));

        let submitted = FormData::parse("title=Dune&year=1965&published=1&tags=a&tags=b");
        let form = schema
            .form()
            .submitted(&submitted)
            .context("user", json!("ada"))
            .finish()
            .unwrap();

        let result = form.process(json!({ "id": 7 }), Map::new()).unwrap();

        assert_eq!(result["object"], json!({ "id": 7 }));
        assert_eq!(
            result["fielddata"],
            json!({ "title": "Dune", "year": 1965, "published": true, "tags": ["a", "b"] })
        );
        assert_eq!(result["user"], json!("ada"));
    }

    #[test]
    fn form_level_errors() {
        let schema = Schema::new().with_processor_out(processor::from_fn(|_, _| {
            Err(ProcessError::new("conflict", "Already exists."))
        }));

        let form = schema.form().finish().unwrap();
        let error = form.process(Value::Null, Map::new()).unwrap_err();

        assert!(error.fields().is_empty());
        assert_eq!(error.form_error().unwrap().kind(), "conflict");
    }

    #[test]
    fn defaults_pass_through_inbound_processors() {
        let schema = Schema::new()
            .widget(Widget::text("title"))
            .with_processor_in(processor::from_fn(|mut defaults: Value, _: &ProcessorContext| {
                defaults["title"] = json!("untitled");
                Ok(defaults)
            }));

        let form = schema.form().defaults(json!({})).finish().unwrap();

        assert_eq!(form.default_value("title"), Some(&json!("untitled")));
        assert!(!form.is_submitted());
    }

    #[test]
    fn rejects_non_object_defaults() {
        let schema = Schema::new();
        let error = schema.form().defaults(json!([1])).finish().err().unwrap();

        assert_eq!(error.kind(), "invalid_defaults");
    }

    #[test]
    fn errors_can_be_attached_for_rendering() {
        let schema = schema();
        let submitted = FormData::new();
        let form = schema.form().submitted(&submitted).finish().unwrap();
        let errors = form.process(Value::Null, Map::new()).unwrap_err();

        let form = schema
            .form()
            .submitted(&submitted)
            .finish()
            .unwrap()
            .with_errors(errors);

        assert!(form.has_errors());
        assert_eq!(form.error("year").unwrap().kind(), "required");
        assert!(form.error("published").is_none());
    }
}
