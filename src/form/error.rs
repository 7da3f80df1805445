use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A validation failure produced by a processor.
///
/// `kind` is a stable identifier such as `"required"` or `"invalid_integer"`.
/// `message` is the human-readable text shown next to the field.
///
#[derive(Clone, Debug, Eq, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ProcessError {
    kind: Cow<'static, str>,
    message: String,
}

/// The aggregate result of a failed [`Form::process`](super::Form::process).
///
/// Contains an entry for every widget that failed, not only the first one.
///
#[derive(Clone, Debug, Default, thiserror::Error)]
#[error("form validation failed for {} field(s)", .fields.len())]
pub struct FormError {
    fields: BTreeMap<String, ProcessError>,
    form: Option<ProcessError>,
}

impl ProcessError {
    pub fn new(kind: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl FormError {
    pub(crate) fn new(fields: BTreeMap<String, ProcessError>) -> Self {
        Self { fields, form: None }
    }

    pub(crate) fn form(error: ProcessError) -> Self {
        Self {
            fields: BTreeMap::new(),
            form: Some(error),
        }
    }

    /// Returns the error of the widget `name`.
    ///
    pub fn get(&self, name: &str) -> Option<&ProcessError> {
        self.fields.get(name)
    }

    /// Returns the per-widget errors ordered by widget name.
    ///
    pub fn fields(&self) -> &BTreeMap<String, ProcessError> {
        &self.fields
    }

    /// Returns the error raised by a form-level processor, if any.
    ///
    pub fn form_error(&self) -> Option<&ProcessError> {
        self.form.as_ref()
    }

    /// Maps each failed widget to its error message.
    ///
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(name, error)| (name.clone(), error.message.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_none()
    }

    pub(crate) fn into_fields(self) -> BTreeMap<String, ProcessError> {
        self.fields
    }
}
