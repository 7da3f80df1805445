//! Value processor chains.
//!
//! A processor transforms or validates a single [`Value`]. Chains run in
//! order and stop at the first [`ProcessError`].
//!

use serde_json::{Map, Number, Value};
use std::sync::Arc;

use super::ProcessError;

/// A shared, type-erased processor.
///
pub type BoxProcessor = Arc<dyn Processor>;

pub trait Processor: Send + Sync + 'static {
    fn process(&self, value: Value, cx: &ProcessorContext<'_>) -> Result<Value, ProcessError>;
}

/// The context a processor runs in: the widget being processed, if any, and
/// the keyword arguments of the surrounding form.
///
#[derive(Clone, Copy, Debug)]
pub struct ProcessorContext<'a> {
    widget: Option<&'a str>,
    extra: &'a Map<String, Value>,
}

/// A processor created from a closure with [`from_fn`].
///
pub struct FromFn<F> {
    f: F,
}

impl<'a> ProcessorContext<'a> {
    pub fn new(widget: Option<&'a str>, extra: &'a Map<String, Value>) -> Self {
        Self { widget, extra }
    }

    /// The name of the widget whose value is processed.
    ///
    pub fn widget(&self) -> Option<&'a str> {
        self.widget
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.extra.get(key)
    }

    pub fn extra(&self) -> &'a Map<String, Value> {
        self.extra
    }
}

impl<F> Processor for FromFn<F>
where
    F: Fn(Value, &ProcessorContext<'_>) -> Result<Value, ProcessError> + Send + Sync + 'static,
{
    fn process(&self, value: Value, cx: &ProcessorContext<'_>) -> Result<Value, ProcessError> {
        (self.f)(value, cx)
    }
}

/// Run `value` through `processors` in order.
///
pub fn process(
    value: Value,
    processors: &[BoxProcessor],
    cx: &ProcessorContext<'_>,
) -> Result<Value, ProcessError> {
    processors
        .iter()
        .try_fold(value, |value, processor| processor.process(value, cx))
}

/// Returns a processor that calls `f`.
///
/// ```
/// use flyer::form::processor::{self, ProcessorContext};
/// use serde_json::{json, Map, Value};
///
/// let upper = processor::from_fn(|value: Value, _: &ProcessorContext| {
///     Ok(match value {
///         Value::String(text) => Value::String(text.to_uppercase()),
///         other => other,
///     })
/// });
///
/// let extra = Map::new();
/// let cx = ProcessorContext::new(None, &extra);
/// let chain = [processor::boxed(upper)];
///
/// assert_eq!(processor::process(json!("abc"), &chain, &cx).unwrap(), json!("ABC"));
/// ```
///
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(Value, &ProcessorContext<'_>) -> Result<Value, ProcessError> + Send + Sync + 'static,
{
    FromFn { f }
}

pub fn boxed(processor: impl Processor) -> BoxProcessor {
    Arc::new(processor)
}

/// Strips leading and trailing whitespace from strings.
///
pub fn trim() -> impl Processor {
    from_fn(|value, _| {
        Ok(match value {
            Value::String(text) => Value::String(text.trim().to_owned()),
            other => other,
        })
    })
}

/// Parses a string as an `i64`. Empty strings become `null`.
///
pub fn integer() -> impl Processor {
    from_fn(|value, _| match value {
        Value::String(text) if text.trim().is_empty() => Ok(Value::Null),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| ProcessError::new("invalid_integer", "Please enter a whole number.")),
        Value::Number(number) if number.is_i64() || number.is_u64() => Ok(Value::Number(number)),
        Value::Null => Ok(Value::Null),
        _ => Err(ProcessError::new(
            "invalid_integer",
            "Please enter a whole number.",
        )),
    })
}

/// Parses a string as an `f64`. Empty strings become `null`.
///
pub fn float() -> impl Processor {
    fn invalid() -> ProcessError {
        ProcessError::new("invalid_float", "Please enter a number.")
    }

    from_fn(|value, _| match value {
        Value::String(text) if text.trim().is_empty() => Ok(Value::Null),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        Value::Number(number) => Ok(Value::Number(number)),
        Value::Null => Ok(Value::Null),
        _ => Err(invalid()),
    })
}

/// Converts common truthy and falsy strings to a boolean. `null` is false.
///
pub fn boolean() -> impl Processor {
    from_fn(|value, _| match value {
        Value::Bool(flag) => Ok(Value::Bool(flag)),
        Value::Null => Ok(Value::Bool(false)),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(Value::Bool(true)),
            "" | "0" | "false" | "off" | "no" => Ok(Value::Bool(false)),
            _ => Err(ProcessError::new("invalid_boolean", "Please enter yes or no.")),
        },
        _ => Err(ProcessError::new("invalid_boolean", "Please enter yes or no.")),
    })
}

/// Checks the number of characters of a string, or the number of items of
/// an array. Other values pass unchanged.
///
pub fn length(min: Option<usize>, max: Option<usize>) -> impl Processor {
    from_fn(move |value, _| {
        let len = match &value {
            Value::String(text) => Some(text.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        };

        let Some(len) = len else {
            return Ok(value);
        };

        if let Some(min) = min.filter(|min| len < *min) {
            return Err(ProcessError::new(
                "too_short",
                format!("Please enter at least {} characters.", min),
            ));
        }

        if let Some(max) = max.filter(|max| len > *max) {
            return Err(ProcessError::new(
                "too_long",
                format!("Please enter at most {} characters.", max),
            ));
        }

        Ok(value)
    })
}

/// Checks that a non-empty string looks like an email address.
///
pub fn email() -> impl Processor {
    from_fn(|value, _| {
        let valid = match &value {
            Value::String(text) => text.is_empty() || is_email(text),
            _ => true,
        };

        if valid {
            Ok(value)
        } else {
            Err(ProcessError::new(
                "invalid_email",
                "Please enter a valid email address.",
            ))
        }
    })
}

/// Checks that a non-empty string, or every item of an array, is one of
/// `choices`.
///
pub fn one_of<I, S>(choices: I) -> impl Processor
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let choices: Vec<String> = choices.into_iter().map(Into::into).collect();

    from_fn(move |value, _| {
        let allowed = |item: &Value| match item {
            Value::String(text) => text.is_empty() || choices.iter().any(|choice| choice == text),
            Value::Null => true,
            _ => false,
        };

        let ok = match &value {
            Value::Array(items) => items.iter().all(allowed),
            other => allowed(other),
        };

        if ok {
            Ok(value)
        } else {
            Err(ProcessError::new("invalid_choice", "Please select a valid choice."))
        }
    })
}

/// Replaces `null` and empty strings with `default`.
///
pub fn default_value(default: Value) -> impl Processor {
    from_fn(move |value, _| match value {
        Value::Null => Ok(default.clone()),
        Value::String(text) if text.is_empty() => Ok(default.clone()),
        other => Ok(other),
    })
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !text.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn run(value: Value, chain: &[BoxProcessor]) -> Result<Value, ProcessError> {
        let extra = Map::new();
        process(value, chain, &ProcessorContext::new(Some("field"), &extra))
    }

    #[test]
    fn chains_run_in_order() {
        let chain = [boxed(trim()), boxed(integer())];
        assert_eq!(run(json!("  42 "), &chain).unwrap(), json!(42));
    }

    #[test]
    fn first_error_stops_the_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let count = from_fn(move |value, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        });

        let chain = [boxed(integer()), boxed(count)];
        let error = run(json!("abc"), &chain).unwrap_err();

        assert_eq!(error.kind(), "invalid_integer");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn processors_see_the_context() {
        let extra = Map::from_iter([("suffix".to_owned(), json!("!"))]);
        let append = from_fn(|value, cx| {
            let suffix = cx.get("suffix").and_then(Value::as_str).unwrap_or_default();
            let widget = cx.widget().unwrap_or_default();
            Ok(json!(format!("{}:{}{}", widget, value.as_str().unwrap_or_default(), suffix)))
        });

        let cx = ProcessorContext::new(Some("name"), &extra);
        let value = process(json!("x"), &[boxed(append)], &cx).unwrap();

        assert_eq!(value, json!("name:x!"));
    }

    #[test]
    fn builtin_conversions() {
        assert_eq!(run(json!(""), &[boxed(integer())]).unwrap(), Value::Null);
        assert_eq!(run(json!("2.5"), &[boxed(float())]).unwrap(), json!(2.5));
        assert_eq!(run(json!("on"), &[boxed(boolean())]).unwrap(), json!(true));
        assert_eq!(run(Value::Null, &[boxed(boolean())]).unwrap(), json!(false));
        assert_eq!(
            run(Value::Null, &[boxed(default_value(json!("n/a")))]).unwrap(),
            json!("n/a")
        );
        assert_eq!(run(json!("maybe"), &[boxed(boolean())]).unwrap_err().kind(), "invalid_boolean");
    }

    #[test]
    fn builtin_validators() {
        let bounded = [boxed(length(Some(2), Some(4)))];

        assert_eq!(run(json!("a"), &bounded).unwrap_err().kind(), "too_short");
        assert_eq!(run(json!("abcde"), &bounded).unwrap_err().kind(), "too_long");
        assert_eq!(run(json!("abc"), &bounded).unwrap(), json!("abc"));

        let email = [boxed(email())];

        assert!(run(json!("ada@example.org"), &email).is_ok());
        assert!(run(json!(""), &email).is_ok());
        assert_eq!(run(json!("ada@example"), &email).unwrap_err().kind(), "invalid_email");
        assert_eq!(run(json!("a b@example.org"), &email).unwrap_err().kind(), "invalid_email");

        let choice = [boxed(one_of(["red", "green"]))];

        assert!(run(json!("red"), &choice).is_ok());
        assert!(run(json!(["red", "green"]), &choice).is_ok());
        assert_eq!(run(json!("blue"), &choice).unwrap_err().kind(), "invalid_choice");
    }
}
