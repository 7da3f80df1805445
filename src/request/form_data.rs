use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::borrow::Cow;
use std::fmt::Write;

/// Characters that are percent-encoded in a serialized form body.
///
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// The raw value submitted for a field.
///
/// A field that was submitted with an empty value is `Present("")`, which is
/// distinct from a field that was not submitted at all.
///
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Submitted<'a> {
    #[default]
    Absent,
    Present(&'a str),
}

/// An ordered multi-map of decoded `application/x-www-form-urlencoded`
/// name/value pairs. Used for both query strings and form bodies.
///
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl<'a> Submitted<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns true if the value is absent, empty, or only whitespace.
    ///
    pub fn is_blank(&self) -> bool {
        self.as_str().is_none_or(|value| value.trim().is_empty())
    }
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a url-encoded string. `+` decodes to a space. Invalid UTF-8 in
    /// a percent-encoded sequence is replaced rather than rejected.
    ///
    pub fn parse(input: &str) -> Self {
        let entries = input
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                let name = decode(name);

                if name.is_empty() {
                    None
                } else {
                    Some((name, decode(value)))
                }
            })
            .collect();

        Self { entries }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the first value submitted for `name`.
    ///
    pub fn get(&self, name: &str) -> Submitted<'_> {
        self.get_all(name)
            .next()
            .map_or(Submitted::Absent, Submitted::Present)
    }

    /// Returns every value submitted for `name` in order.
    ///
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serializes the entries as a url-encoded string.
    ///
    pub fn encode(&self) -> String {
        let mut output = String::new();

        for (index, (name, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                output.push('&');
            }

            let _ = write!(
                output,
                "{}={}",
                utf8_percent_encode(name, FORM_ENCODE_SET),
                utf8_percent_encode(value, FORM_ENCODE_SET)
            );
        }

        output
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

fn decode(input: &str) -> String {
    let input = if input.contains('+') {
        Cow::Owned(input.replace('+', " "))
    } else {
        Cow::Borrowed(input)
    };

    percent_decode_str(&input).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::{FormData, Submitted};

    #[test]
    fn parses_pairs_in_order() {
        let data = FormData::parse("tag=a&name=hello+world&tag=b%26c&empty=&flag");

        assert_eq!(data.get("name"), Submitted::Present("hello world"));
        assert_eq!(data.get_all("tag").collect::<Vec<_>>(), ["a", "b&c"]);
        assert_eq!(data.get("empty"), Submitted::Present(""));
        assert_eq!(data.get("flag"), Submitted::Present(""));
        assert_eq!(data.get("missing"), Submitted::Absent);
        assert_eq!(data.len(), 5);
    }

    #[test]
    fn ignores_malformed_segments() {
        let data = FormData::parse("&&=orphan&q=%E2%9C%93&bad=%C3%28");

        assert_eq!(data.len(), 2);
        assert_eq!(data.get("q"), Submitted::Present("✓"));
        assert_eq!(data.get("bad"), Submitted::Present("\u{FFFD}("));
    }

    #[test]
    fn blank_values() {
        assert!(Submitted::Absent.is_blank());
        assert!(Submitted::Present("  \t").is_blank());
        assert!(!Submitted::Present(" x ").is_blank());
    }

    #[test]
    fn encodes_reversibly() {
        let data: FormData = [("a b", "1&2"), ("c", "ü")].into_iter().collect();
        let encoded = data.encode();

        assert_eq!(encoded, "a%20b=1%262&c=%C3%BC");
        assert_eq!(FormData::parse(&encoded), data);
    }
}
