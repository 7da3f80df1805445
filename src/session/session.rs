use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The data of a session.
///
/// Mutations set the `modified` flag. A session that was emptied after it
/// was modified is removed from the client when it is saved.
///
#[derive(Clone, Debug, Default)]
pub struct Session {
    data: Map<String, Value>,
    permanent: bool,
    modified: bool,
    null: bool,
}

/// The serialized form of a session.
///
#[derive(Deserialize, Serialize)]
pub(crate) struct Payload {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) permanent: bool,
    pub(crate) data: Map<String, Value>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that is never saved.
    ///
    pub fn null() -> Self {
        Self {
            null: true,
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Deserializes the value of `key`. Returns `None` if the key is absent
    /// or the value has a different shape.
    ///
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        serde_json::from_value(self.data.get(key)?.clone()).ok()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.modified = true;
        self.data.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key);

        if removed.is_some() {
            self.modified = true;
        }

        removed
    }

    pub fn clear(&mut self) {
        if !self.data.is_empty() {
            self.modified = true;
        }

        self.data.clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_null(&self) -> bool {
        self.null
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Returns true if the session cookie outlives the browser session.
    ///
    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn set_permanent(&mut self, permanent: bool) {
        if self.permanent != permanent {
            self.modified = true;
        }

        self.permanent = permanent;
    }

    pub(crate) fn from_payload(payload: Payload) -> Self {
        Self {
            data: payload.data,
            permanent: payload.permanent,
            modified: false,
            null: false,
        }
    }

    pub(crate) fn to_payload(&self) -> Payload {
        Payload {
            permanent: self.permanent,
            data: self.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Session;

    #[test]
    fn tracks_modifications() {
        let mut session = Session::new();
        assert!(!session.is_modified());

        session.remove("missing");
        session.clear();
        assert!(!session.is_modified());

        session.insert("count", 1);
        assert!(session.is_modified());
        assert_eq!(session.get_as::<u32>("count"), Some(1));
        assert_eq!(session.get_as::<String>("count"), None);
    }

    #[test]
    fn null_sessions() {
        assert!(Session::null().is_null());
        assert!(!Session::new().is_null());
    }

    #[test]
    fn payload_roundtrip_keeps_permanence() {
        let mut session = Session::new();

        session.insert("user", json!({ "name": "ada" }));
        session.set_permanent(true);

        let restored = Session::from_payload(session.to_payload());

        assert!(restored.is_permanent());
        assert!(!restored.is_modified());
        assert_eq!(restored.get("user"), Some(&json!({ "name": "ada" })));
    }
}
