use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::SessionError;

/// Serializes `value` as JSON and encodes it as unpadded url-safe base64.
///
pub(crate) fn encode<T: Serialize>(value: &T) -> Result<String, SessionError> {
    let json = serde_json::to_vec(value)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub(crate) fn decode<T: DeserializeOwned>(input: &str) -> Result<T, SessionError> {
    let json = URL_SAFE_NO_PAD.decode(input)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{decode, encode};
    use crate::session::SessionError;

    #[test]
    fn cookie_safe_encoding() {
        let encoded = encode(&json!({ "user": "ada?&=" })).unwrap();

        assert!(encoded.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode::<Value>(&encoded).unwrap(), json!({ "user": "ada?&=" }));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode::<Value>("%%%"), Err(SessionError::Base64(_))));
        assert!(matches!(decode::<Value>("bm9wZQ"), Err(SessionError::Json(_))));
    }
}
