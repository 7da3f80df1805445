use cookie::Key;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Settings;
use crate::request::Request;
use crate::response::Response;
use crate::session::{SessionError, build_cookie, decode, encode, removal_cookie};

/// A message queued for the next page the client renders.
///
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FlashMessage {
    pub message: String,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// The flash messages of a request.
///
/// Messages read from the flash cookie are `incoming`. Messages queued while
/// handling the request are `outgoing` and are written to the flash cookie
/// unless they are rendered first.
///
#[derive(Debug, Default)]
pub(crate) struct Flash {
    incoming: Vec<FlashMessage>,
    outgoing: Vec<FlashMessage>,
    read: bool,
    had_cookie: bool,
}

fn default_category() -> String {
    "message".to_owned()
}

impl FlashMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category: default_category(),
            extra: Map::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl Flash {
    pub(crate) fn open(settings: &Settings, key: &Key, request: &Request) -> Self {
        let name = settings.flash_cookie_name.as_str();
        let cookies = request.cookies();
        let had_cookie = cookies.get(name).is_some();

        let incoming = match cookies.signed(key).get(name) {
            Some(cookie) => decode(cookie.value()).unwrap_or_else(|error| {
                tracing::warn!(cookie = name, "discarding undecodable flash cookie: {}", error);
                Vec::new()
            }),
            None => {
                if had_cookie {
                    tracing::warn!(cookie = name, "discarding flash cookie with an invalid signature");
                }

                Vec::new()
            }
        };

        Self {
            incoming,
            outgoing: Vec::new(),
            read: false,
            had_cookie,
        }
    }

    pub(crate) fn push(&mut self, message: FlashMessage) {
        self.outgoing.push(message);
    }

    /// Returns every incoming and outgoing message and marks them as shown.
    ///
    pub(crate) fn take(&mut self) -> Vec<FlashMessage> {
        let mut messages = self.incoming.clone();

        messages.append(&mut self.outgoing);
        self.read = true;
        messages
    }

    /// Writes the messages that were not shown to the flash cookie, or
    /// removes the cookie once everything in it was shown.
    ///
    pub(crate) fn save(
        self,
        settings: &Settings,
        key: &Key,
        response: &mut Response,
    ) -> Result<(), SessionError> {
        if !self.read && self.outgoing.is_empty() {
            return Ok(());
        }

        let name = settings.flash_cookie_name.clone();
        let mut pending = if self.read { Vec::new() } else { self.incoming };

        pending.extend(self.outgoing);

        if pending.is_empty() {
            if self.had_cookie {
                response.cookies_mut().add(removal_cookie(settings, name));
            }

            return Ok(());
        }

        let cookie = build_cookie(settings, name, encode(&pending)?).build();

        response.cookies_mut().signed_mut(key).add(cookie);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cookie::Key;

    use super::{Flash, FlashMessage};
    use crate::config::{Layers, Settings};
    use crate::request::Request;
    use crate::response::Response;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn settings() -> Settings {
        let mut layers = Layers::default();

        layers.set_override("secret_key", SECRET);
        layers.load().unwrap()
    }

    fn next_flash(response: &Response) -> Flash {
        let request = Request::builder().cookies_from(response).finish().unwrap();
        Flash::open(&settings(), &Key::derive_from(SECRET.as_bytes()), &request)
    }

    fn save(flash: Flash) -> Response {
        let mut response = Response::default();

        flash
            .save(&settings(), &Key::derive_from(SECRET.as_bytes()), &mut response)
            .unwrap();

        response
    }

    #[test]
    fn messages_survive_until_shown() {
        let mut flash = Flash::default();

        flash.push(FlashMessage::new("saved").with_category("success"));

        let response = save(flash);
        let mut flash = next_flash(&response);
        let messages = flash.take();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, "saved");
        assert_eq!(messages[0].category, "success");

        let response = save(flash);
        let cookie = response.cookies().get("m").unwrap();

        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }

    #[test]
    fn unread_messages_are_left_alone() {
        let mut flash = Flash::default();

        flash.push(FlashMessage::new("hello").with_extra("count", 2));

        let flash = next_flash(&save(flash));
        let response = save(flash);

        assert!(response.cookies().get("m").is_none());
    }

    #[test]
    fn unread_messages_are_kept_with_new_ones() {
        let mut flash = Flash::default();

        flash.push(FlashMessage::new("first"));

        let mut flash = next_flash(&save(flash));

        flash.push(FlashMessage::new("second"));

        let mut flash = next_flash(&save(flash));
        let messages: Vec<_> = flash.take().into_iter().map(|m| m.message).collect();

        assert_eq!(messages, ["first", "second"]);
    }

    #[test]
    fn messages_shown_in_the_same_request_are_not_stored() {
        let mut flash = Flash::default();

        flash.push(FlashMessage::new("inline"));
        assert_eq!(flash.take().len(), 1);

        let response = save(flash);
        assert!(response.cookies().iter().next().is_none());
    }
}
