use cookie::{Cookie, CookieBuilder, Key};
use time::{Duration, OffsetDateTime};

use super::session::Payload;
use super::{Session, SessionError, SessionInterface, decode, encode};
use crate::config::Settings;
use crate::request::Request;
use crate::response::Response;

/// Stores the session in a signed cookie named `session_cookie_name`.
///
/// The payload is readable by the client but cannot be changed without the
/// signature failing, in which case the request starts with an empty
/// session.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct SecureCookieSessionInterface;

impl SessionInterface for SecureCookieSessionInterface {
    fn open_session(
        &self,
        settings: &Settings,
        key: &Key,
        request: &Request,
    ) -> Result<Session, SessionError> {
        let name = settings.session_cookie_name.as_str();
        let cookies = request.cookies();

        let Some(cookie) = cookies.signed(key).get(name) else {
            if cookies.get(name).is_some() {
                tracing::warn!(cookie = name, "discarding session cookie with an invalid signature");
            }

            return Ok(Session::new());
        };

        match decode::<Payload>(cookie.value()) {
            Ok(payload) => Ok(Session::from_payload(payload)),
            Err(error) => {
                tracing::warn!(cookie = name, "discarding undecodable session cookie: {}", error);
                Ok(Session::new())
            }
        }
    }

    fn save_session(
        &self,
        settings: &Settings,
        key: &Key,
        session: &Session,
        response: &mut Response,
    ) -> Result<(), SessionError> {
        if self.is_null_session(session) {
            return Ok(());
        }

        let name = settings.session_cookie_name.clone();

        if session.is_empty() {
            if session.is_modified() {
                response.cookies_mut().add(removal_cookie(settings, name));
            }

            return Ok(());
        }

        let mut cookie = build_cookie(settings, name, encode(&session.to_payload())?);

        if session.is_permanent() {
            let lifetime = Duration::seconds(
                i64::try_from(settings.permanent_session_lifetime).unwrap_or(i64::MAX),
            );

            cookie = cookie.expires(OffsetDateTime::now_utc().saturating_add(lifetime));
        }

        response.cookies_mut().signed_mut(key).add(cookie.build());
        Ok(())
    }
}

/// Returns a cookie builder with the path, domain, and security attributes
/// from `settings`.
///
pub(crate) fn build_cookie(
    settings: &Settings,
    name: String,
    value: String,
) -> CookieBuilder<'static> {
    let mut cookie = Cookie::build((name, value))
        .path(settings.cookie_path().to_owned())
        .http_only(settings.session_cookie_httponly)
        .secure(settings.session_cookie_secure);

    if let Some(domain) = &settings.session_cookie_domain {
        cookie = cookie.domain(domain.clone());
    }

    cookie
}

/// Returns a cookie that tells the client to delete the cookie `name`.
///
pub(crate) fn removal_cookie(settings: &Settings, name: String) -> Cookie<'static> {
    let mut cookie = build_cookie(settings, name, String::new()).build();

    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use cookie::Key;
    use time::Duration;

    use super::SecureCookieSessionInterface;
    use crate::config::{Layers, Settings};
    use crate::request::Request;
    use crate::response::Response;
    use crate::session::{Session, SessionInterface};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn settings() -> Settings {
        let mut layers = Layers::default();

        layers.set_override("secret_key", SECRET);
        layers.load().unwrap()
    }

    fn key() -> Key {
        Key::derive_from(SECRET.as_bytes())
    }

    fn replay(response: &Response) -> Request {
        Request::builder().cookies_from(response).finish().unwrap()
    }

    #[test]
    fn roundtrips_through_a_signed_cookie() {
        let sessions = SecureCookieSessionInterface;
        let settings = settings();
        let mut session = Session::new();
        let mut response = Response::default();

        session.insert("user", "ada");
        sessions
            .save_session(&settings, &key(), &session, &mut response)
            .unwrap();

        let cookie = response.cookies().get("s").unwrap();

        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert!(cookie.expires().is_none());

        let restored = sessions
            .open_session(&settings, &key(), &replay(&response))
            .unwrap();

        assert_eq!(restored.get_as::<String>("user").as_deref(), Some("ada"));
    }

    #[test]
    fn tampered_cookies_start_a_fresh_session() {
        let sessions = SecureCookieSessionInterface;
        let request = Request::builder()
            .cookie("s", "forged-value")
            .finish()
            .unwrap();

        let session = sessions
            .open_session(&settings(), &key(), &request)
            .unwrap();

        assert!(session.is_empty());
        assert!(!session.is_null());
    }

    #[test]
    fn cookies_signed_with_another_key_are_rejected() {
        let sessions = SecureCookieSessionInterface;
        let settings = settings();
        let other = Key::derive_from(b"another secret that is long enough!!");
        let mut session = Session::new();
        let mut response = Response::default();

        session.insert("admin", true);
        sessions
            .save_session(&settings, &other, &session, &mut response)
            .unwrap();

        let restored = sessions
            .open_session(&settings, &key(), &replay(&response))
            .unwrap();

        assert!(restored.is_empty());
    }

    #[test]
    fn permanent_sessions_expire() {
        let sessions = SecureCookieSessionInterface;
        let mut session = Session::new();
        let mut response = Response::default();

        session.insert("user", "ada");
        session.set_permanent(true);
        sessions
            .save_session(&settings(), &key(), &session, &mut response)
            .unwrap();

        let cookie = response.cookies().get("s").unwrap();
        let expires = cookie.expires_datetime().unwrap();
        let lifetime = expires - time::OffsetDateTime::now_utc();

        assert!(lifetime > Duration::days(30) && lifetime <= Duration::days(31));
    }

    #[test]
    fn emptied_sessions_are_removed() {
        let sessions = SecureCookieSessionInterface;
        let mut session = Session::new();
        let mut response = Response::default();

        session.insert("user", "ada");
        session.clear();
        sessions
            .save_session(&settings(), &key(), &session, &mut response)
            .unwrap();

        let cookie = response.cookies().get("s").unwrap();
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));

        let mut response = Response::default();
        sessions
            .save_session(&settings(), &key(), &Session::new(), &mut response)
            .unwrap();

        assert!(response.cookies().get("s").is_none());

        let mut response = Response::default();
        let mut null = Session::null();

        null.insert("ignored", 1);
        sessions
            .save_session(&settings(), &key(), &null, &mut response)
            .unwrap();

        assert!(response.cookies().iter().next().is_none());
    }
}
