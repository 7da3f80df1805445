//! Sessions stored in signed cookies.
//!
//! The session is loaded from the session cookie when a handler is invoked
//! and written back when the handler's response is finished. Storage is
//! pluggable through [`SessionInterface`]; the default,
//! [`SecureCookieSessionInterface`], keeps the whole session in a cookie
//! signed with a key derived from `secret_key`.
//!

mod codec;
mod cookie;
mod session;

pub use self::cookie::SecureCookieSessionInterface;
pub use session::Session;

pub(crate) use self::cookie::{build_cookie, removal_cookie};
pub(crate) use codec::{decode, encode};

use ::cookie::Key;

use crate::config::Settings;
use crate::request::Request;
use crate::response::Response;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid cookie encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid cookie payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads and stores sessions.
///
pub trait SessionInterface: Send + Sync + 'static {
    /// Loads the session of `request`.
    ///
    fn open_session(
        &self,
        settings: &Settings,
        key: &Key,
        request: &Request,
    ) -> Result<Session, SessionError>;

    /// Writes `session` to `response`.
    ///
    fn save_session(
        &self,
        settings: &Settings,
        key: &Key,
        session: &Session,
        response: &mut Response,
    ) -> Result<(), SessionError>;

    /// Returns a session that is never saved. Used when a session could not
    /// be opened.
    ///
    fn make_null_session(&self) -> Session {
        Session::null()
    }

    fn is_null_session(&self, session: &Session) -> bool {
        session.is_null()
    }
}
