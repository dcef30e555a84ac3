//! Client-side view of the device session.

use std::fmt;

/// Name of the one-time cookie the landing page hands out.
pub const PRESESSION_COOKIE: &str = "preSession";

/// Body the login form returns on success. Anything else is an error message.
pub const LOGIN_SUCCESS: &[u8] = b"success";

/// Session state as the client assumes it.
///
/// The device never reports this directly; it is updated by `login`,
/// `get_data` and `logout` from what the device answered.
///
/// ```text
/// LoggedOut -> AwaitingPreSession -> LoggingIn -> LoggedIn
///     ^                |                 |            |
///     +----------------+-----------------+------------+  (failure, 302, logout)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    LoggedOut,
    /// `GET /` sent, waiting for the preSession cookie.
    AwaitingPreSession,
    /// Login form posted.
    LoggingIn,
    LoggedIn,
}

impl SessionState {
    pub fn is_logged_in(self) -> bool {
        self == SessionState::LoggedIn
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::LoggedOut => "logged out",
            SessionState::AwaitingPreSession => "awaiting preSession",
            SessionState::LoggingIn => "logging in",
            SessionState::LoggedIn => "logged in",
        };
        f.write_str(s)
    }
}
