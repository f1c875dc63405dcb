//! Single shared-login session gate.
//!
//! # Responsibility
//! - Check a username/password pair against the configured credentials.
//! - Carry the authenticated state explicitly instead of in process globals.
//!
//! # Invariants
//! - A `SessionContext` only exists after a successful login.
//! - `logout` is idempotent.

use log::{info, warn};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Gate consulted before any record operation is offered.
pub trait SessionGate {
    fn is_authenticated(&self) -> bool;
    fn logout(&mut self);
}

/// The one configured login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both values present after trimming.
    pub fn is_configured(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        constant_time_eq(self.username.trim().as_bytes(), username.trim().as_bytes())
            & constant_time_eq(self.password.as_bytes(), password.as_bytes())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How long the login should be kept by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPersistence {
    /// Until the process or window closes.
    Session,
    /// Remembered across restarts by the caller.
    Remembered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    InvalidCredentials,
    /// No username/password configured.
    NotConfigured,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::NotConfigured => write!(f, "login credentials are not configured"),
        }
    }
}

impl Error for SessionError {}

/// Authenticated session value passed to whoever needs the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    username: String,
    persistence: SessionPersistence,
    authenticated: bool,
}

impl SessionContext {
    /// Opens a session when `username`/`password` match `credentials`.
    pub fn login(
        credentials: &Credentials,
        username: &str,
        password: &str,
        persistence: SessionPersistence,
    ) -> Result<Self, SessionError> {
        if !credentials.is_configured() {
            warn!("event=session_login module=session status=error error_code=not_configured");
            return Err(SessionError::NotConfigured);
        }
        if !credentials.matches(username, password) {
            warn!("event=session_login module=session status=rejected error_code=invalid_credentials");
            return Err(SessionError::InvalidCredentials);
        }

        info!("event=session_login module=session status=ok persistence={persistence:?}");
        Ok(Self {
            username: username.trim().to_string(),
            persistence,
            authenticated: true,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn persistence(&self) -> SessionPersistence {
        self.persistence
    }
}

impl SessionGate for SessionContext {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn logout(&mut self) {
        if self.authenticated {
            info!("event=session_logout module=session status=ok");
        }
        self.authenticated = false;
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::{
        constant_time_eq, Credentials, SessionContext, SessionError, SessionGate,
        SessionPersistence,
    };

    #[test]
    fn login_with_matching_credentials_opens_session() {
        let credentials = Credentials::new("admin", "secret");
        let mut session = SessionContext::login(
            &credentials,
            " admin ",
            "secret",
            SessionPersistence::Remembered,
        )
        .unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.username(), "admin");
        assert_eq!(session.persistence(), SessionPersistence::Remembered);

        session.logout();
        session.logout();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn login_rejects_wrong_password_and_missing_configuration() {
        let credentials = Credentials::new("admin", "secret");
        assert_eq!(
            SessionContext::login(&credentials, "admin", "Secret", SessionPersistence::Session)
                .unwrap_err(),
            SessionError::InvalidCredentials
        );

        let empty = Credentials::new("", "");
        assert_eq!(
            SessionContext::login(&empty, "", "", SessionPersistence::Session).unwrap_err(),
            SessionError::NotConfigured
        );
    }

    #[test]
    fn debug_output_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn constant_time_eq_compares_whole_input() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
