//! Session context

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner email the backend records for files uploaded without an account
pub const GUEST_EMAIL: &str = "guest";

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Bearer token, present only for registered users
    token: Option<String>,
    /// Email of the signed-in user
    email: Option<String>,
    /// When the session was established
    signed_in_at: Option<DateTime<Utc>>,
}

impl SessionContext {
    /// A session with no identity attached
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn registered(token: String, email: String) -> Self {
        Self {
            token: Some(token),
            email: Some(email),
            signed_in_at: Some(Utc::now()),
        }
    }

    /// A registered caller is one holding a bearer token
    pub fn is_registered(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.signed_in_at
    }

    /// Value for the `Authorization` header, if any
    pub fn bearer(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {}", t))
    }
}

// Keep the token out of logs and panics.
impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .field("signed_in_at", &self.signed_in_at)
            .finish()
    }
}
