//! Session persistence
//!
//! The session is written as a single JSON setting so token and email can
//! never be observed half-updated.

use freeshare_storage::Database;

use crate::context::SessionContext;
use crate::error::SessionError;
use crate::Result;

const SESSION_KEY: &str = "session";

pub struct SessionStore {
    db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Load the persisted session, falling back to anonymous
    pub fn load(&self) -> Result<SessionContext> {
        let session: Option<SessionContext> = self.db.get_json(SESSION_KEY)?;
        Ok(session.unwrap_or_else(SessionContext::anonymous))
    }

    /// Persist a freshly issued token for `email`
    pub fn save(&self, token: String, email: String) -> Result<SessionContext> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        if email.trim().is_empty() {
            return Err(SessionError::EmptyEmail);
        }

        let session = SessionContext::registered(token, email);
        self.db.set_json(SESSION_KEY, &session)?;

        tracing::info!(email = ?session.email(), "Saved session");

        Ok(session)
    }

    /// Drop the persisted session (logout)
    pub fn clear(&self) -> Result<()> {
        if self.db.delete_setting(SESSION_KEY)? {
            tracing::info!("Cleared session");
        }
        Ok(())
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_store() {
        let db = Database::open_in_memory().unwrap();
        let store = SessionStore::new(db);

        // Nothing persisted yet
        assert!(!store.load().unwrap().is_registered());

        // Login
        let saved = store
            .save("jwt-1".to_string(), "ana@example.com".to_string())
            .unwrap();
        assert!(saved.is_registered());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.token(), Some("jwt-1"));

        // Logout
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), SessionContext::anonymous());

        // Clearing twice is harmless
        store.clear().unwrap();
    }

    #[test]
    fn test_save_rejects_blank_values() {
        let store = SessionStore::new(Database::open_in_memory().unwrap());

        assert!(matches!(
            store.save(" ".to_string(), "ana@example.com".to_string()),
            Err(SessionError::EmptyToken)
        ));
        assert!(matches!(
            store.save("jwt".to_string(), String::new()),
            Err(SessionError::EmptyEmail)
        ));
        assert!(!store.load().unwrap().is_registered());
    }
}
