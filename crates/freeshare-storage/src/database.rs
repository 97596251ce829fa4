//! Database connection and settings access

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, updated_at],
            )?;
            Ok(())
        })
    }

    /// Remove a setting. Returns whether a row was actually deleted.
    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let removed = conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
            Ok(removed > 0)
        })
    }

    /// Read a setting stored as JSON
    pub fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_setting(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_setting(key, &raw)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let count: i32 =
                conn.query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_settings_roundtrip_and_delete() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.get_setting("backend").unwrap(), None);

        db.set_setting("backend", "http://localhost:8080").unwrap();
        db.set_setting("backend", "https://share.example.com").unwrap();
        assert_eq!(
            db.get_setting("backend").unwrap().as_deref(),
            Some("https://share.example.com")
        );

        assert!(db.delete_setting("backend").unwrap());
        assert!(!db.delete_setting("backend").unwrap());
        assert_eq!(db.get_setting("backend").unwrap(), None);
    }

    #[test]
    fn test_corrupt_json_setting_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting("session", "{not json").unwrap();

        let result: Result<Option<Vec<String>>> = db.get_json("session");
        assert!(result.is_err());
    }
}
