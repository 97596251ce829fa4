//! FreeShare Storage Layer
//!
//! SQLite-backed key/value persistence for client-side state that has to
//! survive restarts (the signed-in session, mostly).

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
