//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] freeshare_storage::StorageError),

    #[error("Token cannot be empty")]
    EmptyToken,

    #[error("Email cannot be empty")]
    EmptyEmail,
}
