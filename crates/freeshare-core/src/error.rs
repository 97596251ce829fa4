//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] freeshare_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] freeshare_session::SessionError),

    #[error("{0}")]
    Admission(#[from] freeshare_admission::AdmissionError),

    #[error("{0}")]
    Api(#[from] freeshare_client::ApiError),

    #[error("{0}")]
    Resolve(#[from] freeshare_share::ResolveError),

    #[error("{0}")]
    Share(#[from] freeshare_share::ShareError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),
}
