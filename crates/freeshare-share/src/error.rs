//! Share error types

use thiserror::Error;

/// Failure to turn a share link into metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("The file does not exist or the link has expired")]
    NotFound,

    #[error("Share link cannot be empty")]
    EmptyLink,

    #[error("{0}")]
    Failed(String),
}

/// Misuse of a download authenticator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("A download is already in progress for this link")]
    AttemptInFlight,

    #[error("This share has already finished; resolve the link again")]
    Finished,

    #[error("This share view was closed")]
    Abandoned,
}
