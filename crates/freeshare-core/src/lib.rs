//! FreeShare Core
//!
//! Central coordination layer for the FreeShare client.
//! - `FreeShare` owns the database, the persisted session and the HTTP client
//! - Uploads are admitted locally before any bytes leave the machine
//! - Share links are opened into a `DownloadAuthenticator` per view

mod app;
mod config;
mod error;

pub use app::{FreeShare, SavedFile, UploadOptions};
pub use config::{Config, DEFAULT_BACKEND_URL, DEFAULT_SHARE_ORIGIN};
pub use error::CoreError;

// Re-export core components
pub use freeshare_admission::{admit, AdmissionError, Candidate, Tier, UploadConstraint};
pub use freeshare_client::{
    share_url, ApiClient, ApiError, FileRecord, ShareBackend, ShareMetadata, UploadResponse,
};
pub use freeshare_session::{SessionContext, SessionError, SessionStore};
pub use freeshare_share::{
    AuthChallengeState, AuthStep, DownloadAuthenticator, DownloadOutcome, FatalKind,
    GuestLifecycleManager, ResolveError, ShareError, ShareLinkResolver,
};
pub use freeshare_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging with `default_level` unless `RUST_LOG` is set
pub fn init_logging(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(true).init();
}
