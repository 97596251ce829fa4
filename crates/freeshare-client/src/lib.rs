//! FreeShare REST Client
//!
//! Typed access to the sharing backend:
//! - `POST /files/upload`, `GET /files/my-files`, `DELETE /files/delete/{id}`
//! - `GET /files/share/{link}` (public metadata)
//! - `GET /files/download/{link}` (gated download)
//! - `POST /auth/login`, `POST /auth/register`
//!
//! The share flow only needs the `ShareBackend` subset, so it can be driven by
//! something other than HTTP.

mod backend;
mod client;
mod disposition;
mod error;
mod types;

pub use backend::ShareBackend;
pub use client::ApiClient;
pub use disposition::filename_from_disposition;
pub use error::{ApiError, ErrorBody};
pub use types::{
    share_url, AuthResponse, DownloadCredentials, DownloadedFile, FileRecord, ShareMetadata,
    UploadRequest, UploadResponse,
};

pub type Result<T> = std::result::Result<T, ApiError>;
