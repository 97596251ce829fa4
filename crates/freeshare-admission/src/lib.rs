//! FreeShare Upload Admission
//!
//! One pure check decides whether a candidate file may be uploaded:
//! - Extension allow-list (documents only) for every tier
//! - Size ceiling of 100 KiB for anonymous callers, 2 MiB for registered ones
//! - Drag-and-drop, file pickers and the CLI all go through `admit`

mod admission;
mod error;

pub use admission::{admit, Candidate, Tier, UploadConstraint, ALLOWED_EXTENSIONS};
pub use error::AdmissionError;

pub type Result<T> = std::result::Result<T, AdmissionError>;
