//! Admission error types

use thiserror::Error;

use crate::admission::format_limit;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Unsupported file type: only PDF, XLS, XLSX, DOC and DOCX files are allowed")]
    UnsupportedType,

    #[error("File exceeds the {} limit", format_limit(*limit))]
    TooLarge { limit: u64 },
}
