//! Download attempt results

use serde::{Deserialize, Serialize};

use crate::state::AuthStep;

/// Why a share can no longer be downloaded from this view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalKind {
    /// Link unknown or expired
    LinkGone,
    /// Permission failure that re-entering credentials won't fix
    Unauthorized,
    /// Network failure or unexpected server fault
    Unknown,
}

impl FatalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FatalKind::LinkGone => "link_gone",
            FatalKind::Unauthorized => "unauthorized",
            FatalKind::Unknown => "unknown",
        }
    }

    /// Message shown when the server didn't supply one
    pub fn default_message(&self) -> &'static str {
        match self {
            FatalKind::LinkGone => "The file does not exist or the link has expired.",
            FatalKind::Unauthorized => "You do not have permission to download this file.",
            FatalKind::Unknown => "An unexpected error occurred while downloading the file.",
        }
    }
}

impl std::fmt::Display for FatalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File released; `filename` prefers the server-supplied name
    Success { bytes: Vec<u8>, filename: String },
    /// A credential is missing or was rejected; prompt for this step
    NeedsStep(AuthStep),
    /// Terminal failure for this view
    Fatal { kind: FatalKind, message: String },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }
}

impl std::fmt::Debug for DownloadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadOutcome::Success { bytes, filename } => f
                .debug_struct("Success")
                .field("size", &bytes.len())
                .field("filename", filename)
                .finish(),
            DownloadOutcome::NeedsStep(step) => f.debug_tuple("NeedsStep").field(step).finish(),
            DownloadOutcome::Fatal { kind, message } => f
                .debug_struct("Fatal")
                .field("kind", kind)
                .field("message", message)
                .finish(),
        }
    }
}
