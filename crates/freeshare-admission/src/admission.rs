//! Upload admission rules

use serde::{Deserialize, Serialize};

use crate::error::AdmissionError;
use crate::Result;

/// Extensions accepted for upload, compared against the lowercased name
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".xls", ".xlsx", ".doc", ".docx"];

const ANONYMOUS_MAX_BYTES: u64 = 100 * 1024;
const REGISTERED_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// Caller tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Anonymous,
    Registered,
}

impl Tier {
    pub fn from_registered(is_registered: bool) -> Self {
        if is_registered {
            Tier::Registered
        } else {
            Tier::Anonymous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Anonymous => "anonymous",
            Tier::Registered => "registered",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Limits that apply to a tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadConstraint {
    pub allowed_extensions: &'static [&'static str],
    pub max_bytes: u64,
}

impl UploadConstraint {
    pub fn for_tier(tier: Tier) -> Self {
        let max_bytes = match tier {
            Tier::Anonymous => ANONYMOUS_MAX_BYTES,
            Tier::Registered => REGISTERED_MAX_BYTES,
        };

        Self {
            allowed_extensions: ALLOWED_EXTENSIONS,
            max_bytes,
        }
    }

    pub fn allows_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.allowed_extensions.iter().any(|ext| name.ends_with(ext))
    }

    /// Human-readable ceiling ("100 KB", "2 MB")
    pub fn describe_limit(&self) -> String {
        format_limit(self.max_bytes)
    }
}

/// What admission needs to know about a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub size: u64,
}

impl<'a> Candidate<'a> {
    pub fn new(name: &'a str, size: u64) -> Self {
        Self { name, size }
    }
}

/// Decide whether `file` may be uploaded by a caller of the given tier.
///
/// The type check runs first, so an oversized file with a bad extension is
/// reported as `UnsupportedType`.
pub fn admit(file: Candidate<'_>, is_registered: bool) -> Result<()> {
    let tier = Tier::from_registered(is_registered);
    let constraint = UploadConstraint::for_tier(tier);

    if !constraint.allows_name(file.name) {
        tracing::debug!(file_name = %file.name, tier = %tier, "Rejected upload: unsupported type");
        return Err(AdmissionError::UnsupportedType);
    }

    if file.size > constraint.max_bytes {
        tracing::debug!(
            file_name = %file.name,
            size = file.size,
            limit = constraint.max_bytes,
            tier = %tier,
            "Rejected upload: too large"
        );
        return Err(AdmissionError::TooLarge {
            limit: constraint.max_bytes,
        });
    }

    Ok(())
}

pub(crate) fn format_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{} KB", bytes / 1024)
    }
}
