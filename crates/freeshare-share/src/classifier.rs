//! Failure classification for gated downloads
//!
//! A machine-readable `code` from the backend is authoritative. Without one
//! we fall back to the status code and, for 400/401/403, to matching
//! fragments of the human-readable message (English and Spanish).

use serde::{Deserialize, Serialize};

use freeshare_client::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Retry with a corrected password
    WrongPassword,
    /// Retry with a corrected 2FA code
    WrongTwoFactor,
    /// Link unknown or expired
    LinkGone,
    /// Permission failure unrelated to the credentials
    Unauthorized,
    Unknown,
}

impl Verdict {
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Verdict::WrongPassword | Verdict::WrongTwoFactor)
    }
}

// Checked before the password fragments: "Invalid 2FA code" must not read
// as a password problem just because it says "invalid".
const TWO_FACTOR_FRAGMENTS: &[&str] = &["2fa", "two factor", "two-factor", "dos factores"];
const PASSWORD_FRAGMENTS: &[&str] = &["password", "contraseña", "incorrect", "invalid"];

/// Classify a failed response from its status and message text
pub fn classify(status: u16, message: &str) -> Verdict {
    match status {
        404 => Verdict::LinkGone,
        400 | 401 | 403 => {
            let message = message.to_lowercase();
            if TWO_FACTOR_FRAGMENTS.iter().any(|f| message.contains(f)) {
                Verdict::WrongTwoFactor
            } else if PASSWORD_FRAGMENTS.iter().any(|f| message.contains(f)) {
                Verdict::WrongPassword
            } else {
                Verdict::Unauthorized
            }
        }
        _ => Verdict::Unknown,
    }
}

/// Look up a backend error code. Unknown codes yield `None`.
pub fn classify_code(code: &str) -> Option<Verdict> {
    match code.trim().to_ascii_uppercase().as_str() {
        "WRONG_PASSWORD" | "INVALID_PASSWORD" => Some(Verdict::WrongPassword),
        "WRONG_TWO_FACTOR" | "INVALID_2FA" => Some(Verdict::WrongTwoFactor),
        "LINK_NOT_FOUND" | "LINK_EXPIRED" => Some(Verdict::LinkGone),
        "UNAUTHORIZED" | "FORBIDDEN" => Some(Verdict::Unauthorized),
        _ => None,
    }
}

/// Classify any client error; transport failures are always `Unknown`
pub fn classify_error(error: &ApiError) -> Verdict {
    match error {
        ApiError::Status {
            status,
            message,
            code,
        } => code
            .as_deref()
            .and_then(classify_code)
            .unwrap_or_else(|| classify(*status, message.as_deref().unwrap_or(""))),
        _ => Verdict::Unknown,
    }
}
