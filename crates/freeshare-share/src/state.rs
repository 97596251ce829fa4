//! Credential collection state
//!
//! ```text
//! AwaitingPassword
//!   ↓ password entered
//! AwaitingTwoFactor
//!   ↓ code entered
//! Ready
//! ```
//! Steps a link doesn't need are skipped. The step is always derived from
//! the credentials currently held, so `Ready` implies every credential the
//! metadata asks for is present.

use serde::{Deserialize, Serialize};

use freeshare_client::{DownloadCredentials, ShareMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStep {
    /// Cipher password still missing
    AwaitingPassword,
    /// One-time 2FA code still missing
    AwaitingTwoFactor,
    /// Everything required is present
    Ready,
}

impl AuthStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStep::AwaitingPassword => "awaiting_password",
            AuthStep::AwaitingTwoFactor => "awaiting_two_factor",
            AuthStep::Ready => "ready",
        }
    }

    /// 1-based position among the steps a link actually requires
    pub fn ordinal(&self, requires_password: bool) -> usize {
        match self {
            AuthStep::AwaitingPassword => 1,
            AuthStep::AwaitingTwoFactor if requires_password => 2,
            AuthStep::AwaitingTwoFactor => 1,
            AuthStep::Ready => 0,
        }
    }
}

impl std::fmt::Display for AuthStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AuthChallengeState {
    step: AuthStep,
    password: Option<String>,
    two_factor_code: Option<String>,
    /// Message of the last recoverable failure, shown until the user types
    last_error: Option<String>,
    requires_password: bool,
    requires_2fa: bool,
}

impl AuthChallengeState {
    pub fn for_metadata(metadata: &ShareMetadata) -> Self {
        let mut state = Self {
            step: AuthStep::Ready,
            password: None,
            two_factor_code: None,
            last_error: None,
            requires_password: metadata.requires_password_step(),
            requires_2fa: metadata.requires_2fa,
        };
        state.step = state.required_step();
        state
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn is_ready(&self) -> bool {
        self.step == AuthStep::Ready
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn two_factor_code(&self) -> Option<&str> {
        self.two_factor_code.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn requires_password(&self) -> bool {
        self.requires_password
    }

    pub fn requires_2fa(&self) -> bool {
        self.requires_2fa
    }

    /// Store the cipher password. Correctness is only known server-side.
    pub fn set_password(&mut self, password: impl Into<String>) -> AuthStep {
        let password = password.into();
        if !is_blank(&password) {
            self.last_error = None;
        }
        self.password = Some(password);
        self.refresh_step();
        self.step
    }

    /// Store the 2FA code. Never goes past `Ready`.
    pub fn set_two_factor_code(&mut self, code: impl Into<String>) -> AuthStep {
        let code = code.into();
        if !is_blank(&code) {
            self.last_error = None;
        }
        self.two_factor_code = Some(code);
        self.refresh_step();
        self.step
    }

    /// Credentials to attach to the download, limited to what the link
    /// requires and trimmed.
    pub fn credentials(&self) -> DownloadCredentials {
        DownloadCredentials {
            password: self
                .password
                .as_deref()
                .filter(|_| self.requires_password)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            two_factor_code: self
                .two_factor_code
                .as_deref()
                .filter(|_| self.requires_2fa)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        }
    }

    /// Server rejected the password: forget it, keep any 2FA code.
    pub(crate) fn rewind_password(&mut self, message: String) {
        self.password = None;
        self.last_error = Some(message);
        self.refresh_step();
    }

    /// Server rejected the 2FA code: forget it, keep the password.
    pub(crate) fn rewind_two_factor(&mut self, message: String) {
        self.two_factor_code = None;
        self.last_error = Some(message);
        self.refresh_step();
    }

    /// Record a failure without touching the credentials, used when the
    /// rejected value was already replaced.
    pub(crate) fn note_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    fn required_step(&self) -> AuthStep {
        if self.requires_password && self.password.as_deref().map_or(true, is_blank) {
            AuthStep::AwaitingPassword
        } else if self.requires_2fa && self.two_factor_code.as_deref().map_or(true, is_blank) {
            AuthStep::AwaitingTwoFactor
        } else {
            AuthStep::Ready
        }
    }

    fn refresh_step(&mut self) {
        let next = self.required_step();
        if next != self.step {
            tracing::debug!(from = %self.step, to = %next, "Auth step transition");
            self.step = next;
        }
    }
}

impl std::fmt::Debug for AuthChallengeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthChallengeState")
            .field("step", &self.step)
            .field("has_password", &self.password.is_some())
            .field("has_two_factor_code", &self.two_factor_code.is_some())
            .field("last_error", &self.last_error)
            .finish()
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
