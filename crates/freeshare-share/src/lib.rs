//! FreeShare Share Links
//!
//! Everything that happens between receiving a share link and holding the
//! file:
//! ```text
//! resolve(link) ──404──> NotFound
//!     │
//! AwaitingPassword ──> AwaitingTwoFactor ──> Ready ──> Success | Fatal
//!     ^                       ^                 │
//!     └── wrong password ─────┴── wrong 2FA ────┘
//! ```
//! A successful download of a guest-owned file triggers a best-effort
//! deletion of that file on the backend.

mod authenticator;
mod classifier;
mod error;
mod guest;
mod outcome;
mod resolver;
mod state;

#[cfg(test)]
mod testing;

pub use authenticator::DownloadAuthenticator;
pub use classifier::{classify, classify_code, classify_error, Verdict};
pub use error::{ResolveError, ShareError};
pub use guest::GuestLifecycleManager;
pub use outcome::{DownloadOutcome, FatalKind};
pub use resolver::ShareLinkResolver;
pub use state::{AuthChallengeState, AuthStep};

pub type Result<T> = std::result::Result<T, ShareError>;
