//! FreeShare Session Management
//!
//! The signed-in identity is an explicit value handed to every component that
//! talks to the backend, never read ad hoc from storage:
//! - `SessionContext` is the immutable snapshot (bearer token + email)
//! - `SessionStore` persists it between runs
//! - Only the store mutates persisted state; everything else reads snapshots

mod context;
mod error;
mod store;

pub use context::{SessionContext, GUEST_EMAIL};
pub use error::SessionError;
pub use store::SessionStore;

pub type Result<T> = std::result::Result<T, SessionError>;
