//! Cleanup of guest uploads after their first download

use std::sync::Arc;

use tokio::task::JoinHandle;

use freeshare_client::{ShareBackend, ShareMetadata};

/// Deletes guest-owned files once they have been downloaded.
///
/// Ownership is read from the metadata, never from the local session: the
/// person downloading is usually not the person who uploaded.
pub struct GuestLifecycleManager {
    backend: Arc<dyn ShareBackend>,
}

impl GuestLifecycleManager {
    pub fn new(backend: Arc<dyn ShareBackend>) -> Self {
        Self { backend }
    }

    pub fn should_delete(metadata: &ShareMetadata) -> bool {
        metadata.is_guest_owned()
    }

    /// Fire-and-forget deletion of a guest file.
    ///
    /// Returns the detached task, or `None` when nothing was scheduled.
    /// Failures are logged and otherwise dropped.
    pub fn after_successful_download(&self, metadata: &ShareMetadata) -> Option<JoinHandle<()>> {
        if !Self::should_delete(metadata) {
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(
                    shared_link = %metadata.shared_link,
                    "No async runtime; skipping guest file cleanup"
                );
                return None;
            }
        };

        let backend = Arc::clone(&self.backend);
        let shared_link = metadata.shared_link.clone();

        Some(runtime.spawn(async move {
            match backend.delete_file(&shared_link).await {
                Ok(()) => {
                    tracing::info!(shared_link = %shared_link, "Deleted guest file after download");
                }
                Err(e) => {
                    tracing::warn!(
                        shared_link = %shared_link,
                        error = %e,
                        "Guest file cleanup failed"
                    );
                }
            }
        }))
    }
}

impl Clone for GuestLifecycleManager {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}
