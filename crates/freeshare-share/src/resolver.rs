//! Share link resolution

use std::sync::Arc;

use freeshare_client::{ShareBackend, ShareMetadata};

use crate::error::ResolveError;

const GENERIC_FAILURE: &str = "Failed to fetch file details.";

/// Turns a share link into its public metadata.
///
/// Nothing is cached: expiration and protection flags can change between
/// visits, so every view resolves again.
pub struct ShareLinkResolver {
    backend: Arc<dyn ShareBackend>,
}

impl ShareLinkResolver {
    pub fn new(backend: Arc<dyn ShareBackend>) -> Self {
        Self { backend }
    }

    pub async fn resolve(&self, shared_link: &str) -> Result<ShareMetadata, ResolveError> {
        let shared_link = shared_link.trim();
        if shared_link.is_empty() {
            return Err(ResolveError::EmptyLink);
        }

        match self.backend.fetch_share(shared_link).await {
            Ok(mut metadata) => {
                if metadata.shared_link.is_empty() {
                    metadata.shared_link = shared_link.to_string();
                }

                tracing::info!(
                    shared_link = %shared_link,
                    requires_password = metadata.requires_password_step(),
                    requires_2fa = metadata.requires_2fa,
                    "Resolved share link"
                );

                Ok(metadata)
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(shared_link = %shared_link, "Share link not found");
                Err(ResolveError::NotFound)
            }
            Err(e) => {
                tracing::warn!(
                    shared_link = %shared_link,
                    error = %e,
                    "Failed to resolve share link"
                );
                let message = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                Err(ResolveError::Failed(message))
            }
        }
    }
}

impl Clone for ShareLinkResolver {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}
