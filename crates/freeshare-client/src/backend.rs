//! The slice of the backend the share flow depends on

use async_trait::async_trait;

use crate::types::{DownloadCredentials, DownloadedFile, ShareMetadata};
use crate::Result;

/// Operations needed to resolve a share link, download it and clean up.
#[async_trait]
pub trait ShareBackend: Send + Sync {
    /// `GET /files/share/{link}`
    async fn fetch_share(&self, shared_link: &str) -> Result<ShareMetadata>;

    /// `GET /files/download/{link}` with only the credentials given
    async fn download(
        &self,
        shared_link: &str,
        credentials: &DownloadCredentials,
    ) -> Result<DownloadedFile>;

    /// `DELETE /files/delete/{id_or_link}`
    async fn delete_file(&self, id_or_link: &str) -> Result<()>;
}
