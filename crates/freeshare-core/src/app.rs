//! Application state container
//!
//! Owns the database, the persisted session and the HTTP client. Every
//! backend call goes through a client bound to the current session.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use freeshare_admission::{admit, Candidate};
use freeshare_client::{share_url, ApiClient, ApiError, FileRecord, UploadRequest, UploadResponse};
use freeshare_session::{SessionContext, SessionStore};
use freeshare_share::{DownloadAuthenticator, ShareLinkResolver};
use freeshare_storage::Database;

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

/// Protection chosen by the uploader
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub encrypt: bool,
    /// Required when `encrypt` is set
    pub password: Option<String>,
    pub requires_2fa: bool,
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("encrypt", &self.encrypt)
            .field("has_password", &self.password.is_some())
            .field("requires_2fa", &self.requires_2fa)
            .finish()
    }
}

/// A download written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFile {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

pub struct FreeShare {
    config: Config,
    sessions: SessionStore,
    client: Arc<RwLock<ApiClient>>,
}

impl FreeShare {
    pub fn new(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db)
    }

    pub fn with_database(config: Config, db: Database) -> Result<Self> {
        let sessions = SessionStore::new(db);
        let session = sessions.load()?;

        let client = ApiClient::new(&config.backend_url, session.clone()).map_err(|e| match e {
            ApiError::InvalidUrl(reason) => CoreError::Config(format!(
                "invalid backend URL {:?}: {}",
                config.backend_url, reason
            )),
            other => CoreError::Api(other),
        })?;

        tracing::info!(
            backend = %client.base_url(),
            registered = session.is_registered(),
            "FreeShare initialized"
        );

        Ok(Self {
            config,
            sessions,
            client: Arc::new(RwLock::new(client)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the current identity
    pub fn session(&self) -> SessionContext {
        self.client.read().session().clone()
    }

    /// Client bound to the current session
    pub fn client(&self) -> ApiClient {
        self.client.read().clone()
    }

    fn bind_session(&self, session: SessionContext) {
        let mut client = self.client.write();
        *client = client.with_session(session);
    }

    // === Account ===

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionContext> {
        let (email, password) = validate_account(email, password)?;
        let response = self.client().login(email, password).await?;
        self.establish(response.jwt_token, response.email)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<SessionContext> {
        let (email, password) = validate_account(email, password)?;
        let response = self.client().register(email, password).await?;
        self.establish(response.jwt_token, response.email)
    }

    fn establish(&self, token: String, email: String) -> Result<SessionContext> {
        let session = self.sessions.save(token, email)?;
        self.bind_session(session.clone());
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        self.sessions.clear()?;
        self.bind_session(SessionContext::anonymous());
        Ok(())
    }

    // === Owner operations ===

    /// Admit and upload a local file
    pub async fn upload(&self, path: &Path, options: UploadOptions) -> Result<UploadResponse> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CoreError::Validation(format!("not a file: {}", path.display())))?
            .to_string();

        let size = tokio::fs::metadata(path).await?.len();
        let session = self.session();
        admit(Candidate::new(&file_name, size), session.is_registered())?;

        let password = if options.encrypt {
            match options.password.filter(|p| !p.trim().is_empty()) {
                Some(password) => Some(password),
                None => {
                    return Err(CoreError::Validation(
                        "A password is required to encrypt the file".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        let bytes = tokio::fs::read(path).await?;

        // The file may have grown since it was admitted
        admit(Candidate::new(&file_name, bytes.len() as u64), session.is_registered())?;

        let response = self
            .client()
            .upload(UploadRequest {
                file_name,
                bytes,
                encrypt: options.encrypt,
                password,
                requires_2fa: options.requires_2fa,
            })
            .await?;

        Ok(response)
    }

    pub async fn my_files(&self) -> Result<Vec<FileRecord>> {
        Ok(self.client().my_files().await?)
    }

    /// Owner-initiated delete by file id
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        use freeshare_client::ShareBackend;

        let file_id = file_id.trim();
        if file_id.is_empty() {
            return Err(CoreError::Validation("File id cannot be empty".to_string()));
        }
        Ok(self.client().delete_file(file_id).await?)
    }

    /// Public page for a share link
    pub fn share_url(&self, shared_link: &str) -> String {
        share_url(&self.config.share_origin, shared_link)
    }

    // === Share links ===

    pub fn resolver(&self) -> ShareLinkResolver {
        ShareLinkResolver::new(Arc::new(self.client()))
    }

    /// Resolve a link and start a download view for it
    pub async fn open_share(&self, shared_link: &str) -> Result<DownloadAuthenticator> {
        let backend = Arc::new(self.client());
        let metadata = ShareLinkResolver::new(backend.clone())
            .resolve(shared_link)
            .await?;
        Ok(DownloadAuthenticator::new(metadata, backend))
    }

    /// Write a downloaded file into the download directory without
    /// overwriting anything already there
    pub async fn save_download(&self, filename: &str, bytes: &[u8]) -> Result<SavedFile> {
        tokio::fs::create_dir_all(&self.config.download_dir).await?;

        let path = unique_path(&self.config.download_dir, &sanitize_file_name(filename));
        tokio::fs::write(&path, bytes).await?;

        let saved = SavedFile {
            size: bytes.len() as u64,
            sha256: sha256_hex(bytes),
            path,
        };

        tracing::info!(
            path = %saved.path.display(),
            size = saved.size,
            sha256 = %saved.sha256,
            "Saved download"
        );

        Ok(saved)
    }
}

impl Clone for FreeShare {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            sessions: self.sessions.clone(),
            client: Arc::clone(&self.client),
        }
    }
}

fn validate_account<'a>(email: &'a str, password: &'a str) -> Result<(&'a str, &'a str)> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(CoreError::Validation("A valid email is required".to_string()));
    }
    if password.is_empty() {
        return Err(CoreError::Validation("Password cannot be empty".to_string()));
    }
    Ok((email, password))
}

fn sanitize_file_name(file_name: &str) -> String {
    let name = Path::new(file_name.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("download")
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        "download".to_string()
    } else {
        name.to_string()
    }
}

fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let extension = path.extension().and_then(|e| e.to_str());

    (1..)
        .map(|n| match extension {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
