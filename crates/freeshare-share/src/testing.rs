//! Scripted backend for share flow tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use freeshare_client::{ApiError, DownloadCredentials, DownloadedFile, ShareBackend, ShareMetadata};

type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn metadata(requires_password: bool, encrypted: bool, requires_2fa: bool) -> ShareMetadata {
    ShareMetadata {
        filename: "report.pdf".to_string(),
        size: Some(51_200),
        content_type: Some("application/pdf".to_string()),
        shared_link: "abc123".to_string(),
        expiration_date: None,
        requires_password,
        encrypted,
        requires_2fa,
        owner_email: None,
    }
}

pub fn downloaded(bytes: &[u8], filename: Option<&str>) -> DownloadedFile {
    DownloadedFile {
        bytes: bytes.to_vec(),
        filename: filename.map(str::to_string),
        content_type: None,
    }
}

pub fn status_error(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: Some(message.to_string()),
        code: None,
    }
}

#[derive(Default)]
struct Script {
    shares: VecDeque<ApiResult<ShareMetadata>>,
    downloads: VecDeque<ApiResult<DownloadedFile>>,
    fetch_calls: Vec<String>,
    download_calls: Vec<(String, DownloadCredentials)>,
    delete_error: Option<ApiError>,
    delete_delay: Option<Duration>,
    completed_deletes: usize,
    download_gate: Option<Arc<Notify>>,
}

/// Replays queued responses in order and records every call
pub struct ScriptedBackend {
    script: Mutex<Script>,
    deletes: mpsc::UnboundedSender<String>,
}

impl ScriptedBackend {
    /// The receiver yields the link of every delete request
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Arc::new(Self {
            script: Mutex::new(Script::default()),
            deletes: tx,
        });
        (backend, rx)
    }

    pub fn push_share(&self, response: ApiResult<ShareMetadata>) {
        self.script.lock().shares.push_back(response);
    }

    pub fn push_download(&self, response: ApiResult<DownloadedFile>) {
        self.script.lock().downloads.push_back(response);
    }

    pub fn fail_deletes(&self, error: ApiError) {
        self.script.lock().delete_error = Some(error);
    }

    /// Deletes take this long before they complete
    pub fn delay_deletes(&self, delay: Duration) {
        self.script.lock().delete_delay = Some(delay);
    }

    /// Deletes that ran to completion, successful or not
    pub fn completed_deletes(&self) -> usize {
        self.script.lock().completed_deletes
    }

    /// Downloads block until the returned gate is notified
    pub fn gate_downloads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script.lock().download_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn fetch_calls(&self) -> Vec<String> {
        self.script.lock().fetch_calls.clone()
    }

    pub fn download_calls(&self) -> Vec<(String, DownloadCredentials)> {
        self.script.lock().download_calls.clone()
    }
}

#[async_trait]
impl ShareBackend for ScriptedBackend {
    async fn fetch_share(&self, shared_link: &str) -> ApiResult<ShareMetadata> {
        let mut script = self.script.lock();
        script.fetch_calls.push(shared_link.to_string());
        script
            .shares
            .pop_front()
            .unwrap_or_else(|| Err(status_error(404, "File not found")))
    }

    async fn download(
        &self,
        shared_link: &str,
        credentials: &DownloadCredentials,
    ) -> ApiResult<DownloadedFile> {
        let gate = {
            let mut script = self.script.lock();
            script
                .download_calls
                .push((shared_link.to_string(), credentials.clone()));
            script.download_gate.clone()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.script
            .lock()
            .downloads
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted download".to_string())))
    }

    async fn delete_file(&self, id_or_link: &str) -> ApiResult<()> {
        let delay = self.script.lock().delete_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let _ = self.deletes.send(id_or_link.to_string());

        let mut script = self.script.lock();
        script.completed_deletes += 1;
        match script.delete_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
