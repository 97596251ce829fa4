//! Gated download driver
//!
//! Collects the credentials a share needs, issues the download once they
//! are all present, and maps failures to the next step or a terminal error.
//! Retries are always user-initiated.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use freeshare_client::{ApiError, DownloadCredentials, DownloadedFile, ShareBackend, ShareMetadata};

use crate::classifier::{classify_error, Verdict};
use crate::error::ShareError;
use crate::guest::GuestLifecycleManager;
use crate::outcome::{DownloadOutcome, FatalKind};
use crate::state::{AuthChallengeState, AuthStep};
use crate::Result;

const WRONG_PASSWORD_MESSAGE: &str = "The password is incorrect. Try again.";
const WRONG_TWO_FACTOR_MESSAGE: &str = "The 2FA code is not valid. Try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Succeeded,
    Failed(FatalKind),
}

struct ViewState {
    challenge: AuthChallengeState,
    finished: Option<Finish>,
}

struct Inner {
    /// Correlates log lines of one view
    view_id: Uuid,
    metadata: ShareMetadata,
    backend: Arc<dyn ShareBackend>,
    guest: GuestLifecycleManager,
    state: Mutex<ViewState>,
    /// Guest deletion started by the successful download, if any
    cleanup: Mutex<Option<JoinHandle<()>>>,
    in_flight: AtomicBool,
    abandoned: AtomicBool,
}

/// One resolved share link being unlocked by one viewer.
///
/// Cloning yields another handle to the same view.
pub struct DownloadAuthenticator {
    inner: Arc<Inner>,
}

impl DownloadAuthenticator {
    pub fn new(metadata: ShareMetadata, backend: Arc<dyn ShareBackend>) -> Self {
        let challenge = AuthChallengeState::for_metadata(&metadata);
        let view_id = Uuid::new_v4();

        tracing::debug!(
            view_id = %view_id,
            shared_link = %metadata.shared_link,
            step = %challenge.step(),
            "Opened share view"
        );

        Self {
            inner: Arc::new(Inner {
                view_id,
                guest: GuestLifecycleManager::new(Arc::clone(&backend)),
                backend,
                metadata,
                state: Mutex::new(ViewState {
                    challenge,
                    finished: None,
                }),
                cleanup: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                abandoned: AtomicBool::new(false),
            }),
        }
    }

    pub fn metadata(&self) -> &ShareMetadata {
        &self.inner.metadata
    }

    pub fn view_id(&self) -> Uuid {
        self.inner.view_id
    }

    pub fn step(&self) -> AuthStep {
        self.inner.state.lock().challenge.step()
    }

    /// Snapshot of the credential state
    pub fn challenge(&self) -> AuthChallengeState {
        self.inner.state.lock().challenge.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state.lock().finished.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn set_password(&self, password: impl Into<String>) -> AuthStep {
        self.inner.state.lock().challenge.set_password(password)
    }

    pub fn set_two_factor_code(&self, code: impl Into<String>) -> AuthStep {
        self.inner.state.lock().challenge.set_two_factor_code(code)
    }

    /// Wait up to `within` for the guest cleanup a successful download
    /// started. Returns `false` if it was still running at the deadline; it
    /// then keeps running detached for as long as the runtime lives.
    pub async fn finish_cleanup(&self, within: Duration) -> bool {
        let Some(handle) = self.inner.cleanup.lock().take() else {
            return true;
        };

        match tokio::time::timeout(within, handle).await {
            Ok(_) => true,
            Err(_) => {
                tracing::warn!(
                    view_id = %self.inner.view_id,
                    shared_link = %self.inner.metadata.shared_link,
                    "Guest file cleanup still running"
                );
                false
            }
        }
    }

    /// The viewer navigated away. Results of requests still in flight are
    /// discarded instead of being applied.
    pub fn abandon(&self) {
        if !self.inner.abandoned.swap(true, Ordering::AcqRel) {
            tracing::debug!(view_id = %self.inner.view_id, "Abandoned share view");
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.inner.abandoned.load(Ordering::Acquire)
    }

    /// Issue the gated download.
    ///
    /// Returns `NeedsStep` without touching the network while a required
    /// credential is missing. Only one attempt may run at a time.
    pub async fn attempt_download(&self) -> Result<DownloadOutcome> {
        if self.is_abandoned() {
            return Err(ShareError::Abandoned);
        }

        let _guard = InFlightGuard::acquire(&self.inner.in_flight)
            .ok_or(ShareError::AttemptInFlight)?;

        let credentials = {
            let state = self.inner.state.lock();
            if state.finished.is_some() {
                return Err(ShareError::Finished);
            }
            if !state.challenge.is_ready() {
                return Ok(DownloadOutcome::NeedsStep(state.challenge.step()));
            }
            state.challenge.credentials()
        };

        let shared_link = &self.inner.metadata.shared_link;
        tracing::info!(
            view_id = %self.inner.view_id,
            shared_link = %shared_link,
            with_password = credentials.password.is_some(),
            with_two_factor = credentials.two_factor_code.is_some(),
            "Attempting download"
        );

        let result = self.inner.backend.download(shared_link, &credentials).await;

        if self.is_abandoned() {
            tracing::debug!(view_id = %self.inner.view_id, "Dropping late download result");
            return Err(ShareError::Abandoned);
        }

        Ok(match result {
            Ok(file) => self.succeed(file),
            Err(e) => self.fail(e, &credentials),
        })
    }

    fn succeed(&self, file: DownloadedFile) -> DownloadOutcome {
        let metadata = &self.inner.metadata;
        self.inner.state.lock().finished = Some(Finish::Succeeded);

        let filename = file
            .filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| metadata.filename.clone());

        tracing::info!(
            view_id = %self.inner.view_id,
            shared_link = %metadata.shared_link,
            filename = %filename,
            size = file.bytes.len(),
            "Download succeeded"
        );

        // The download result never waits on cleanup; callers that are about
        // to exit drain it with `finish_cleanup`
        *self.inner.cleanup.lock() = self.inner.guest.after_successful_download(metadata);

        DownloadOutcome::Success {
            bytes: file.bytes,
            filename,
        }
    }

    fn fail(&self, error: ApiError, sent: &DownloadCredentials) -> DownloadOutcome {
        let verdict = classify_error(&error);
        let server_message = error.server_message().map(str::to_string);
        let mut state = self.inner.state.lock();

        tracing::info!(
            view_id = %self.inner.view_id,
            shared_link = %self.inner.metadata.shared_link,
            verdict = ?verdict,
            error = %error,
            "Download failed"
        );

        let kind = match verdict {
            Verdict::WrongPassword if state.challenge.requires_password() => {
                let message =
                    server_message.unwrap_or_else(|| WRONG_PASSWORD_MESSAGE.to_string());
                // Only forget the password that was actually rejected
                if state.challenge.credentials().password == sent.password {
                    state.challenge.rewind_password(message);
                } else {
                    state.challenge.note_error(message);
                }
                return DownloadOutcome::NeedsStep(state.challenge.step());
            }
            Verdict::WrongTwoFactor if state.challenge.requires_2fa() => {
                let message =
                    server_message.unwrap_or_else(|| WRONG_TWO_FACTOR_MESSAGE.to_string());
                if state.challenge.credentials().two_factor_code == sent.two_factor_code {
                    state.challenge.rewind_two_factor(message);
                } else {
                    state.challenge.note_error(message);
                }
                return DownloadOutcome::NeedsStep(state.challenge.step());
            }
            Verdict::LinkGone => FatalKind::LinkGone,
            // A credential complaint about a credential we never sent
            Verdict::WrongPassword | Verdict::WrongTwoFactor | Verdict::Unauthorized => {
                FatalKind::Unauthorized
            }
            Verdict::Unknown => FatalKind::Unknown,
        };

        state.finished = Some(Finish::Failed(kind));

        let message = match kind {
            // The server's text for a 404 is rarely meant for end users
            FatalKind::LinkGone => kind.default_message().to_string(),
            _ => server_message.unwrap_or_else(|| kind.default_message().to_string()),
        };

        DownloadOutcome::Fatal { kind, message }
    }
}

impl Clone for DownloadAuthenticator {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for DownloadAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("DownloadAuthenticator")
            .field("view_id", &self.inner.view_id)
            .field("shared_link", &self.inner.metadata.shared_link)
            .field("challenge", &state.challenge)
            .field("finished", &state.finished)
            .finish()
    }
}

/// Holds the single in-flight slot; released on drop, including when the
/// attempt future is cancelled.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ShareLinkResolver;
    use crate::testing::{downloaded, metadata, status_error, ScriptedBackend};
    use freeshare_admission::{admit, Candidate};

    #[tokio::test]
    async fn test_open_link_is_ready_without_credentials() {
        let (backend, _deletes) = ScriptedBackend::new();
        let auth = DownloadAuthenticator::new(metadata(false, false, false), backend);

        assert_eq!(auth.step(), AuthStep::Ready);
        let challenge = auth.challenge();
        assert!(challenge.password().is_none());
        assert!(challenge.two_factor_code().is_none());
    }

    #[tokio::test]
    async fn test_never_downloads_before_both_credentials() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_download(Ok(downloaded(b"data", None)));
        let auth = DownloadAuthenticator::new(metadata(true, false, true), backend.clone());

        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::NeedsStep(AuthStep::AwaitingPassword)
        );

        auth.set_password("secret");
        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::NeedsStep(AuthStep::AwaitingTwoFactor)
        );

        auth.set_two_factor_code("   ");
        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::NeedsStep(AuthStep::AwaitingTwoFactor)
        );
        assert!(backend.download_calls().is_empty());

        auth.set_two_factor_code("123456");
        assert!(auth.attempt_download().await.unwrap().is_success());

        let calls = backend.download_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.password.as_deref(), Some("secret"));
        assert_eq!(calls[0].1.two_factor_code.as_deref(), Some("123456"));
    }

    #[tokio::test]
    async fn test_scenario_anonymous_upload_open_link_guest_cleanup() {
        // 50 KB pdf from an anonymous uploader is admitted
        assert!(admit(Candidate::new("notes.pdf", 50 * 1024), false).is_ok());

        let (backend, mut deletes) = ScriptedBackend::new();
        let mut uploaded = metadata(false, false, false);
        uploaded.shared_link = String::new();
        backend.push_share(Ok(uploaded));
        backend.push_download(Ok(downloaded(b"%PDF-1.7", None)));

        let resolver = ShareLinkResolver::new(backend.clone());
        let meta = resolver.resolve("link-1").await.unwrap();
        let auth = DownloadAuthenticator::new(meta, backend.clone());
        assert_eq!(auth.step(), AuthStep::Ready);

        match auth.attempt_download().await.unwrap() {
            DownloadOutcome::Success { bytes, filename } => {
                assert_eq!(bytes, b"%PDF-1.7");
                assert_eq!(filename, "report.pdf");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(deletes.recv().await.as_deref(), Some("link-1"));

        // Success is terminal: no second download, no second delete
        assert_eq!(auth.attempt_download().await, Err(ShareError::Finished));
        tokio::task::yield_now().await;
        assert!(deletes.try_recv().is_err());
        assert_eq!(backend.download_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_scenario_wrong_password_then_correct() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_download(Err(status_error(403, "Incorrect password")));
        backend.push_download(Ok(downloaded(b"ok", Some("server-name.docx"))));

        let mut meta = metadata(true, false, false);
        meta.owner_email = Some("ana@example.com".to_string());
        let auth = DownloadAuthenticator::new(meta, backend.clone());

        auth.set_password("wrong");
        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::NeedsStep(AuthStep::AwaitingPassword)
        );

        let challenge = auth.challenge();
        assert!(challenge.password().is_none());
        assert!(challenge.two_factor_code().is_none());
        assert_eq!(challenge.last_error(), Some("Incorrect password"));

        auth.set_password("right");
        match auth.attempt_download().await.unwrap() {
            DownloadOutcome::Success { filename, .. } => assert_eq!(filename, "server-name.docx"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let calls = backend.download_calls();
        assert_eq!(calls[0].1.password.as_deref(), Some("wrong"));
        assert_eq!(calls[1].1.password.as_deref(), Some("right"));
    }

    #[tokio::test]
    async fn test_scenario_unknown_link_never_reaches_ready() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_share(Err(status_error(404, "File not found")));

        let resolver = ShareLinkResolver::new(backend.clone());
        assert_eq!(
            resolver.resolve("missing").await,
            Err(crate::error::ResolveError::NotFound)
        );
        assert!(backend.download_calls().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_two_factor_keeps_password() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_download(Err(status_error(403, "Invalid 2FA code")));
        let auth = DownloadAuthenticator::new(metadata(true, false, true), backend);

        auth.set_password("secret");
        auth.set_two_factor_code("000000");

        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::NeedsStep(AuthStep::AwaitingTwoFactor)
        );
        let challenge = auth.challenge();
        assert_eq!(challenge.password(), Some("secret"));
        assert!(challenge.two_factor_code().is_none());
        assert!(!auth.is_finished());
    }

    #[tokio::test]
    async fn test_link_gone_during_download_is_fatal() {
        let (backend, mut deletes) = ScriptedBackend::new();
        backend.push_download(Err(status_error(404, "No value present")));
        let auth = DownloadAuthenticator::new(metadata(false, false, false), backend);

        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::Fatal {
                kind: FatalKind::LinkGone,
                message: FatalKind::LinkGone.default_message().to_string(),
            }
        );
        assert!(auth.is_finished());
        assert_eq!(auth.attempt_download().await, Err(ShareError::Finished));
        assert!(deletes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_permission_failure_is_fatal_with_server_message() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_download(Err(status_error(403, "no permission")));
        let auth = DownloadAuthenticator::new(metadata(false, false, false), backend);

        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::Fatal {
                kind: FatalKind::Unauthorized,
                message: "no permission".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_password_complaint_without_password_step_is_unauthorized() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_download(Err(status_error(400, "Invalid request")));
        let auth = DownloadAuthenticator::new(metadata(false, false, false), backend);

        match auth.attempt_download().await.unwrap() {
            DownloadOutcome::Fatal { kind, .. } => assert_eq!(kind, FatalKind::Unauthorized),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_uses_generic_message() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_download(Err(ApiError::Transport("connection reset".to_string())));
        let auth = DownloadAuthenticator::new(metadata(false, false, false), backend);

        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::Fatal {
                kind: FatalKind::Unknown,
                message: FatalKind::Unknown.default_message().to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_attempt_is_rejected() {
        let (backend, mut deletes) = ScriptedBackend::new();
        let gate = backend.gate_downloads();
        backend.push_download(Ok(downloaded(b"once", None)));
        let auth = DownloadAuthenticator::new(metadata(false, false, false), backend.clone());

        let (first, second) = tokio::join!(auth.attempt_download(), async {
            tokio::task::yield_now().await;
            assert!(auth.is_in_flight());
            let second = auth.attempt_download().await;
            gate.notify_one();
            second
        });

        assert!(first.unwrap().is_success());
        assert_eq!(second, Err(ShareError::AttemptInFlight));
        assert!(!auth.is_in_flight());
        assert_eq!(backend.download_calls().len(), 1);

        assert!(deletes.recv().await.is_some());
        tokio::task::yield_now().await;
        assert!(deletes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_late_result_after_abandon_is_dropped() {
        let (backend, mut deletes) = ScriptedBackend::new();
        let gate = backend.gate_downloads();
        backend.push_download(Err(status_error(403, "Incorrect password")));

        let auth = DownloadAuthenticator::new(metadata(true, false, false), backend.clone());
        auth.set_password("typed");

        let (result, _) = tokio::join!(auth.attempt_download(), async {
            tokio::task::yield_now().await;
            auth.abandon();
            gate.notify_one();
        });

        assert_eq!(result, Err(ShareError::Abandoned));
        // The rejection never rewound the state
        assert_eq!(auth.challenge().password(), Some("typed"));
        assert_eq!(auth.step(), AuthStep::Ready);
        assert!(deletes.try_recv().is_err());

        assert_eq!(auth.attempt_download().await, Err(ShareError::Abandoned));
    }

    #[tokio::test]
    async fn test_encrypted_link_rewinds_on_wrong_password() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_download(Err(status_error(403, "Incorrect password")));
        backend.push_download(Ok(downloaded(b"cipher", None)));

        // Not flagged as password protected, but encrypted
        let auth = DownloadAuthenticator::new(metadata(false, true, false), backend.clone());
        assert_eq!(auth.step(), AuthStep::AwaitingPassword);

        auth.set_password("wrong");
        assert_eq!(
            auth.attempt_download().await.unwrap(),
            DownloadOutcome::NeedsStep(AuthStep::AwaitingPassword)
        );
        assert!(auth.challenge().password().is_none());
        assert!(!auth.is_finished());

        auth.set_password("right");
        assert!(auth.attempt_download().await.unwrap().is_success());

        let calls = backend.download_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1.password.as_deref(), Some("right"));
    }

    #[tokio::test]
    async fn test_password_replaced_during_attempt_is_kept() {
        let (backend, _deletes) = ScriptedBackend::new();
        let gate = backend.gate_downloads();
        backend.push_download(Err(status_error(403, "Incorrect password")));

        let auth = DownloadAuthenticator::new(metadata(true, false, false), backend.clone());
        auth.set_password("wrong");

        let (result, _) = tokio::join!(auth.attempt_download(), async {
            tokio::task::yield_now().await;
            auth.set_password("right");
            gate.notify_one();
        });

        // Only the rejected password is forgotten
        assert_eq!(result.unwrap(), DownloadOutcome::NeedsStep(AuthStep::Ready));
        let challenge = auth.challenge();
        assert_eq!(challenge.password(), Some("right"));
        assert_eq!(challenge.last_error(), Some("Incorrect password"));
        assert_eq!(backend.download_calls()[0].1.password.as_deref(), Some("wrong"));
    }

    #[test]
    fn test_guest_cleanup_survives_runtime_shutdown() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let (backend, _deletes) = ScriptedBackend::new();
        backend.delay_deletes(Duration::from_millis(30));
        backend.push_download(Ok(downloaded(b"data", None)));
        let auth = DownloadAuthenticator::new(metadata(false, false, false), backend.clone());

        let outcome = runtime.block_on(auth.attempt_download()).unwrap();
        assert!(outcome.is_success());
        assert!(runtime.block_on(auth.finish_cleanup(Duration::from_secs(5))));

        // Same as returning from main right after the download
        drop(runtime);
        assert_eq!(backend.completed_deletes(), 1);
    }

    #[tokio::test]
    async fn test_finish_cleanup_gives_up_at_deadline() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.delay_deletes(Duration::from_secs(30));
        backend.push_download(Ok(downloaded(b"data", None)));
        let auth = DownloadAuthenticator::new(metadata(false, false, false), backend.clone());

        assert!(auth.attempt_download().await.unwrap().is_success());
        assert!(!auth.finish_cleanup(Duration::from_millis(10)).await);
        assert_eq!(backend.completed_deletes(), 0);
    }

    #[tokio::test]
    async fn test_finish_cleanup_without_guest_file() {
        let (backend, _deletes) = ScriptedBackend::new();
        backend.push_download(Ok(downloaded(b"data", None)));

        let mut meta = metadata(false, false, false);
        meta.owner_email = Some("ana@example.com".to_string());
        let auth = DownloadAuthenticator::new(meta, backend.clone());

        // Nothing started yet, nothing to wait for
        assert!(auth.finish_cleanup(Duration::from_millis(10)).await);
        assert!(auth.attempt_download().await.unwrap().is_success());
        assert!(auth.finish_cleanup(Duration::from_millis(10)).await);
        assert_eq!(backend.completed_deletes(), 0);
    }
}
