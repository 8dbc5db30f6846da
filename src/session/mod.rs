//! Upload session
//!
//! [`UploadSession`] drives the user-facing lifecycle on top of the transfer
//! pipeline: it owns the session state, advances it only through
//! [`machine::apply`] transitions, executes the effects those transitions
//! request, and republishes normalized results plus a progress stream.
//!
//! # Example
//!
//! ```no_run
//! use picshuttle::config::Config;
//! use picshuttle::store::s3::S3ObjectStore;
//! use picshuttle::upload::Blob;
//! use picshuttle::session::UploadSession;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("picshuttle.yaml")?;
//! let store = Arc::new(S3ObjectStore::connect(&config.storage).await);
//! let mut session = UploadSession::from_config(store, &config);
//!
//! session.select(Blob::new("photo.png", "image/png", vec![0u8; 64].into()));
//! session.crop_cancel();
//! if let Some(result) = session.upload().await {
//!     println!("uploaded: {:?}", result.url);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::store::ObjectStore;
use crate::upload::{progress, Blob, ProgressSender, UploadOptions, UploadResult, Uploader};
use std::sync::Arc;
use tokio::sync::watch;

pub mod machine;

pub use machine::{Effect, Event, SessionState, Stage};

/// What happened to the stored object when the session was deleted.
///
/// The session always resets regardless; `error` carries the reason when the
/// remote object may have lingered, so a host can surface a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub attempted: bool,
    pub error: Option<String>,
}

/// One user-driven upload session
pub struct UploadSession {
    uploader: Uploader,
    options: UploadOptions,
    state: SessionState,
    progress: ProgressSender,
    progress_rx: watch::Receiver<u8>,
}

impl UploadSession {
    pub fn new(uploader: Uploader, options: UploadOptions) -> Self {
        let (progress, progress_rx) = progress::channel();
        Self {
            uploader,
            options,
            state: SessionState::default(),
            progress,
            progress_rx,
        }
    }

    /// Build a session whose folder and ACL come from configuration defaults.
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        let uploader = Uploader::new(store, config);
        let options = UploadOptions {
            folder: Some(config.upload.folder.clone()).filter(|folder| !folder.is_empty()),
            acl: config.upload.acl,
            ..UploadOptions::default()
        };
        Self::new(uploader, options)
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Last settled result, if any
    pub fn result(&self) -> Option<&UploadResult> {
        self.state.result.as_ref()
    }

    /// The resolved public URL of the stored object, post CDN substitution
    pub fn published_url(&self) -> Option<&str> {
        self.state.published_url.as_deref()
    }

    /// Observe transfer progress in percent [0, 100]
    pub fn progress(&self) -> watch::Receiver<u8> {
        self.progress_rx.clone()
    }

    /// Select a blob. Non-image selections return the session to Idle.
    pub fn select(&mut self, blob: Blob) -> Stage {
        self.dispatch(Event::Select(blob));
        self.progress.reset();
        self.stage()
    }

    /// Replace the working blob with the cropped result.
    pub fn crop_complete(&mut self, cropped: Blob) -> Stage {
        self.dispatch(Event::CropComplete(cropped));
        self.stage()
    }

    /// Keep the original blob and move on.
    pub fn crop_cancel(&mut self) -> Stage {
        self.dispatch(Event::CropCancel);
        self.stage()
    }

    /// Drop the working blob and return to Idle.
    pub fn remove(&mut self) {
        self.dispatch(Event::Remove);
        self.progress.reset();
    }

    /// Start over for another upload without touching the stored object.
    pub fn upload_new(&mut self) {
        self.dispatch(Event::UploadNew);
        self.progress.reset();
    }

    /// Run the transfer for the staged blob.
    ///
    /// Returns `None` when no transfer was started: the session was not in
    /// `Staged`, which includes a second request while one is already in
    /// flight. No store call is made in that case. Otherwise returns the
    /// settled result, exactly one per transfer.
    pub async fn upload(&mut self) -> Option<UploadResult> {
        let effect = self.dispatch(Event::UploadRequested);
        if effect != Some(Effect::BeginTransfer) {
            tracing::debug!(stage = ?self.stage(), "Upload request ignored");
            return None;
        }

        self.progress.reset();
        let result = match self.state.active_blob().cloned() {
            Some(blob) => match self.uploader.upload(&blob, &self.options, &self.progress).await {
                Ok(uploaded) => UploadResult::succeeded(uploaded.url, uploaded.key),
                Err(err) => {
                    tracing::error!(error = %err, "Upload failed");
                    UploadResult::failed(err.to_string())
                }
            },
            // Unreachable through the machine's guard, but settle cleanly
            // rather than leave the session stuck in Transferring.
            None => UploadResult::failed("No file selected"),
        };

        self.dispatch(Event::Settled(result.clone()));
        Some(result)
    }

    /// Delete the uploaded object and reset the session.
    ///
    /// `confirmed` is the caller-obtained user confirmation: `false` is a
    /// no-op, not an error. When confirmed, the session resets to Idle
    /// whether or not the remote delete succeeded; a failure is logged and
    /// reported in the outcome.
    pub async fn delete_uploaded(&mut self, confirmed: bool) -> DeleteOutcome {
        if !confirmed {
            return DeleteOutcome {
                attempted: false,
                error: None,
            };
        }

        let effect = self.dispatch(Event::DeleteConfirmed);
        self.progress.reset();

        match effect {
            Some(Effect::DeleteObject { key }) => match self.uploader.remove(&key).await {
                Ok(()) => DeleteOutcome {
                    attempted: true,
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(
                        key = %key,
                        error = %err,
                        "Failed to delete uploaded object; session reset anyway"
                    );
                    DeleteOutcome {
                        attempted: true,
                        error: Some(err.to_string()),
                    }
                }
            },
            _ => DeleteOutcome {
                attempted: false,
                error: None,
            },
        }
    }

    fn dispatch(&mut self, event: Event) -> Option<Effect> {
        let (next, effect) = machine::apply(std::mem::take(&mut self.state), event);
        self.state = next;
        effect
    }
}
