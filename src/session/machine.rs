//! Session transitions
//!
//! The lifecycle is a pure transition function: `(state, event)` yields the
//! next state plus an optional side-effect descriptor for the driver to
//! execute. Keeping mutation out of here makes every transition testable
//! without a store or a runtime, and leaves the driver as the only place
//! effects happen.

use crate::upload::{Blob, UploadResult};

/// Lifecycle stage of one upload session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    /// No blob selected
    #[default]
    Idle,
    /// Blob selected, crop decision pending
    Cropping,
    /// Working blob fixed, ready to transfer
    Staged,
    /// A transfer is in flight
    Transferring,
    /// A transfer settled successfully
    Uploaded,
}

/// Inbound events from the host UI and the transfer pipeline
#[derive(Debug, Clone)]
pub enum Event {
    /// A blob was selected
    Select(Blob),
    /// Cropping finished with a replacement blob
    CropComplete(Blob),
    /// Cropping was cancelled; the original blob stands
    CropCancel,
    /// The working blob was removed
    Remove,
    /// The user asked to start the transfer
    UploadRequested,
    /// The transfer finished, one way or the other
    Settled(UploadResult),
    /// Deletion of the uploaded object was confirmed
    DeleteConfirmed,
    /// Start over for another upload, keeping the stored object
    UploadNew,
}

/// Side effects the driver must execute after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Dispatch the working blob to the transfer pipeline
    BeginTransfer,
    /// Remove the stored object by key
    DeleteObject { key: String },
}

/// One session's state
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub stage: Stage,
    pub blob: Option<Blob>,
    pub cropped_blob: Option<Blob>,
    pub result: Option<UploadResult>,
    pub uploaded_key: Option<String>,
    pub published_url: Option<String>,
}

impl SessionState {
    /// The blob a transfer would use: the cropped one when present,
    /// otherwise the original selection.
    pub fn active_blob(&self) -> Option<&Blob> {
        self.cropped_blob.as_ref().or(self.blob.as_ref())
    }
}

/// Apply one event.
///
/// Events that do not apply to the current stage leave the state unchanged
/// and produce no effect; in particular an upload request outside `Staged`
/// is a no-op, which is what guarantees at most one transfer in flight.
pub fn apply(state: SessionState, event: Event) -> (SessionState, Option<Effect>) {
    match event {
        Event::Select(blob) => {
            if blob.content_type.starts_with("image/") {
                (
                    SessionState {
                        stage: Stage::Cropping,
                        blob: Some(blob),
                        ..SessionState::default()
                    },
                    None,
                )
            } else {
                // Invalid selection returns the session to Idle
                (SessionState::default(), None)
            }
        }

        Event::CropComplete(cropped) => match state.stage {
            Stage::Cropping => (
                SessionState {
                    stage: Stage::Staged,
                    cropped_blob: Some(cropped),
                    ..state
                },
                None,
            ),
            _ => (state, None),
        },

        Event::CropCancel => match state.stage {
            Stage::Cropping => {
                let original = state.blob.clone();
                (
                    SessionState {
                        stage: Stage::Staged,
                        cropped_blob: original,
                        ..state
                    },
                    None,
                )
            }
            _ => (state, None),
        },

        Event::Remove => (SessionState::default(), None),

        Event::UploadRequested => match state.stage {
            Stage::Staged if state.active_blob().is_some() => (
                SessionState {
                    stage: Stage::Transferring,
                    result: None,
                    ..state
                },
                Some(Effect::BeginTransfer),
            ),
            _ => (state, None),
        },

        Event::Settled(result) => match state.stage {
            Stage::Transferring => {
                if result.success {
                    let uploaded_key = result.key.clone();
                    let published_url = result.url.clone();
                    (
                        SessionState {
                            stage: Stage::Uploaded,
                            uploaded_key,
                            published_url,
                            result: Some(result),
                            ..state
                        },
                        None,
                    )
                } else {
                    // Failure re-enters Staged so the user can retry or
                    // remove; the published URL is cleared.
                    (
                        SessionState {
                            stage: Stage::Staged,
                            uploaded_key: None,
                            published_url: None,
                            result: Some(result),
                            ..state
                        },
                        None,
                    )
                }
            }
            _ => (state, None),
        },

        Event::DeleteConfirmed => {
            let effect = state
                .uploaded_key
                .clone()
                .map(|key| Effect::DeleteObject { key });
            (SessionState::default(), effect)
        }

        Event::UploadNew => (SessionState::default(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn image_blob(name: &str) -> Blob {
        Blob::new(name, "image/png", Bytes::from_static(b"\x89PNG"))
    }

    fn staged_state() -> SessionState {
        let (state, _) = apply(SessionState::default(), Event::Select(image_blob("a.png")));
        let (state, _) = apply(state, Event::CropCancel);
        state
    }

    #[test]
    fn test_select_image_moves_to_cropping() {
        let (state, effect) = apply(SessionState::default(), Event::Select(image_blob("a.png")));
        assert_eq!(state.stage, Stage::Cropping);
        assert!(effect.is_none());
    }

    #[test]
    fn test_select_non_image_stays_idle() {
        let blob = Blob::new("a.txt", "text/plain", Bytes::from_static(b"hi"));
        let (state, _) = apply(SessionState::default(), Event::Select(blob));
        assert_eq!(state.stage, Stage::Idle);
        assert!(state.blob.is_none());
    }

    #[test]
    fn test_crop_complete_swaps_blob() {
        let (state, _) = apply(SessionState::default(), Event::Select(image_blob("a.png")));
        let cropped = Blob::new("a.png", "image/png", Bytes::from_static(b"crop"));
        let (state, _) = apply(state, Event::CropComplete(cropped));
        assert_eq!(state.stage, Stage::Staged);
        assert_eq!(state.active_blob().unwrap().bytes.as_ref(), b"crop");
    }

    #[test]
    fn test_crop_cancel_keeps_original() {
        let state = staged_state();
        assert_eq!(state.stage, Stage::Staged);
        assert_eq!(state.active_blob().unwrap().bytes.as_ref(), b"\x89PNG");
    }

    #[test]
    fn test_upload_from_staged_begins_transfer() {
        let (state, effect) = apply(staged_state(), Event::UploadRequested);
        assert_eq!(state.stage, Stage::Transferring);
        assert_eq!(effect, Some(Effect::BeginTransfer));
    }

    #[test]
    fn test_upload_while_transferring_is_noop() {
        let (state, _) = apply(staged_state(), Event::UploadRequested);
        let (state, effect) = apply(state, Event::UploadRequested);
        assert_eq!(state.stage, Stage::Transferring);
        assert!(effect.is_none());
    }

    #[test]
    fn test_upload_from_idle_is_noop() {
        let (state, effect) = apply(SessionState::default(), Event::UploadRequested);
        assert_eq!(state.stage, Stage::Idle);
        assert!(effect.is_none());
    }

    #[test]
    fn test_success_settles_uploaded() {
        let (state, _) = apply(staged_state(), Event::UploadRequested);
        let result = UploadResult::succeeded("https://cdn/x.png", "uploads/x.png");
        let (state, _) = apply(state, Event::Settled(result));
        assert_eq!(state.stage, Stage::Uploaded);
        assert_eq!(state.uploaded_key.as_deref(), Some("uploads/x.png"));
        assert_eq!(state.published_url.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn test_failure_returns_to_staged() {
        let (state, _) = apply(staged_state(), Event::UploadRequested);
        let (state, _) = apply(state, Event::Settled(UploadResult::failed("boom")));
        assert_eq!(state.stage, Stage::Staged);
        assert!(state.published_url.is_none());
        assert!(state.uploaded_key.is_none());
        assert_eq!(state.result.as_ref().unwrap().error.as_deref(), Some("boom"));
        // The working blob survives for a retry
        assert!(state.active_blob().is_some());
    }

    #[test]
    fn test_retry_after_failure() {
        let (state, _) = apply(staged_state(), Event::UploadRequested);
        let (state, _) = apply(state, Event::Settled(UploadResult::failed("boom")));
        let (state, effect) = apply(state, Event::UploadRequested);
        assert_eq!(state.stage, Stage::Transferring);
        assert_eq!(effect, Some(Effect::BeginTransfer));
    }

    #[test]
    fn test_delete_confirmed_resets_and_requests_delete() {
        let (state, _) = apply(staged_state(), Event::UploadRequested);
        let result = UploadResult::succeeded("https://cdn/x.png", "uploads/x.png");
        let (state, _) = apply(state, Event::Settled(result));

        let (state, effect) = apply(state, Event::DeleteConfirmed);
        assert_eq!(state.stage, Stage::Idle);
        assert!(state.published_url.is_none());
        assert_eq!(
            effect,
            Some(Effect::DeleteObject {
                key: "uploads/x.png".into()
            })
        );
    }

    #[test]
    fn test_upload_new_resets_without_delete() {
        let (state, _) = apply(staged_state(), Event::UploadRequested);
        let result = UploadResult::succeeded("https://cdn/x.png", "uploads/x.png");
        let (state, _) = apply(state, Event::Settled(result));

        let (state, effect) = apply(state, Event::UploadNew);
        assert_eq!(state.stage, Stage::Idle);
        assert!(effect.is_none());
    }

    #[test]
    fn test_remove_resets_from_any_stage() {
        let (state, effect) = apply(staged_state(), Event::Remove);
        assert_eq!(state.stage, Stage::Idle);
        assert!(state.blob.is_none());
        assert!(effect.is_none());
    }

    #[test]
    fn test_new_selection_clears_previous_result() {
        let (state, _) = apply(staged_state(), Event::UploadRequested);
        let result = UploadResult::succeeded("https://cdn/x.png", "uploads/x.png");
        let (state, _) = apply(state, Event::Settled(result));

        let (state, _) = apply(state, Event::Select(image_blob("b.png")));
        assert_eq!(state.stage, Stage::Cropping);
        assert!(state.result.is_none());
        assert!(state.uploaded_key.is_none());
        assert!(state.published_url.is_none());
    }
}
