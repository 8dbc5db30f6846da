//! Multipart upload engine
//!
//! Splits a blob into fixed-size parts, uploads them concurrently, and
//! commits the session from the sorted part list. On any part or completion
//! failure the engine issues exactly one abort for the open upload id before
//! surfacing the original error, so failed sessions do not linger as
//! billable orphans.

use crate::store::{CompletedPart, ObjectStore};
use crate::upload::progress::ProgressSender;
use crate::upload::{object_spec, validate, Blob, StoredUpload, UploadError, UploadOptions};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Fixed part size (5MiB) - the store's minimum for non-final parts
pub const PART_SIZE: usize = 5 * 1024 * 1024;

/// Maximum parts allowed per session
pub const MAX_PARTS: u64 = 10000;

/// One open multipart session.
///
/// Exclusively owned by a single engine invocation and committed or aborted
/// before that invocation returns. `parts` is sorted ascending and verified
/// contiguous 1..N before completion is requested.
#[derive(Debug)]
pub struct MultipartSession {
    pub upload_id: String,
    pub key: String,
    pub parts: Vec<CompletedPart>,
}

/// Multipart upload handler
pub struct MultipartHandler {
    store: Arc<dyn ObjectStore>,
    max_size_bytes: u64,
    concurrent_parts: usize,
}

impl MultipartHandler {
    pub fn new(store: Arc<dyn ObjectStore>, max_size_bytes: u64, concurrent_parts: usize) -> Self {
        Self {
            store,
            max_size_bytes,
            concurrent_parts: concurrent_parts.max(1),
        }
    }

    /// Upload the blob as a multipart session.
    ///
    /// Progress is reported per completed part as `part_number / total_parts`
    /// percent; completions may arrive out of numeric order and the channel
    /// keeps the maximum seen.
    #[tracing::instrument(
        name = "upload.multipart",
        skip(self, blob, options, progress),
        fields(
            blob.name = %blob.name,
            upload.bytes = blob.size_bytes(),
            s3.key = tracing::field::Empty,
            s3.upload_id = tracing::field::Empty,
        ),
        err
    )]
    pub async fn upload(
        &self,
        blob: &Blob,
        options: &UploadOptions,
        progress: &ProgressSender,
    ) -> Result<StoredUpload, UploadError> {
        validate::validate_image(blob, self.max_size_bytes)?;

        let total_parts = blob.size_bytes().div_ceil(PART_SIZE as u64);
        if total_parts > MAX_PARTS {
            return Err(UploadError::Validation(format!(
                "File would need {total_parts} parts, more than the {MAX_PARTS} the store allows"
            )));
        }

        let spec = object_spec(blob, options);
        let span = tracing::Span::current();
        span.record("s3.key", spec.key.as_str());

        // Nothing exists remotely yet, so a failure here needs no abort.
        let upload_id = self.store.create_multipart_upload(&spec).await?;
        span.record("s3.upload_id", upload_id.as_str());

        let mut session = MultipartSession {
            upload_id,
            key: spec.key,
            parts: Vec::new(),
        };

        match self
            .transfer(blob, &mut session, total_parts as u32, progress)
            .await
        {
            Ok(etag) => {
                tracing::info!(
                    key = %session.key,
                    upload_id = %session.upload_id,
                    parts = session.parts.len(),
                    "Multipart upload completed"
                );
                Ok(StoredUpload {
                    key: session.key,
                    etag,
                })
            }
            Err(err) => {
                // Exactly one abort per failed session; an abort failure is
                // logged and never overrides the original transfer error.
                if let Err(abort_err) = self
                    .store
                    .abort_multipart_upload(&session.key, &session.upload_id)
                    .await
                {
                    tracing::warn!(
                        upload_id = %session.upload_id,
                        error = %abort_err,
                        "Failed to abort multipart upload"
                    );
                }
                Err(err)
            }
        }
    }

    /// Upload every part, then commit the session. Any error bubbles to the
    /// single abort site in `upload`.
    async fn transfer(
        &self,
        blob: &Blob,
        session: &mut MultipartSession,
        total_parts: u32,
        progress: &ProgressSender,
    ) -> Result<String, UploadError> {
        session.parts = self
            .upload_parts(blob, &session.key, &session.upload_id, total_parts, progress)
            .await?;

        // Completion requires the list sorted ascending; arrival order is
        // whatever the concurrent uploads produced.
        session.parts.sort_by_key(|part| part.part_number);
        verify_contiguous(&session.parts)?;

        let etag = self
            .store
            .complete_multipart_upload(&session.key, &session.upload_id, &session.parts)
            .await?;
        Ok(etag)
    }

    /// Upload all parts with bounded concurrency, failing fast on the first
    /// error. Chunks are cheap views into the blob, not copies.
    async fn upload_parts(
        &self,
        blob: &Blob,
        key: &str,
        upload_id: &str,
        total_parts: u32,
        progress: &ProgressSender,
    ) -> Result<Vec<CompletedPart>, UploadError> {
        let uploads = (0..total_parts).map(|index| {
            let start = index as usize * PART_SIZE;
            let end = blob.bytes.len().min(start + PART_SIZE);
            let body = blob.bytes.slice(start..end);
            let part_number = index + 1;
            async move {
                let etag = self
                    .store
                    .upload_part(key, upload_id, part_number, body)
                    .await?;
                progress.report((part_number as u64 * 100 / total_parts as u64) as u8);
                tracing::debug!(part_number, "Uploaded part");
                Ok::<CompletedPart, UploadError>(CompletedPart { part_number, etag })
            }
        });

        let parts = stream::iter(uploads)
            .buffer_unordered(self.concurrent_parts)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(parts)
    }
}

/// A sorted part list must be exactly 1..N. A gap or duplicate here is a
/// defect in the engine, not a recoverable upload failure.
fn verify_contiguous(parts: &[CompletedPart]) -> Result<(), UploadError> {
    if parts.is_empty() {
        return Err(UploadError::Integrity("no parts uploaded".into()));
    }
    for (index, part) in parts.iter().enumerate() {
        let expected = index as u32 + 1;
        if part.part_number != expected {
            return Err(UploadError::Integrity(format!(
                "expected part {expected}, found part {}",
                part.part_number
            )));
        }
    }
    Ok(())
}
