//! Single-shot upload engine
//!
//! One store call for blobs under the multipart threshold. No partial write
//! is possible on this path: a transport failure leaves the store unchanged.

use crate::store::ObjectStore;
use crate::upload::{object_spec, validate, Blob, StoredUpload, UploadError, UploadOptions};
use std::sync::Arc;
use std::time::Instant;

/// Single-shot upload handler
pub struct PutObjectHandler {
    store: Arc<dyn ObjectStore>,
    max_size_bytes: u64,
}

impl PutObjectHandler {
    pub fn new(store: Arc<dyn ObjectStore>, max_size_bytes: u64) -> Self {
        Self {
            store,
            max_size_bytes,
        }
    }

    /// Upload the whole blob in one call.
    ///
    /// Validation failures return before any store call. Transport failures
    /// are surfaced whole; the caller owns retry policy.
    #[tracing::instrument(
        name = "upload.put_object",
        skip(self, blob, options),
        fields(
            blob.name = %blob.name,
            upload.bytes = blob.size_bytes(),
            s3.key = tracing::field::Empty,
        ),
        err
    )]
    pub async fn upload(
        &self,
        blob: &Blob,
        options: &UploadOptions,
    ) -> Result<StoredUpload, UploadError> {
        validate::validate_image(blob, self.max_size_bytes)?;

        let spec = object_spec(blob, options);
        tracing::Span::current().record("s3.key", spec.key.as_str());

        let start_time = Instant::now();
        let etag = self.store.put_object(&spec, blob.bytes.clone()).await?;

        tracing::info!(
            key = %spec.key,
            etag = %etag,
            bytes = blob.size_bytes(),
            duration_ms = start_time.elapsed().as_millis(),
            "PutObject upload completed"
        );

        Ok(StoredUpload {
            key: spec.key,
            etag,
        })
    }
}
