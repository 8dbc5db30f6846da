//! Delete engine
//!
//! Removes a previously uploaded object by key in a single
//! idempotent-intent call.

use crate::store::ObjectStore;
use crate::upload::UploadError;
use std::sync::Arc;

/// Delete handler
pub struct DeleteHandler {
    store: Arc<dyn ObjectStore>,
}

impl DeleteHandler {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "upload.delete_object", skip(self), fields(s3.key = %key), err)]
    pub async fn remove(&self, key: &str) -> Result<(), UploadError> {
        self.store.delete_object(key).await?;
        tracing::info!(key = %key, "Deleted uploaded object");
        Ok(())
    }
}
