//! In-memory object store
//!
//! Backs tests and local development. Multipart sessions behave like the
//! real service: parts are tracked per upload id, completion rejects a part
//! list that is out of order or refers to a part that was never uploaded,
//! and aborting discards the pending session.

use crate::store::{CompletedPart, ObjectSpec, ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct PendingUpload {
    key: String,
    content_type: String,
    parts: BTreeMap<u32, (String, Bytes)>,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<String, StoredObject>,
    uploads: HashMap<String, PendingUpload>,
}

/// In-memory object store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored object by key
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.inner.lock().objects.get(key).cloned()
    }

    /// Number of committed objects
    pub fn object_count(&self) -> usize {
        self.inner.lock().objects.len()
    }

    /// Number of multipart sessions that are still open
    pub fn open_upload_count(&self) -> usize {
        self.inner.lock().uploads.len()
    }
}

fn fresh_etag() -> String {
    format!("\"{}\"", uuid::Uuid::new_v4().simple())
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, spec: &ObjectSpec, body: Bytes) -> Result<String, StoreError> {
        let etag = fresh_etag();
        self.inner.lock().objects.insert(
            spec.key.clone(),
            StoredObject {
                body,
                content_type: spec.content_type.clone(),
            },
        );
        Ok(etag)
    }

    async fn create_multipart_upload(&self, spec: &ObjectSpec) -> Result<String, StoreError> {
        let upload_id = uuid::Uuid::new_v4().to_string();
        self.inner.lock().uploads.insert(
            upload_id.clone(),
            PendingUpload {
                key: spec.key.clone(),
                content_type: spec.content_type.clone(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        _key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, StoreError> {
        let mut inner = self.inner.lock();
        let upload = inner
            .uploads
            .get_mut(upload_id)
            .ok_or_else(|| StoreError::Response(format!("NoSuchUpload: {upload_id}")))?;
        let etag = fresh_etag();
        upload.parts.insert(part_number, (etag.clone(), body));
        Ok(etag)
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<String, StoreError> {
        let mut inner = self.inner.lock();
        let upload = inner
            .uploads
            .remove(upload_id)
            .ok_or_else(|| StoreError::Response(format!("NoSuchUpload: {upload_id}")))?;

        if upload.key != key {
            return Err(StoreError::Response(format!(
                "NoSuchUpload: {upload_id} does not belong to {key}"
            )));
        }
        if parts.is_empty() {
            return Err(StoreError::Response("InvalidRequest: no parts".into()));
        }

        let mut body = Vec::new();
        let mut previous = 0u32;
        for part in parts {
            if part.part_number <= previous {
                return Err(StoreError::Response(
                    "InvalidPartOrder: part numbers must be ascending".into(),
                ));
            }
            previous = part.part_number;

            let (etag, chunk) = upload.parts.get(&part.part_number).ok_or_else(|| {
                StoreError::Response(format!("InvalidPart: part {} not uploaded", part.part_number))
            })?;
            if *etag != part.etag {
                return Err(StoreError::Response(format!(
                    "InvalidPart: entity tag mismatch for part {}",
                    part.part_number
                )));
            }
            body.extend_from_slice(chunk);
        }

        let etag = fresh_etag();
        inner.objects.insert(
            key.to_string(),
            StoredObject {
                body: Bytes::from(body),
                content_type: upload.content_type.clone(),
            },
        );
        Ok(etag)
    }

    async fn abort_multipart_upload(&self, _key: &str, upload_id: &str) -> Result<(), StoreError> {
        self.inner.lock().uploads.remove(upload_id);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        // Delete-by-key is idempotent: removing a missing key is not an error.
        self.inner.lock().objects.remove(key);
        Ok(())
    }
}
