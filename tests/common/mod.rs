//! Shared test fixtures
//!
//! `ChaosStore` wraps the in-memory store with per-operation call counters
//! and switchable failure injection, so tests can assert how many store
//! calls a code path makes and how it behaves when a specific call fails.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use picshuttle::config::Config;
use picshuttle::store::{memory::MemoryStore, CompletedPart, ObjectSpec, ObjectStore, StoreError};
use picshuttle::upload::Blob;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

#[derive(Default)]
pub struct CallCounts {
    pub put_object: AtomicUsize,
    pub create_multipart: AtomicUsize,
    pub upload_part: AtomicUsize,
    pub complete_multipart: AtomicUsize,
    pub abort_multipart: AtomicUsize,
    pub delete_object: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.put_object.load(Ordering::SeqCst)
            + self.create_multipart.load(Ordering::SeqCst)
            + self.upload_part.load(Ordering::SeqCst)
            + self.complete_multipart.load(Ordering::SeqCst)
            + self.abort_multipart.load(Ordering::SeqCst)
            + self.delete_object.load(Ordering::SeqCst)
    }
}

/// Counting, fault-injecting store for tests
#[derive(Default)]
pub struct ChaosStore {
    pub memory: MemoryStore,
    pub calls: CallCounts,
    pub fail_put: AtomicBool,
    pub fail_create: AtomicBool,
    /// Fail uploads of this part number (0 = none)
    pub fail_part: AtomicU32,
    pub fail_complete: AtomicBool,
    pub fail_abort: AtomicBool,
    pub fail_delete: AtomicBool,
    /// Part list most recently passed to complete_multipart_upload
    pub completed_parts: Mutex<Option<Vec<CompletedPart>>>,
    /// Upload ids that were aborted
    pub aborted_ids: Mutex<Vec<String>>,
}

impl ChaosStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for ChaosStore {
    async fn put_object(&self, spec: &ObjectSpec, body: Bytes) -> Result<String, StoreError> {
        self.calls.put_object.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("injected PutObject failure".into()));
        }
        self.memory.put_object(spec, body).await
    }

    async fn create_multipart_upload(&self, spec: &ObjectSpec) -> Result<String, StoreError> {
        self.calls.create_multipart.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(
                "injected CreateMultipartUpload failure".into(),
            ));
        }
        self.memory.create_multipart_upload(spec).await
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, StoreError> {
        self.calls.upload_part.fetch_add(1, Ordering::SeqCst);
        if self.fail_part.load(Ordering::SeqCst) == part_number {
            return Err(StoreError::Transport(format!(
                "injected UploadPart failure for part {part_number}"
            )));
        }
        self.memory
            .upload_part(key, upload_id, part_number, body)
            .await
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<String, StoreError> {
        self.calls.complete_multipart.fetch_add(1, Ordering::SeqCst);
        *self.completed_parts.lock() = Some(parts.to_vec());
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(
                "injected CompleteMultipartUpload failure".into(),
            ));
        }
        self.memory
            .complete_multipart_upload(key, upload_id, parts)
            .await
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), StoreError> {
        self.calls.abort_multipart.fetch_add(1, Ordering::SeqCst);
        self.aborted_ids.lock().push(upload_id.to_string());
        if self.fail_abort.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(
                "injected AbortMultipartUpload failure".into(),
            ));
        }
        self.memory.abort_multipart_upload(key, upload_id).await
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.calls.delete_object.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("injected DeleteObject failure".into()));
        }
        self.memory.delete_object(key).await
    }
}

/// A config pointing at a fictional bucket, with a CDN base configured.
pub fn test_config() -> Config {
    let yaml = r#"
storage:
  bucket: test-bucket
  region: us-east-1
  access_key_id: test-access
  secret_access_key: test-secret
cdn:
  base_url: https://cdn.example.com
upload:
  folder: uploads
  acl: public-read
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    config
}

/// Same config with the validation cap raised so multipart is reachable.
pub fn test_config_with_cap(max_size_bytes: u64) -> Config {
    let mut config = test_config();
    config.upload.max_size_bytes = max_size_bytes;
    config
}

/// A blob whose bytes follow a position-dependent pattern, so reassembly
/// order mistakes change the content.
pub fn patterned_blob(name: &str, content_type: &str, size: usize) -> Blob {
    let bytes: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    Blob::new(name, content_type, Bytes::from(bytes))
}
