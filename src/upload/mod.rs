//! Upload module
//!
//! The transfer engines and everything they share: the blob and options
//! types, the error taxonomy, public URL derivation, and the [`Uploader`]
//! facade that picks single-shot or multipart per blob size.
//!
//! # Example
//!
//! ```no_run
//! use picshuttle::config::Config;
//! use picshuttle::store::s3::S3ObjectStore;
//! use picshuttle::upload::{progress, Blob, UploadOptions, Uploader};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("picshuttle.yaml")?;
//! let store = Arc::new(S3ObjectStore::connect(&config.storage).await);
//! let uploader = Uploader::new(store, &config);
//!
//! let blob = Blob::new("photo.png", "image/png", vec![0u8; 64].into());
//! let (progress_tx, _progress_rx) = progress::channel();
//! let uploaded = uploader
//!     .upload(&blob, &UploadOptions::default(), &progress_tx)
//!     .await?;
//! println!("{}", uploaded.url);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::store::{ObjectSpec, ObjectStore, StoreError};
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod delete;
pub mod multipart;
pub mod naming;
pub mod progress;
pub mod put_object;
pub mod strategy;
pub mod validate;

pub use crate::store::Acl;
pub use delete::DeleteHandler;
pub use multipart::MultipartHandler;
pub use progress::ProgressSender;
pub use put_object::PutObjectHandler;

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    /// Blob rejected before any store call was made
    #[error("{0}")]
    Validation(String),

    /// A store call failed (network, auth, quota)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Missing or duplicate part detected before completion. This is an
    /// engine defect, not a recoverable upload failure.
    #[error("multipart upload corrupted: {0}")]
    Integrity(String),
}

/// An immutable binary blob selected for upload
#[derive(Debug, Clone)]
pub struct Blob {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Blob {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Per-upload options
///
/// Absent fields fall back to values derived from the blob: a generated
/// unique file name and the blob's own content type.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub folder: Option<String>,
    pub acl: Acl,
    pub metadata: Option<HashMap<String, String>>,
}

/// An object the store accepted, before URL resolution
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub key: String,
    pub etag: String,
}

/// A finished upload with its resolved public URL
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub key: String,
    pub url: String,
}

/// The normalized result surfaced to callers
///
/// `url` and `key` are present iff `success`; `error` is present iff
/// `!success`. Engines never leak part-level detail into this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn succeeded(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            key: Some(key.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            key: None,
            error: Some(error.into()),
        }
    }
}

/// Derives the public URL for a stored object
///
/// The store URL is `https://<bucket>.s3.<region>.amazonaws.com/<key>`. When
/// a CDN base is configured, that prefix is textually replaced with the CDN
/// base before the URL is published. No network call is involved.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    bucket: String,
    region: String,
    cdn_base: Option<String>,
}

impl UrlResolver {
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        cdn_base: Option<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            cdn_base: cdn_base.map(|base| base.trim_end_matches('/').to_string()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.storage.bucket.clone(),
            config.storage.region.clone(),
            config.cdn.as_ref().map(|cdn| cdn.base_url.clone()),
        )
    }

    fn store_prefix(&self) -> String {
        format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region)
    }

    /// The raw store URL, before CDN substitution
    pub fn store_url(&self, key: &str) -> String {
        format!("{}/{}", self.store_prefix(), key)
    }

    /// The URL to publish, with the CDN substitution applied when configured
    pub fn public_url(&self, key: &str) -> String {
        let url = self.store_url(key);
        match self.cdn_base {
            Some(ref base) => url.replace(&self.store_prefix(), base),
            None => url,
        }
    }
}

/// Combine options and blob into the object the store will be asked to create.
///
/// A missing file name is generated from the blob's original name; a missing
/// content type falls back to the blob's own.
pub(crate) fn object_spec(blob: &Blob, options: &UploadOptions) -> ObjectSpec {
    let file_name = options
        .file_name
        .clone()
        .unwrap_or_else(|| naming::unique_name(&blob.name));
    ObjectSpec {
        key: naming::object_key(options.folder.as_deref(), &file_name),
        content_type: options
            .content_type
            .clone()
            .unwrap_or_else(|| blob.content_type.clone()),
        acl: options.acl,
        metadata: options.metadata.clone(),
    }
}

/// Upload facade
///
/// Owns the three engines and the URL resolver. Picks the transfer strategy
/// per blob size, drives the chosen engine to completion, and resolves the
/// public URL of the stored object.
pub struct Uploader {
    put_object: PutObjectHandler,
    multipart: MultipartHandler,
    delete: DeleteHandler,
    urls: UrlResolver,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>, config: &Config) -> Self {
        Self {
            put_object: PutObjectHandler::new(store.clone(), config.upload.max_size_bytes),
            multipart: MultipartHandler::new(
                store.clone(),
                config.upload.max_size_bytes,
                config.upload.concurrent_parts,
            ),
            delete: DeleteHandler::new(store),
            urls: UrlResolver::from_config(config),
        }
    }

    pub fn urls(&self) -> &UrlResolver {
        &self.urls
    }

    /// Upload a blob with the strategy its size calls for.
    ///
    /// Progress is delivered through `progress`: per-part for multipart,
    /// a single jump to 100 on single-shot success.
    pub async fn upload(
        &self,
        blob: &Blob,
        options: &UploadOptions,
        progress: &ProgressSender,
    ) -> Result<Uploaded, UploadError> {
        let stored = match strategy::select(blob.size_bytes()) {
            strategy::Strategy::Multipart => self.multipart.upload(blob, options, progress).await?,
            strategy::Strategy::Single => {
                let stored = self.put_object.upload(blob, options).await?;
                progress.report(100);
                stored
            }
        };

        Ok(Uploaded {
            url: self.urls.public_url(&stored.key),
            key: stored.key,
        })
    }

    /// Remove a previously uploaded object by key
    pub async fn remove(&self, key: &str) -> Result<(), UploadError> {
        self.delete.remove(key).await
    }
}
