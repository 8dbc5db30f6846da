//! Object store protocol
//!
//! The transfer engines speak to remote storage through the [`ObjectStore`]
//! trait: the six request/response calls the pipeline needs and nothing else.
//! `store::s3` implements the trait against AWS S3 (or any S3-compatible
//! endpoint); `store::memory` is an in-memory implementation for tests and
//! local development.
//!
//! # Example
//!
//! ```no_run
//! use picshuttle::store::{memory::MemoryStore, Acl, ObjectSpec, ObjectStore};
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let spec = ObjectSpec {
//!     key: "uploads/hello.png".to_string(),
//!     content_type: "image/png".to_string(),
//!     acl: Acl::PublicRead,
//!     metadata: None,
//! };
//! let etag = store.put_object(&spec, Bytes::from_static(b"\x89PNG")).await?;
//! println!("ETag: {}", etag);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod memory;
pub mod s3;

/// Object store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response error: {0}")]
    Response(String),
}

/// Access-control designation applied to an uploaded object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Acl {
    #[default]
    Private,
    PublicRead,
    PublicReadWrite,
}

impl Acl {
    /// Canned ACL name as the store protocol spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::Private => "private",
            Acl::PublicRead => "public-read",
            Acl::PublicReadWrite => "public-read-write",
        }
    }
}

/// Everything a store call needs to know about the target object,
/// apart from the body itself.
#[derive(Debug, Clone)]
pub struct ObjectSpec {
    pub key: String,
    pub content_type: String,
    pub acl: Acl,
    pub metadata: Option<HashMap<String, String>>,
}

/// A part that finished uploading within a multipart session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// The object store protocol
///
/// Each method is one request/response call. Implementations carry the bucket
/// and credentials; callers only supply keys, bodies, and object metadata.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object in a single call, returning its entity tag.
    async fn put_object(&self, spec: &ObjectSpec, body: Bytes) -> Result<String, StoreError>;

    /// Open a multipart session, returning the upload id.
    async fn create_multipart_upload(&self, spec: &ObjectSpec) -> Result<String, StoreError>;

    /// Upload one part of an open session, returning the part's entity tag.
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, StoreError>;

    /// Commit a session from its ordered part list, returning the object's
    /// entity tag.
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<String, StoreError>;

    /// Abandon an open session so its parts stop accruing storage cost.
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), StoreError>;

    /// Remove an object by key.
    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_names() {
        assert_eq!(Acl::Private.as_str(), "private");
        assert_eq!(Acl::PublicRead.as_str(), "public-read");
        assert_eq!(Acl::PublicReadWrite.as_str(), "public-read-write");
    }

    #[test]
    fn test_acl_deserializes_kebab_case() {
        let acl: Acl = serde_yaml::from_str("public-read").unwrap();
        assert_eq!(acl, Acl::PublicRead);
    }

    #[test]
    fn test_acl_default_is_private() {
        assert_eq!(Acl::default(), Acl::Private);
    }
}
