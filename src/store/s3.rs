//! AWS S3 backed object store
//!
//! Builds an AWS SDK client from [`StorageConfig`]: static credentials with an
//! optional session token, and an optional endpoint override for
//! S3-compatible services (the override switches to path-style addressing so
//! local endpoints like MinIO resolve without virtual-host DNS).

use crate::config::StorageConfig;
use crate::store::{Acl, CompletedPart, ObjectSpec, ObjectStore, StoreError};
use async_trait::async_trait;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    CompletedMultipartUpload, CompletedPart as S3CompletedPart, ObjectCannedAcl,
};
use bytes::Bytes;

/// Format an SDK failure as a transport error, preferring the service's
/// error code and message when the request made it to the store.
fn transport_error<E, R>(operation: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let detail = match err.as_service_error() {
        Some(service) => format!(
            "{}: {}",
            service.code().unwrap_or("unknown"),
            service.message().unwrap_or("no message")
        ),
        None => err.to_string(),
    };
    StoreError::Transport(format!("{operation} failed: {detail}"))
}

fn canned_acl(acl: Acl) -> ObjectCannedAcl {
    match acl {
        Acl::Private => ObjectCannedAcl::Private,
        Acl::PublicRead => ObjectCannedAcl::PublicRead,
        Acl::PublicReadWrite => ObjectCannedAcl::PublicReadWrite,
    }
}

/// S3 object store
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from storage configuration
    pub async fn connect(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.session_token.clone(),
            None,
            "picshuttle-static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(SharedCredentialsProvider::new(credentials))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(
        name = "s3.put_object",
        skip(self, spec, body),
        fields(
            s3.bucket = %self.bucket,
            s3.key = %spec.key,
            upload.bytes = body.len(),
        ),
        err
    )]
    async fn put_object(&self, spec: &ObjectSpec, body: Bytes) -> Result<String, StoreError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&spec.key)
            .body(ByteStream::from(body))
            .content_type(&spec.content_type)
            .acl(canned_acl(spec.acl));
        if let Some(ref metadata) = spec.metadata {
            for (name, value) in metadata {
                request = request.metadata(name, value);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error("PutObject", e))?;

        let etag = response.e_tag().unwrap_or_default().to_string();
        tracing::info!(etag = %etag, "PutObject completed");
        Ok(etag)
    }

    #[tracing::instrument(
        name = "s3.create_multipart_upload",
        skip(self, spec),
        fields(s3.bucket = %self.bucket, s3.key = %spec.key),
        err
    )]
    async fn create_multipart_upload(&self, spec: &ObjectSpec) -> Result<String, StoreError> {
        let mut request = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(&spec.key)
            .content_type(&spec.content_type)
            .acl(canned_acl(spec.acl));
        if let Some(ref metadata) = spec.metadata {
            for (name, value) in metadata {
                request = request.metadata(name, value);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error("CreateMultipartUpload", e))?;

        let upload_id = response
            .upload_id()
            .ok_or_else(|| {
                StoreError::Response("CreateMultipartUpload returned no upload id".into())
            })?
            .to_string();
        tracing::info!(upload_id = %upload_id, "CreateMultipartUpload completed");
        Ok(upload_id)
    }

    #[tracing::instrument(
        name = "s3.upload_part",
        skip(self, body),
        fields(
            s3.bucket = %self.bucket,
            s3.key = %key,
            s3.upload_id = %upload_id,
            s3.part_number = part_number,
            upload.bytes = body.len(),
        ),
        err
    )]
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String, StoreError> {
        let response = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number as i32)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| transport_error("UploadPart", e))?;

        // The entity tag is required to commit the part later.
        let etag = response
            .e_tag()
            .ok_or_else(|| StoreError::Response("UploadPart returned no entity tag".into()))?
            .to_string();
        tracing::debug!(etag = %etag, "UploadPart completed");
        Ok(etag)
    }

    #[tracing::instrument(
        name = "s3.complete_multipart_upload",
        skip(self, parts),
        fields(
            s3.bucket = %self.bucket,
            s3.key = %key,
            s3.upload_id = %upload_id,
            parts_count = parts.len(),
        ),
        err
    )]
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<String, StoreError> {
        let completed: Vec<S3CompletedPart> = parts
            .iter()
            .map(|part| {
                S3CompletedPart::builder()
                    .part_number(part.part_number as i32)
                    .e_tag(part.etag.as_str())
                    .build()
            })
            .collect();

        let response = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| transport_error("CompleteMultipartUpload", e))?;

        let etag = response.e_tag().unwrap_or_default().to_string();
        tracing::info!(etag = %etag, "CompleteMultipartUpload completed");
        Ok(etag)
    }

    #[tracing::instrument(
        name = "s3.abort_multipart_upload",
        skip(self),
        fields(s3.bucket = %self.bucket, s3.key = %key, s3.upload_id = %upload_id),
        err
    )]
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> Result<(), StoreError> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| transport_error("AbortMultipartUpload", e))?;

        tracing::info!("AbortMultipartUpload completed");
        Ok(())
    }

    #[tracing::instrument(
        name = "s3.delete_object",
        skip(self),
        fields(s3.bucket = %self.bucket, s3.key = %key),
        err
    )]
    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| transport_error("DeleteObject", e))?;

        tracing::info!("DeleteObject completed");
        Ok(())
    }
}
