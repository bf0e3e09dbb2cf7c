/// S3-backed blob store
///
/// Blob ids are opaque object keys: a fresh UUID plus a sanitized rendering
/// of the original file name. The public URL is derived from a configured
/// base, so `url_for` never makes a store call.
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use uuid::Uuid;

use crate::config::BlobStoreConfig;
use crate::error::{AppError, Result};
use crate::stores::{BlobStore, StoredBlob};

pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base_url: String,
    call_timeout: Duration,
}

impl S3BlobStore {
    /// Build an S3 client from the provided configuration.
    pub async fn new(config: &BlobStoreConfig, call_timeout: Duration) -> Result<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "medley-service",
        );

        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint {
            if !endpoint.trim().is_empty() {
                builder = builder.endpoint_url(endpoint).force_path_style(true);
            }
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            call_timeout,
        })
    }

    fn object_key(name: &str) -> String {
        let safe: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        format!("{}-{}", Uuid::new_v4(), safe)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, bytes: Vec<u8>, name: &str) -> Result<StoredBlob> {
        let blob_id = Self::object_key(name);

        let send = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&blob_id)
            .body(ByteStream::from(bytes))
            .send();

        tokio::time::timeout(self.call_timeout, send)
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "blob put exceeded {}ms",
                    self.call_timeout.as_millis()
                ))
            })?
            .map_err(|e| AppError::BlobStore(format!("blob put failed: {e}")))?;

        let url = self.url_for(&blob_id);
        Ok(StoredBlob { id: blob_id, url })
    }

    async fn delete(&self, blob_id: &str) -> Result<()> {
        let send = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(blob_id)
            .send();

        tokio::time::timeout(self.call_timeout, send)
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "blob delete exceeded {}ms",
                    self.call_timeout.as_millis()
                ))
            })?
            .map_err(|e| AppError::BlobStore(format!("blob delete failed: {e}")))?;

        Ok(())
    }

    fn url_for(&self, blob_id: &str) -> String {
        format!("{}/{}", self.public_base_url, blob_id)
    }
}
