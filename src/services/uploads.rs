/// Media upload service - publishes a post as a blob + document pair
///
/// The two writes have no shared transaction. Ordering and compensation
/// keep the stores consistent: the blob goes in first, and if the document
/// side fails for any reason the blob is deleted again, so a failed upload
/// leaves nothing servable behind. The caller always sees the original
/// error, never the cleanup's.
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::OpsConfig;
use crate::db::{NewPost, PostRecords, UserRecords};
use crate::error::{AppError, CompensationFailure, Result};
use crate::models::{MediaPayload, MediaType, Post};
use crate::stores::{with_deadline, BlobStore, StoredBlob};

pub struct UploadService {
    blobs: Arc<dyn BlobStore>,
    users: Arc<UserRecords>,
    posts: Arc<PostRecords>,
    op_timeout: Duration,
}

impl UploadService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        users: Arc<UserRecords>,
        posts: Arc<PostRecords>,
        ops: &OpsConfig,
    ) -> Self {
        Self {
            blobs,
            users,
            posts,
            op_timeout: ops.operation_timeout,
        }
    }

    /// Publish a media post owned by `owner_id`.
    ///
    /// Validation happens before any store is touched; a validation failure
    /// has zero side effects.
    pub async fn upload(
        &self,
        owner_id: &str,
        payload: MediaPayload,
        title: &str,
        description: &str,
    ) -> Result<Post> {
        if payload.bytes.is_empty() {
            return Err(AppError::Validation("media payload is empty".to_string()));
        }
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(AppError::Validation(
                "title and description are required".to_string(),
            ));
        }

        with_deadline(
            "media upload",
            self.op_timeout,
            self.run_upload(owner_id, payload, title, description),
        )
        .await
    }

    async fn run_upload(
        &self,
        owner_id: &str,
        payload: MediaPayload,
        title: &str,
        description: &str,
    ) -> Result<Post> {
        let media_type = MediaType::from_file_name(&payload.file_name);
        let blob = self.blobs.put(payload.bytes, &payload.file_name).await?;
        tracing::debug!(blob_id = %blob.id, %media_type, "media blob stored");

        match self
            .publish(owner_id, &blob, media_type, title, description)
            .await
        {
            Ok(post) => {
                tracing::info!(post_id = %post.id, owner_id, %media_type, "post published");
                Ok(post)
            }
            Err(err) => {
                // Unwind the blob so a failed publish leaves nothing servable.
                if let Err(cleanup) = self.blobs.delete(&blob.id).await {
                    CompensationFailure::new("media upload", &blob.id, cleanup).record();
                }
                Err(err)
            }
        }
    }

    async fn publish(
        &self,
        owner_id: &str,
        blob: &StoredBlob,
        media_type: MediaType,
        title: &str,
        description: &str,
    ) -> Result<Post> {
        let owner = self.users.get(owner_id).await?;
        self.posts
            .create(NewPost {
                owner_id: owner.id,
                blob_id: blob.id.clone(),
                url: blob.url.clone(),
                title: title.to_string(),
                description: description.to_string(),
                media_type,
                created_at: Utc::now(),
            })
            .await
    }

    /// Unpublish a post: document first, then its blob.
    ///
    /// A blob that survives its document is tolerated orphanage (logged,
    /// never surfaced); the post stopped being visible the moment the
    /// document went away.
    pub async fn delete_post(&self, post: &Post) -> Result<()> {
        with_deadline("post deletion", self.op_timeout, async {
            self.posts.delete(&post.id).await?;
            if !post.blob_id.is_empty() {
                if let Err(err) = self.blobs.delete(&post.blob_id).await {
                    CompensationFailure::new("post deletion", &post.blob_id, err).record();
                }
            }
            tracing::info!(post_id = %post.id, "post deleted");
            Ok(())
        })
        .await
    }
}
