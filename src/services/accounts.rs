/// Account deletion service - cascading, best-effort, non-atomic by design
///
/// Deleting an account removes every post (document + blob) under a bounded
/// worker pool, then the user document, then the identity record. Per-post
/// failures are collected and logged but never abort the cascade; only the
/// user-document and identity steps are fatal. A user asking to be deleted
/// must not be blocked by one post's storage hiccup.
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::config::OpsConfig;
use crate::db::{PostRecords, UserRecords};
use crate::error::{AppError, Result};
use crate::models::Post;
use crate::stores::{with_deadline, BlobStore, IdentityProvider};

/// One failed step of the per-post cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct PostCleanupFailure {
    pub post_id: String,
    /// "document" or "blob"
    pub stage: &'static str,
    pub message: String,
}

/// Telemetry summary of a completed account deletion.
///
/// `failures` being non-empty does not make the operation a failure; the
/// orphaned artifacts are consistency debt tracked through logs.
#[derive(Debug, Default)]
pub struct AccountDeletionReport {
    pub posts_found: usize,
    pub documents_deleted: usize,
    pub blobs_deleted: usize,
    pub failures: Vec<PostCleanupFailure>,
}

struct PostCleanup {
    document_deleted: bool,
    blob_deleted: bool,
    failures: Vec<PostCleanupFailure>,
}

pub struct AccountService {
    blobs: Arc<dyn BlobStore>,
    users: Arc<UserRecords>,
    posts: Arc<PostRecords>,
    identity: Arc<dyn IdentityProvider>,
    delete_concurrency: usize,
    op_timeout: Duration,
}

impl AccountService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        users: Arc<UserRecords>,
        posts: Arc<PostRecords>,
        identity: Arc<dyn IdentityProvider>,
        ops: &OpsConfig,
    ) -> Self {
        Self {
            blobs,
            users,
            posts,
            identity,
            delete_concurrency: ops.delete_concurrency,
            op_timeout: ops.operation_timeout,
        }
    }

    /// Delete `user_id`'s account: all posts, the user document, and the
    /// identity record, in that order.
    pub async fn delete_account(
        &self,
        user_id: &str,
        identity_id: &str,
    ) -> Result<AccountDeletionReport> {
        if user_id.trim().is_empty() || identity_id.trim().is_empty() {
            return Err(AppError::Validation(
                "user id and identity id are required".to_string(),
            ));
        }

        with_deadline(
            "account deletion",
            self.op_timeout,
            self.run_deletion(user_id, identity_id),
        )
        .await
    }

    async fn run_deletion(&self, user_id: &str, identity_id: &str) -> Result<AccountDeletionReport> {
        let posts = self.posts.by_owner(user_id).await?;
        let mut report = AccountDeletionReport {
            posts_found: posts.len(),
            ..Default::default()
        };

        // Bounded fan-out; every cleanup finishes (or fails) before the
        // user document goes away.
        let outcomes: Vec<PostCleanup> = stream::iter(posts)
            .map(|post| self.clean_up_post(post))
            .buffer_unordered(self.delete_concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            report.documents_deleted += usize::from(outcome.document_deleted);
            report.blobs_deleted += usize::from(outcome.blob_deleted);
            report.failures.extend(outcome.failures);
        }
        if !report.failures.is_empty() {
            tracing::warn!(
                user_id,
                failed = report.failures.len(),
                "account cascade left orphaned post artifacts"
            );
        }

        self.users.delete(user_id).await?;
        self.identity.delete_identity(identity_id).await?;

        tracing::info!(
            user_id,
            identity_id,
            posts = report.posts_found,
            "account deleted"
        );
        Ok(report)
    }

    async fn clean_up_post(&self, post: Post) -> PostCleanup {
        let mut cleanup = PostCleanup {
            document_deleted: false,
            blob_deleted: false,
            failures: Vec::new(),
        };

        match self.posts.delete(&post.id).await {
            Ok(()) => cleanup.document_deleted = true,
            Err(err) => {
                tracing::warn!(post_id = %post.id, error = %err, "post document deletion failed during cascade");
                cleanup.failures.push(PostCleanupFailure {
                    post_id: post.id.clone(),
                    stage: "document",
                    message: err.to_string(),
                });
            }
        }

        if !post.blob_id.is_empty() {
            match self.blobs.delete(&post.blob_id).await {
                Ok(()) => cleanup.blob_deleted = true,
                Err(err) => {
                    tracing::warn!(
                        post_id = %post.id,
                        blob_id = %post.blob_id,
                        error = %err,
                        "post blob deletion failed during cascade"
                    );
                    cleanup.failures.push(PostCleanupFailure {
                        post_id: post.id,
                        stage: "blob",
                        message: err.to_string(),
                    });
                }
            }
        }

        cleanup
    }
}
