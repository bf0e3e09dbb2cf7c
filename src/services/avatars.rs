/// Avatar service - replaces or removes a user's profile picture
///
/// Replacement never goes through a state where the user document points at
/// a dead blob: the new blob is uploaded first, the document is switched
/// over, and only then is the old blob reclaimed. Reclaim failures leave an
/// orphaned blob, not a broken profile.
use std::sync::Arc;
use std::time::Duration;

use crate::config::OpsConfig;
use crate::db::UserRecords;
use crate::error::{AppError, CompensationFailure, Result};
use crate::models::{MediaPayload, User};
use crate::stores::{with_deadline, BlobStore};

pub struct AvatarService {
    blobs: Arc<dyn BlobStore>,
    users: Arc<UserRecords>,
    op_timeout: Duration,
}

impl AvatarService {
    pub fn new(blobs: Arc<dyn BlobStore>, users: Arc<UserRecords>, ops: &OpsConfig) -> Self {
        Self {
            blobs,
            users,
            op_timeout: ops.operation_timeout,
        }
    }

    /// Replace the user's avatar with `payload`.
    pub async fn swap_avatar(&self, user_id: &str, payload: MediaPayload) -> Result<User> {
        if payload.bytes.is_empty() {
            return Err(AppError::Validation("avatar payload is empty".to_string()));
        }

        with_deadline(
            "avatar swap",
            self.op_timeout,
            self.run_swap(user_id, payload),
        )
        .await
    }

    async fn run_swap(&self, user_id: &str, payload: MediaPayload) -> Result<User> {
        let current = self.users.get(user_id).await?;
        let new_blob = self.blobs.put(payload.bytes, &payload.file_name).await?;

        let updated = match self
            .users
            .update_avatar(user_id, &new_blob.url, &new_blob.id)
            .await
        {
            Ok(user) => user,
            Err(err) => {
                // The old avatar is still referenced and intact; only the
                // unreferenced new blob needs to go.
                if let Err(cleanup) = self.blobs.delete(&new_blob.id).await {
                    CompensationFailure::new("avatar swap", &new_blob.id, cleanup).record();
                }
                return Err(err);
            }
        };

        if let Some(old) = current.avatar_blob_id {
            if old != new_blob.id {
                if let Err(err) = self.blobs.delete(&old).await {
                    CompensationFailure::new("avatar reclaim", &old, err).record();
                }
            }
        }

        tracing::info!(user_id, blob_id = %new_blob.id, "avatar replaced");
        Ok(updated)
    }

    /// Clear the user's avatar, reclaiming its blob best-effort.
    pub async fn remove_avatar(&self, user_id: &str) -> Result<User> {
        with_deadline("avatar removal", self.op_timeout, async {
            let current = self.users.get(user_id).await?;
            let updated = self.users.clear_avatar(user_id).await?;

            if let Some(old) = current.avatar_blob_id {
                if let Err(err) = self.blobs.delete(&old).await {
                    CompensationFailure::new("avatar removal", &old, err).record();
                }
            }

            tracing::info!(user_id, "avatar removed");
            Ok(updated)
        })
        .await
    }
}
