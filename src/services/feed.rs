/// Feed service - privacy-filtered post listing
///
/// Visibility is a property of the owner, not the post, so the public feed
/// is a two-phase query: public owners first, then their posts. Avatar
/// markers are excluded unconditionally.
use std::sync::Arc;
use std::time::Duration;

use crate::config::OpsConfig;
use crate::db::{PostRecords, UserRecords};
use crate::error::Result;
use crate::models::Post;
use crate::stores::with_deadline;

pub struct FeedService {
    users: Arc<UserRecords>,
    posts: Arc<PostRecords>,
    max_in_set: usize,
    op_timeout: Duration,
}

impl FeedService {
    pub fn new(users: Arc<UserRecords>, posts: Arc<PostRecords>, ops: &OpsConfig) -> Self {
        Self {
            users,
            posts,
            max_in_set: ops.max_in_set,
            op_timeout: ops.operation_timeout,
        }
    }

    /// All posts owned by non-private users, newest first.
    ///
    /// Zero public users is an empty feed, not an error. The newest-first
    /// ordering is applied here; the stores promise none.
    pub async fn list_public_posts(&self) -> Result<Vec<Post>> {
        with_deadline("public feed", self.op_timeout, self.run_public_listing()).await
    }

    async fn run_public_listing(&self) -> Result<Vec<Post>> {
        let owners = self.users.list_public().await?;
        if owners.is_empty() {
            return Ok(Vec::new());
        }
        let owner_ids: Vec<String> = owners.into_iter().map(|u| u.id).collect();

        // Membership predicates stay bounded; a large public population
        // becomes several queries instead of one unbounded one.
        let mut posts = Vec::new();
        for chunk in owner_ids.chunks(self.max_in_set) {
            posts.extend(self.posts.visible_by_owners(chunk).await?);
        }

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// All posts owned by one user, regardless of privacy.
    pub async fn list_user_posts(&self, owner_id: &str) -> Result<Vec<Post>> {
        with_deadline(
            "user posts",
            self.op_timeout,
            self.posts.by_owner(owner_id),
        )
        .await
    }
}
