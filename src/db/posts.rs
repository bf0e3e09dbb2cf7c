use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{MediaType, Post, PostFields};
use crate::stores::{DocumentStore, Predicate};

/// A post to be created.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: String,
    pub blob_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
}

/// Repository for post documents.
pub struct PostRecords {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl PostRecords {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn create(&self, new: NewPost) -> Result<Post> {
        let fields = PostFields {
            owner_id: new.owner_id,
            blob_id: new.blob_id,
            url: new.url,
            title: new.title,
            description: new.description,
            media_type: new.media_type,
            created_at: new.created_at,
        };
        let fields = serde_json::to_value(fields)
            .map_err(|e| AppError::DocumentStore(format!("failed to encode post fields: {e}")))?;
        let doc = self.store.create(&self.collection, fields).await?;
        Post::from_document(doc)
    }

    pub async fn get(&self, id: &str) -> Result<Post> {
        let doc = self.store.read(&self.collection, id).await?;
        Post::from_document(doc)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(&self.collection, id).await
    }

    /// All posts owned by `owner_id`.
    pub async fn by_owner(&self, owner_id: &str) -> Result<Vec<Post>> {
        let docs = self
            .store
            .query(
                &self.collection,
                vec![Predicate::equal("ownerId", owner_id)],
            )
            .await?;
        docs.into_iter().map(Post::from_document).collect()
    }

    /// Posts owned by any of `owner_ids`, excluding avatar markers.
    ///
    /// The caller keeps `owner_ids` bounded (chunking large sets); a single
    /// call issues exactly one membership predicate.
    pub async fn visible_by_owners(&self, owner_ids: &[String]) -> Result<Vec<Post>> {
        let docs = self
            .store
            .query(
                &self.collection,
                vec![
                    Predicate::value_in_set("ownerId", owner_ids.iter().map(String::as_str)),
                    Predicate::not_equal("mediaType", MediaType::Avatar.as_str()),
                ],
            )
            .await?;
        docs.into_iter().map(Post::from_document).collect()
    }
}
