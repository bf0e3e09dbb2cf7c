use std::sync::Arc;

use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{User, UserFields};
use crate::stores::{DocumentStore, Predicate};

/// A user profile to be created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub account_id: String,
}

/// Repository for user documents.
pub struct UserRecords {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl UserRecords {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn create(&self, new: NewUser) -> Result<User> {
        let fields = UserFields {
            username: new.username,
            email: new.email,
            avatar_url: String::new(),
            avatar_blob_id: String::new(),
            privacy: false,
            account_id: new.account_id,
        };
        let fields = serde_json::to_value(fields)
            .map_err(|e| AppError::DocumentStore(format!("failed to encode user fields: {e}")))?;
        let doc = self.store.create(&self.collection, fields).await?;
        User::from_document(doc)
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        let doc = self.store.read(&self.collection, id).await?;
        User::from_document(doc)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one(Predicate::equal("email", email)).await
    }

    /// Resolve a user document by its identity-provider account id.
    pub async fn find_by_account(&self, account_id: &str) -> Result<Option<User>> {
        self.find_one(Predicate::equal("accountId", account_id)).await
    }

    async fn find_one(&self, predicate: Predicate) -> Result<Option<User>> {
        let docs = self.store.query(&self.collection, vec![predicate]).await?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(User::from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// All users whose profile is public.
    pub async fn list_public(&self) -> Result<Vec<User>> {
        let docs = self
            .store
            .query(&self.collection, vec![Predicate::equal("privacy", false)])
            .await?;
        docs.into_iter().map(User::from_document).collect()
    }

    pub async fn update_avatar(&self, id: &str, url: &str, blob_id: &str) -> Result<User> {
        self.update(id, json!({ "avatarUrl": url, "avatarBlobId": blob_id }))
            .await
    }

    pub async fn clear_avatar(&self, id: &str) -> Result<User> {
        self.update(id, json!({ "avatarUrl": "", "avatarBlobId": "" }))
            .await
    }

    pub async fn update_username(&self, id: &str, username: &str) -> Result<User> {
        self.update(id, json!({ "username": username })).await
    }

    pub async fn update_email(&self, id: &str, email: &str) -> Result<User> {
        self.update(id, json!({ "email": email })).await
    }

    pub async fn set_privacy(&self, id: &str, private: bool) -> Result<User> {
        self.update(id, json!({ "privacy": private })).await
    }

    async fn update(&self, id: &str, fields: serde_json::Value) -> Result<User> {
        let doc = self.store.update(&self.collection, id, fields).await?;
        User::from_document(doc)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(&self.collection, id).await
    }
}
