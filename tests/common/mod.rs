//! In-memory fake stores for integration tests
//!
//! The fakes implement the three store seams over plain maps, with call
//! counters and injectable failures so tests can pin down exactly which
//! store calls a coordinator makes.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use medley_service::config::OpsConfig;
use medley_service::db::{PostRecords, UserRecords};
use medley_service::error::{AppError, Result};
use medley_service::services::{
    AccountService, AuthService, AvatarService, FeedService, ProfileService, UploadService,
};
use medley_service::stores::{
    BlobStore, Challenge, Document, DocumentStore, IdentityField, IdentityProvider, Predicate,
    SessionToken, StoredBlob,
};

pub const USERS: &str = "users";
pub const POSTS: &str = "posts";

// ============================================
// Fake blob store
// ============================================

#[derive(Default)]
pub struct FakeBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    put_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_puts: AtomicBool,
    failing_deletes: Mutex<HashSet<String>>,
}

impl FakeBlobStore {
    pub fn seed(&self, blob_id: &str) {
        self.blobs
            .lock()
            .unwrap()
            .insert(blob_id.to_string(), vec![0]);
    }

    pub fn contains(&self, blob_id: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(blob_id)
    }

    pub fn live_blobs(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    pub fn fail_delete_of(&self, blob_id: &str) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(blob_id.to_string());
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn put(&self, bytes: Vec<u8>, name: &str) -> Result<StoredBlob> {
        let call = self.put_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::BlobStore("injected put failure".to_string()));
        }
        let id = format!("blob-{call}-{name}");
        self.blobs.lock().unwrap().insert(id.clone(), bytes);
        let url = self.url_for(&id);
        Ok(StoredBlob { id, url })
    }

    async fn delete(&self, blob_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.lock().unwrap().contains(blob_id) {
            return Err(AppError::BlobStore(format!(
                "injected delete failure for {blob_id}"
            )));
        }
        self.blobs.lock().unwrap().remove(blob_id);
        Ok(())
    }

    fn url_for(&self, blob_id: &str) -> String {
        format!("http://blobs.test/{blob_id}")
    }
}

// ============================================
// Fake document store
// ============================================

#[derive(Default)]
pub struct FakeDocumentStore {
    collections: Mutex<HashMap<String, Vec<(String, Value)>>>,
    next_id: AtomicUsize,
    total_calls: AtomicUsize,
    delete_log: Mutex<Vec<(String, String)>>,
    fail_create_in: Mutex<Option<String>>,
    fail_delete_in: Mutex<Option<String>>,
    fail_delete_ids: Mutex<HashSet<String>>,
}

impl FakeDocumentStore {
    /// Insert a document directly, bypassing counters and failure hooks.
    pub fn seed(&self, collection: &str, fields: Value) -> String {
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), fields));
        id
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn get_fields(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
            .map(|(_, fields)| fields.clone())
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Deletion attempts, in order, as (collection, id) pairs.
    pub fn delete_log(&self) -> Vec<(String, String)> {
        self.delete_log.lock().unwrap().clone()
    }

    pub fn fail_creates_in(&self, collection: &str) {
        *self.fail_create_in.lock().unwrap() = Some(collection.to_string());
    }

    pub fn fail_deletes_in(&self, collection: &str) {
        *self.fail_delete_in.lock().unwrap() = Some(collection.to_string());
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.fail_delete_ids.lock().unwrap().insert(id.to_string());
    }

    fn matches(fields: &Value, predicate: &Predicate) -> bool {
        let get = |field: &str| fields.get(field).cloned().unwrap_or(Value::Null);
        match predicate {
            Predicate::Equal { field, value } => get(field) == *value,
            Predicate::NotEqual { field, value } => get(field) != *value,
            Predicate::ValueInSet { field, values } => values.contains(&get(field)),
        }
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn create(&self, collection: &str, fields: Value) -> Result<Document> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_in.lock().unwrap().as_deref() == Some(collection) {
            return Err(AppError::DocumentStore(format!(
                "injected create failure in {collection}"
            )));
        }
        let id = self.seed(collection, fields.clone());
        Ok(Document { id, fields })
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Document> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        self.get_fields(collection, id)
            .map(|fields| Document {
                id: id.to_string(),
                fields,
            })
            .ok_or_else(|| AppError::NotFound(format!("{collection}/{id}")))
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<Document> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("{collection}/{id}")))?;
        let entry = docs
            .iter_mut()
            .find(|(doc_id, _)| doc_id == id)
            .ok_or_else(|| AppError::NotFound(format!("{collection}/{id}")))?;

        if let (Value::Object(existing), Value::Object(patch)) = (&mut entry.1, fields) {
            for (key, value) in patch {
                existing.insert(key, value);
            }
        }
        Ok(Document {
            id: id.to_string(),
            fields: entry.1.clone(),
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        self.delete_log
            .lock()
            .unwrap()
            .push((collection.to_string(), id.to_string()));
        if self.fail_delete_in.lock().unwrap().as_deref() == Some(collection)
            || self.fail_delete_ids.lock().unwrap().contains(id)
        {
            return Err(AppError::DocumentStore(format!(
                "injected delete failure for {collection}/{id}"
            )));
        }
        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("{collection}/{id}")))?;
        let before = docs.len();
        docs.retain(|(doc_id, _)| doc_id != id);
        if docs.len() == before {
            return Err(AppError::NotFound(format!("{collection}/{id}")));
        }
        Ok(())
    }

    async fn query(&self, collection: &str, predicates: Vec<Predicate>) -> Result<Vec<Document>> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let collections = self.collections.lock().unwrap();
        let docs = collections.get(collection).cloned().unwrap_or_default();
        Ok(docs
            .into_iter()
            .filter(|(_, fields)| predicates.iter().all(|p| Self::matches(fields, p)))
            .map(|(id, fields)| Document { id, fields })
            .collect())
    }
}

// ============================================
// Fake identity provider
// ============================================

#[derive(Default)]
pub struct FakeIdentityProvider {
    next: AtomicUsize,
    accounts_by_email: Mutex<HashMap<String, String>>,
    deleted_identities: Mutex<Vec<String>>,
    deleted_sessions: Mutex<Vec<String>>,
    field_updates: Mutex<Vec<(String, String, String)>>,
    codes_sent: Mutex<Vec<String>>,
    fail_delete_identity: AtomicBool,
}

impl FakeIdentityProvider {
    pub fn deleted_identities(&self) -> Vec<String> {
        self.deleted_identities.lock().unwrap().clone()
    }

    pub fn deleted_sessions(&self) -> Vec<String> {
        self.deleted_sessions.lock().unwrap().clone()
    }

    pub fn codes_sent(&self) -> Vec<String> {
        self.codes_sent.lock().unwrap().clone()
    }

    pub fn field_updates(&self) -> Vec<(String, String, String)> {
        self.field_updates.lock().unwrap().clone()
    }

    pub fn fail_delete_identity(&self) {
        self.fail_delete_identity.store(true, Ordering::SeqCst);
    }

    fn next_id(&self) -> usize {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn create_identity(
        &self,
        email: &str,
        _secret: &str,
        _display_name: &str,
    ) -> Result<String> {
        let id = format!("acct-{}", self.next_id());
        self.accounts_by_email
            .lock()
            .unwrap()
            .insert(email.to_string(), id.clone());
        Ok(id)
    }

    async fn delete_identity(&self, identity_id: &str) -> Result<()> {
        if self.fail_delete_identity.load(Ordering::SeqCst) {
            return Err(AppError::Identity(
                "injected identity delete failure".to_string(),
            ));
        }
        self.deleted_identities
            .lock()
            .unwrap()
            .push(identity_id.to_string());
        Ok(())
    }

    async fn update_field(
        &self,
        identity_id: &str,
        field: IdentityField,
        value: &str,
    ) -> Result<()> {
        self.field_updates.lock().unwrap().push((
            identity_id.to_string(),
            format!("{field:?}"),
            value.to_string(),
        ));
        Ok(())
    }

    async fn create_session(&self, identity_id: &str, _secret: &str) -> Result<SessionToken> {
        let n = self.next_id();
        Ok(SessionToken {
            id: format!("sess-{n}-{identity_id}"),
            secret: format!("sess-secret-{n}"),
        })
    }

    async fn delete_session(&self, session_ref: &str) -> Result<()> {
        self.deleted_sessions
            .lock()
            .unwrap()
            .push(session_ref.to_string());
        Ok(())
    }

    async fn send_verification_code(&self, email: &str) -> Result<Challenge> {
        let n = self.next_id();
        let account_id = self
            .accounts_by_email
            .lock()
            .unwrap()
            .entry(email.to_string())
            .or_insert_with(|| format!("acct-{n}"))
            .clone();
        self.codes_sent.lock().unwrap().push(email.to_string());
        Ok(Challenge {
            id: format!("chal-{n}"),
            account_id,
        })
    }
}

// ============================================
// Harness + fixtures
// ============================================

pub struct TestHarness {
    pub blobs: Arc<FakeBlobStore>,
    pub docs: Arc<FakeDocumentStore>,
    pub identity: Arc<FakeIdentityProvider>,
    pub uploads: UploadService,
    pub avatars: AvatarService,
    pub accounts: AccountService,
    pub feed: FeedService,
    pub profiles: ProfileService,
    pub auth: AuthService,
}

pub fn default_ops() -> OpsConfig {
    OpsConfig {
        operation_timeout: std::time::Duration::from_secs(5),
        store_call_timeout: std::time::Duration::from_secs(1),
        delete_concurrency: 4,
        max_in_set: 100,
    }
}

pub fn harness() -> TestHarness {
    harness_with_ops(default_ops())
}

pub fn harness_with_ops(ops: OpsConfig) -> TestHarness {
    let blobs = Arc::new(FakeBlobStore::default());
    let docs = Arc::new(FakeDocumentStore::default());
    let identity = Arc::new(FakeIdentityProvider::default());

    let blobs_dyn: Arc<dyn BlobStore> = blobs.clone();
    let docs_dyn: Arc<dyn DocumentStore> = docs.clone();
    let identity_dyn: Arc<dyn IdentityProvider> = identity.clone();

    let users = Arc::new(UserRecords::new(docs_dyn.clone(), USERS));
    let posts = Arc::new(PostRecords::new(docs_dyn, POSTS));

    TestHarness {
        uploads: UploadService::new(blobs_dyn.clone(), users.clone(), posts.clone(), &ops),
        avatars: AvatarService::new(blobs_dyn.clone(), users.clone(), &ops),
        accounts: AccountService::new(
            blobs_dyn,
            users.clone(),
            posts.clone(),
            identity_dyn.clone(),
            &ops,
        ),
        feed: FeedService::new(users.clone(), posts, &ops),
        profiles: ProfileService::new(users.clone(), identity_dyn.clone(), &ops),
        auth: AuthService::new(users, identity_dyn, &ops),
        blobs,
        docs,
        identity,
    }
}

/// Seed a user document; returns its id.
pub fn seed_user(h: &TestHarness, username: &str, email: &str, private: bool) -> String {
    h.docs.seed(
        USERS,
        json!({
            "username": username,
            "email": email,
            "avatarUrl": "",
            "avatarBlobId": "",
            "privacy": private,
            "accountId": format!("acct-{username}"),
        }),
    )
}

/// Seed a user document that already has an avatar blob.
pub fn seed_user_with_avatar(h: &TestHarness, username: &str, avatar_blob_id: &str) -> String {
    h.blobs.seed(avatar_blob_id);
    h.docs.seed(
        USERS,
        json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "avatarUrl": format!("http://blobs.test/{avatar_blob_id}"),
            "avatarBlobId": avatar_blob_id,
            "privacy": false,
            "accountId": format!("acct-{username}"),
        }),
    )
}

/// Seed a post document (and its blob, when non-empty); returns its id.
pub fn seed_post(
    h: &TestHarness,
    owner_id: &str,
    title: &str,
    media_type: &str,
    blob_id: &str,
) -> String {
    if !blob_id.is_empty() {
        h.blobs.seed(blob_id);
    }
    let seq = h.docs.count(POSTS);
    h.docs.seed(
        POSTS,
        json!({
            "ownerId": owner_id,
            "blobId": blob_id,
            "url": format!("http://blobs.test/{blob_id}"),
            "title": title,
            "description": "seeded",
            "mediaType": media_type,
            "createdAt": format!("2026-01-01T00:{:02}:00Z", seq % 60),
        }),
    )
}
