/// External-store seams
///
/// The three collaborators the coordinators orchestrate are defined here as
/// traits and injected as `Arc<dyn ...>` handles. They are independent
/// systems with no shared transaction; each individual call is atomic and
/// idempotent on the store side, and that is all the core relies on.
///
/// - `BlobStore`: content-addressed binary storage ([`s3::S3BlobStore`])
/// - `DocumentStore`: schema-less records with query-by-predicate
///   ([`rest::RestDocumentStore`])
/// - `IdentityProvider`: account/session lifecycle
///   ([`rest::RestIdentityProvider`])
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{AppError, Result};

pub mod rest;
pub mod s3;

pub use rest::{RestDocumentStore, RestIdentityProvider};
pub use s3::S3BlobStore;

/// A stored blob: opaque id plus the URL it is publicly served from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub id: String,
    pub url: String,
}

/// A raw document: store-assigned identity plus its user-defined fields.
///
/// `fields` is always a JSON object; `$`-prefixed store metadata has been
/// stripped at the adapter boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

/// Query predicate over document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equal { field: String, value: Value },
    NotEqual { field: String, value: Value },
    ValueInSet { field: String, values: Vec<Value> },
}

impl Predicate {
    pub fn equal(field: &str, value: impl Into<Value>) -> Self {
        Predicate::Equal {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn not_equal(field: &str, value: impl Into<Value>) -> Self {
        Predicate::NotEqual {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn value_in_set<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::ValueInSet {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Wire representation understood by the document-store REST API.
    ///
    /// A membership test is an `equal` with multiple candidate values, which
    /// is why callers must keep the set bounded (see `OpsConfig::max_in_set`).
    pub fn to_wire(&self) -> Value {
        match self {
            Predicate::Equal { field, value } => json!({
                "method": "equal",
                "attribute": field,
                "values": [value],
            }),
            Predicate::NotEqual { field, value } => json!({
                "method": "notEqual",
                "attribute": field,
                "values": [value],
            }),
            Predicate::ValueInSet { field, values } => json!({
                "method": "equal",
                "attribute": field,
                "values": values,
            }),
        }
    }
}

/// Content-addressed binary storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a fresh opaque id. `name` is advisory (used for
    /// key readability); it does not need to be unique.
    async fn put(&self, bytes: Vec<u8>, name: &str) -> Result<StoredBlob>;

    /// Delete a blob. Deleting an already-absent blob is not an error.
    async fn delete(&self, blob_id: &str) -> Result<()>;

    /// The URL a blob is publicly served from. Purely derived; makes no
    /// store call and does not imply the blob exists.
    fn url_for(&self, blob_id: &str) -> String;
}

/// Schema-less record storage with query-by-predicate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, collection: &str, fields: Value) -> Result<Document>;

    /// Read a document, `AppError::NotFound` when absent.
    async fn read(&self, collection: &str, id: &str) -> Result<Document>;

    /// Partial update: only the supplied fields change.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<Document>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    async fn query(&self, collection: &str, predicates: Vec<Predicate>) -> Result<Vec<Document>>;
}

/// A session minted by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionToken {
    pub id: String,
    pub secret: String,
}

/// A verification challenge sent to an email address.
///
/// `account_id` is the identity the challenge is bound to; for a previously
/// unseen email the provider allocates it on the fly.
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    pub id: String,
    pub account_id: String,
}

/// Identity-record fields that can be updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    DisplayName,
    Secret,
}

/// Account and session lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_identity(
        &self,
        email: &str,
        secret: &str,
        display_name: &str,
    ) -> Result<String>;

    async fn delete_identity(&self, identity_id: &str) -> Result<()>;

    async fn update_field(
        &self,
        identity_id: &str,
        field: IdentityField,
        value: &str,
    ) -> Result<()>;

    async fn create_session(&self, identity_id: &str, secret: &str) -> Result<SessionToken>;

    async fn delete_session(&self, session_ref: &str) -> Result<()>;

    async fn send_verification_code(&self, email: &str) -> Result<Challenge>;
}

/// Run `fut` under `limit`, mapping deadline expiry to `AppError::Timeout`.
///
/// Store mutations that already committed before the deadline are not rolled
/// back here; only the explicit compensation paths undo anything.
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{operation} exceeded {}ms deadline",
            limit.as_millis()
        ))),
    }
}
