/// REST adapters for the document store and identity provider
///
/// Both collaborators speak an Appwrite-flavored HTTP API: project id and
/// API key travel as headers, documents come back with `$`-prefixed
/// metadata, and list queries are JSON-encoded predicates. Responses are
/// validated into typed shapes right here; nothing duck-typed crosses this
/// boundary.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};

use crate::config::{DocumentStoreConfig, IdentityConfig};
use crate::error::{AppError, Result};
use crate::stores::{
    Challenge, Document, DocumentStore, IdentityField, IdentityProvider, Predicate, SessionToken,
};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";

fn build_http_client(call_timeout: Duration) -> std::result::Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(call_timeout)
        .build()
        .map_err(|e| format!("failed to build HTTP client: {e}"))
}

fn transport_error(err: reqwest::Error, context: &str, wrap: fn(String) -> AppError) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(format!("{context} timed out"))
    } else {
        wrap(format!("{context} failed: {err}"))
    }
}

/// Parse a raw store response into a [`Document`], stripping `$`-metadata.
fn parse_document(raw: Value, context: &str) -> Result<Document> {
    let obj = match raw {
        Value::Object(obj) => obj,
        other => {
            return Err(AppError::DocumentStore(format!(
                "{context} returned a non-object document: {other}"
            )))
        }
    };

    let id = obj
        .get("$id")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::DocumentStore(format!("{context} returned a document without an id"))
        })?
        .to_string();

    let fields: Map<String, Value> = obj
        .into_iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .collect();

    Ok(Document {
        id,
        fields: Value::Object(fields),
    })
}

pub struct RestDocumentStore {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: String,
}

impl RestDocumentStore {
    pub fn new(config: &DocumentStoreConfig, call_timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(call_timeout).map_err(AppError::DocumentStore)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint,
            urlencoding::encode(&self.database_id),
            urlencoding::encode(collection)
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), urlencoding::encode(id))
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(PROJECT_HEADER, &self.project_id)
            .header(KEY_HEADER, &self.api_key)
    }

    async fn execute(&self, req: RequestBuilder, context: &str) -> Result<Value> {
        let resp = req
            .send()
            .await
            .map_err(|e| transport_error(e, context, AppError::DocumentStore))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(context.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::DocumentStore(format!(
                "{context} failed with {status}: {body}"
            )));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        resp.json::<Value>()
            .await
            .map_err(|e| AppError::DocumentStore(format!("{context} returned malformed body: {e}")))
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn create(&self, collection: &str, fields: Value) -> Result<Document> {
        let context = format!("document create in {collection}");
        let body = json!({
            "documentId": "unique()",
            "data": fields,
        });
        let raw = self
            .execute(
                self.request(Method::POST, self.collection_url(collection)).json(&body),
                &context,
            )
            .await?;
        parse_document(raw, &context)
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Document> {
        let context = format!("document read {collection}/{id}");
        let raw = self
            .execute(
                self.request(Method::GET, self.document_url(collection, id)),
                &context,
            )
            .await?;
        parse_document(raw, &context)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<Document> {
        let context = format!("document update {collection}/{id}");
        let body = json!({ "data": fields });
        let raw = self
            .execute(
                self.request(Method::PATCH, self.document_url(collection, id)).json(&body),
                &context,
            )
            .await?;
        parse_document(raw, &context)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let context = format!("document delete {collection}/{id}");
        self.execute(
            self.request(Method::DELETE, self.document_url(collection, id)),
            &context,
        )
        .await?;
        Ok(())
    }

    async fn query(&self, collection: &str, predicates: Vec<Predicate>) -> Result<Vec<Document>> {
        let context = format!("document query in {collection}");
        let params: Vec<(String, String)> = predicates
            .iter()
            .map(|p| ("queries[]".to_string(), p.to_wire().to_string()))
            .collect();

        let raw = self
            .execute(
                self.request(Method::GET, self.collection_url(collection)).query(&params),
                &context,
            )
            .await?;

        let documents = raw
            .get("documents")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::DocumentStore(format!("{context} returned no document list"))
            })?;

        documents
            .iter()
            .map(|doc| parse_document(doc.clone(), &context))
            .collect()
    }
}

pub struct RestIdentityProvider {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
}

impl RestIdentityProvider {
    pub fn new(config: &IdentityConfig, call_timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(call_timeout).map_err(AppError::Identity)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.endpoint, path))
            .header(PROJECT_HEADER, &self.project_id)
            .header(KEY_HEADER, &self.api_key)
    }

    async fn execute(&self, req: RequestBuilder, context: &str) -> Result<Value> {
        let resp = req
            .send()
            .await
            .map_err(|e| transport_error(e, context, AppError::Identity))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(context.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Identity(format!(
                "{context} failed with {status}: {body}"
            )));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        resp.json::<Value>()
            .await
            .map_err(|e| AppError::Identity(format!("{context} returned malformed body: {e}")))
    }

    fn require_str(raw: &Value, key: &str, context: &str) -> Result<String> {
        raw.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::Identity(format!("{context} response missing `{key}`")))
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn create_identity(
        &self,
        email: &str,
        secret: &str,
        display_name: &str,
    ) -> Result<String> {
        let context = "identity create";
        let body = json!({
            "userId": "unique()",
            "email": email,
            "password": secret,
            "name": display_name,
        });
        let raw = self
            .execute(self.request(Method::POST, "users").json(&body), context)
            .await?;
        Self::require_str(&raw, "$id", context)
    }

    async fn delete_identity(&self, identity_id: &str) -> Result<()> {
        let context = format!("identity delete {identity_id}");
        let path = format!("users/{}", urlencoding::encode(identity_id));
        self.execute(self.request(Method::DELETE, &path), &context)
            .await?;
        Ok(())
    }

    async fn update_field(
        &self,
        identity_id: &str,
        field: IdentityField,
        value: &str,
    ) -> Result<()> {
        let (segment, body) = match field {
            IdentityField::Email => ("email", json!({ "email": value })),
            IdentityField::DisplayName => ("name", json!({ "name": value })),
            IdentityField::Secret => ("password", json!({ "password": value })),
        };
        let context = format!("identity update {segment} for {identity_id}");
        let path = format!("users/{}/{segment}", urlencoding::encode(identity_id));
        self.execute(self.request(Method::PATCH, &path).json(&body), &context)
            .await?;
        Ok(())
    }

    async fn create_session(&self, identity_id: &str, secret: &str) -> Result<SessionToken> {
        let context = "session create";
        let body = json!({ "userId": identity_id, "secret": secret });
        let raw = self
            .execute(
                self.request(Method::POST, "account/sessions/token").json(&body),
                context,
            )
            .await?;
        Ok(SessionToken {
            id: Self::require_str(&raw, "$id", context)?,
            secret: Self::require_str(&raw, "secret", context)?,
        })
    }

    async fn delete_session(&self, session_ref: &str) -> Result<()> {
        let context = format!("session delete {session_ref}");
        let path = format!("account/sessions/{}", urlencoding::encode(session_ref));
        self.execute(self.request(Method::DELETE, &path), &context)
            .await?;
        Ok(())
    }

    async fn send_verification_code(&self, email: &str) -> Result<Challenge> {
        let context = "verification code";
        let body = json!({ "userId": "unique()", "email": email });
        let raw = self
            .execute(
                self.request(Method::POST, "account/tokens/email").json(&body),
                context,
            )
            .await?;
        Ok(Challenge {
            id: Self::require_str(&raw, "$id", context)?,
            account_id: Self::require_str(&raw, "userId", context)?,
        })
    }
}
