/// Configuration management for Medley Service
///
/// This module handles loading configuration from environment variables.
/// Every knob has a development default; production deployments are expected
/// to set the store endpoints and credentials explicitly.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Blob store (S3-compatible) configuration
    pub blob: BlobStoreConfig,
    /// Document store configuration
    pub documents: DocumentStoreConfig,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Operation-level tuning (timeouts, fan-out caps)
    pub ops: OpsConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
}

/// Blob store (S3-compatible) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    /// AWS region
    pub region: String,
    /// Bucket holding all media blobs
    pub bucket: String,
    /// Custom endpoint for S3-compatible stores (MinIO etc.)
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Base URL blobs are publicly served from
    pub public_base_url: String,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    /// REST endpoint of the document store
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub database_id: String,
    pub users_collection: String,
    pub posts_collection: String,
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// REST endpoint of the identity provider
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
}

/// Operation-level tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    /// Deadline for a whole coordinator operation
    #[serde(with = "duration_ms")]
    pub operation_timeout: Duration,
    /// Deadline for a single external-store call
    #[serde(with = "duration_ms")]
    pub store_call_timeout: Duration,
    /// Worker-pool cap for the account-deletion fan-out
    pub delete_concurrency: usize,
    /// Maximum owner-id set size per `value_in_set` query; larger sets are
    /// chunked into multiple queries
    pub max_in_set: usize,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(de)?))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file when present, then environment variables with
    /// per-field defaults suitable for local development.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let delete_concurrency: usize = parse_env_or("DELETE_CONCURRENCY", 8);
        if delete_concurrency == 0 {
            return Err("DELETE_CONCURRENCY must be at least 1".to_string());
        }
        let max_in_set: usize = parse_env_or("QUERY_MAX_IN_SET", 100);
        if max_in_set == 0 {
            return Err("QUERY_MAX_IN_SET must be at least 1".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: env_or("APP_ENV", "development"),
            },
            blob: BlobStoreConfig {
                region: env_or("BLOB_REGION", "us-east-1"),
                bucket: env_or("BLOB_BUCKET", "medley-media"),
                endpoint: std::env::var("BLOB_ENDPOINT")
                    .ok()
                    .filter(|e| !e.trim().is_empty()),
                access_key_id: env_or("BLOB_ACCESS_KEY_ID", ""),
                secret_access_key: env_or("BLOB_SECRET_ACCESS_KEY", ""),
                public_base_url: env_or("BLOB_PUBLIC_BASE_URL", "http://localhost:9000/medley-media"),
            },
            documents: DocumentStoreConfig {
                endpoint: env_or("DOCSTORE_ENDPOINT", "http://localhost:4080/v1"),
                project_id: env_or("DOCSTORE_PROJECT_ID", "medley"),
                api_key: env_or("DOCSTORE_API_KEY", ""),
                database_id: env_or("DOCSTORE_DATABASE_ID", "medley"),
                users_collection: env_or("DOCSTORE_USERS_COLLECTION", "users"),
                posts_collection: env_or("DOCSTORE_POSTS_COLLECTION", "posts"),
            },
            identity: IdentityConfig {
                endpoint: env_or("IDENTITY_ENDPOINT", "http://localhost:4080/v1"),
                project_id: env_or("IDENTITY_PROJECT_ID", "medley"),
                api_key: env_or("IDENTITY_API_KEY", ""),
            },
            ops: OpsConfig {
                operation_timeout: Duration::from_millis(parse_env_or(
                    "OPERATION_TIMEOUT_MS",
                    30_000,
                )),
                store_call_timeout: Duration::from_millis(parse_env_or(
                    "STORE_CALL_TIMEOUT_MS",
                    10_000,
                )),
                delete_concurrency,
                max_in_set,
            },
        })
    }
}
