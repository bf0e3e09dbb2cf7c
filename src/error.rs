use thiserror::Error;

/// Result type for medley-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
///
/// Validation errors are raised before any store mutation and are never
/// retried. Store errors may be transient or permanent; the caller owns the
/// retry policy. Compensation failures are not part of this enum on purpose:
/// a failed cleanup step must never replace the original error seen by the
/// caller (see [`CompensationFailure`]).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Blob store error: {0}")]
    BlobStore(String),

    #[error("Document store error: {0}")]
    DocumentStore(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl AppError {
    /// Whether this error is the document-store "referenced entity absent"
    /// case rather than an infrastructure failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

/// A best-effort cleanup step that failed mid-saga.
///
/// Recorded via `record()` into logs/telemetry and then dropped; the
/// operation's caller always sees the original error (or success, for the
/// tolerated orphan cases).
#[derive(Debug, Error)]
#[error("compensation failed during {operation} for blob {blob_id}: {cause}")]
pub struct CompensationFailure {
    pub operation: &'static str,
    pub blob_id: String,
    #[source]
    pub cause: AppError,
}

impl CompensationFailure {
    pub fn new(operation: &'static str, blob_id: &str, cause: AppError) -> Self {
        Self {
            operation,
            blob_id: blob_id.to_string(),
            cause,
        }
    }

    /// Log the failure. The orphaned blob is consistency debt, not a reason
    /// to fail the surrounding operation.
    pub fn record(&self) {
        tracing::warn!(
            operation = self.operation,
            blob_id = %self.blob_id,
            cause = %self.cause,
            "compensation step failed; original outcome preserved"
        );
    }
}
