/// Medley Service Library
///
/// Core orchestration layer for the Medley media-sharing platform. Users
/// publish media posts and manage a profile (avatar, username, email,
/// privacy), backed by two independent external stores: a content-addressed
/// blob store and a document store, plus an identity provider for accounts
/// and sessions. There is no shared transaction across the stores; every
/// multi-store operation is a short saga with best-effort compensation.
///
/// # Modules
///
/// - `models`: User, Post and media-type data structures
/// - `stores`: external-store seams (blob, document, identity) and adapters
/// - `db`: typed record repositories over the document store
/// - `services`: business logic layer (upload, avatar, account, feed, ...)
/// - `validators`: input validation helpers
/// - `error`: error types and handling
/// - `config`: configuration management
/// - `telemetry`: tracing setup
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod stores;
pub mod telemetry;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
