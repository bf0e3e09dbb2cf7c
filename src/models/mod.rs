/// Data models for medley-service
///
/// This module defines structures for:
/// - User: profile document (avatar, privacy flag, identity linkage)
/// - Post: published media post referencing a blob
/// - MediaType: media classification derived from file extensions
///
/// The `*Fields` structs are the wire shapes persisted in the document
/// store; `User`/`Post` pair those fields with the document identity. The
/// conversion is the validation boundary: a document that does not match the
/// expected shape is rejected, never passed through.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::stores::Document;

/// Media classification for a post.
///
/// `Avatar` is a synthetic marker used for profile pictures that were
/// published as posts by older clients; it never comes out of extension
/// sniffing and is excluded from the public feed unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Other,
    Avatar,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

impl MediaType {
    /// Classify a file by the extension of its name.
    pub fn from_file_name(file_name: &str) -> Self {
        let extension = match file_name.rsplit('.').next() {
            Some(ext) if ext.len() < file_name.len() => ext.to_ascii_lowercase(),
            _ => return MediaType::Other,
        };

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            MediaType::Image
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            MediaType::Video
        } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
            MediaType::Audio
        } else {
            MediaType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Other => "other",
            MediaType::Avatar => "avatar",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw media handed to the upload and avatar flows.
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl MediaPayload {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
        }
    }
}

/// A user profile.
///
/// `id` is the document identity; `account_id` is the identity-provider
/// identity. They are distinct and both required. `avatar_blob_id` is either
/// absent or references a live blob, and `avatar_url` is always derived from
/// it, never stored on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub avatar_blob_id: Option<String>,
    pub privacy: bool,
}

/// Wire shape of a user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub avatar_blob_id: String,
    #[serde(default)]
    pub privacy: bool,
    pub account_id: String,
}

impl User {
    /// Validate a raw document into a `User`.
    pub fn from_document(doc: Document) -> Result<Self> {
        let id = doc.id;
        let fields: UserFields = serde_json::from_value(doc.fields).map_err(|e| {
            AppError::DocumentStore(format!("malformed user document {id}: {e}"))
        })?;
        Ok(User {
            id,
            account_id: fields.account_id,
            username: fields.username,
            email: fields.email,
            avatar_url: fields.avatar_url,
            avatar_blob_id: if fields.avatar_blob_id.is_empty() {
                None
            } else {
                Some(fields.avatar_blob_id)
            },
            privacy: fields.privacy,
        })
    }

    pub fn fields(&self) -> UserFields {
        UserFields {
            username: self.username.clone(),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
            avatar_blob_id: self.avatar_blob_id.clone().unwrap_or_default(),
            privacy: self.privacy,
            account_id: self.account_id.clone(),
        }
    }
}

/// A published media post.
///
/// `owner_id` is a weak reference to the owning user's document id; the
/// owner is always resolved by lookup, never embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub owner_id: String,
    pub blob_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of a post document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFields {
    pub owner_id: String,
    pub blob_id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub media_type: MediaType,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Validate a raw document into a `Post`.
    pub fn from_document(doc: Document) -> Result<Self> {
        let id = doc.id;
        let fields: PostFields = serde_json::from_value(doc.fields).map_err(|e| {
            AppError::DocumentStore(format!("malformed post document {id}: {e}"))
        })?;
        Ok(Post {
            id,
            owner_id: fields.owner_id,
            blob_id: fields.blob_id,
            url: fields.url,
            title: fields.title,
            description: fields.description,
            media_type: fields.media_type,
            created_at: fields.created_at,
        })
    }

    pub fn fields(&self) -> PostFields {
        PostFields {
            owner_id: self.owner_id.clone(),
            blob_id: self.blob_id.clone(),
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            media_type: self.media_type,
            created_at: self.created_at,
        }
    }
}
