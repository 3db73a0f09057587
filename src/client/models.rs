//! Wire records as the dashboard reads them.
//!
//! Backends differ on a few field names (`name` / `originalName`, `mimeType` /
//! `mimetype`, `uploadedAt` / `timestamp`), so both spellings are accepted.

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::listing::Listing;
use crate::share::{resolve_status, ShareStatus};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    #[serde(alias = "name")]
    pub original_name: String,
    pub size: u64,
    #[serde(rename = "mimetype", alias = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "timestamp", alias = "uploadedAt", deserialize_with = "timestamp")]
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub ipfs_hash: Option<String>,
}

impl FileEntry {
    pub fn is_pinned(&self) -> bool {
        self.ipfs_hash.is_some()
    }
}

impl Listing for FileEntry {
    fn display_name(&self) -> &str {
        &self.original_name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn byte_size(&self) -> u64 {
        self.size
    }

    fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedLink {
    pub token: String,
    pub file_name: String,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub has_password: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub max_downloads: u32,
    pub download_count: u32,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub exhausted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub share_url: String,
}

impl SharedLink {
    /// Status recomputed locally with the same resolver the server gates on.
    pub fn status(&self, now: DateTime<Utc>) -> ShareStatus {
        resolve_status(
            self.expires_at,
            self.max_downloads,
            self.download_count,
            now,
        )
    }

    pub fn remaining_downloads(&self) -> u32 {
        self.max_downloads.saturating_sub(self.download_count)
    }

    pub fn is_exhausted(&self) -> bool {
        self.download_count >= self.max_downloads
    }
}

/// Parameters for a new share link.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShare {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_downloads: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Which upload endpoint to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadTarget {
    #[default]
    Files,
    Ipfs,
}

impl UploadTarget {
    pub fn path(self) -> &'static str {
        match self {
            UploadTarget::Files => "/api/files/upload",
            UploadTarget::Ipfs => "/api/ipfs/upload",
        }
    }
}

/// One file queued for upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub data: Bytes,
    pub mime_type: Option<String>,
    pub upload_id: Option<String>,
    pub custom_name: Option<String>,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
            mime_type: None,
            upload_id: None,
            custom_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    #[serde(default)]
    pub file: Option<FileEntry>,
    #[serde(default)]
    pub ipfs_hash: Option<String>,
    #[serde(default)]
    pub upload_id: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct FileList {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SharedLinkList {
    #[serde(default)]
    pub shared_links: Vec<SharedLink>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedShare {
    pub shared_link: SharedLink,
}

/// Accept RFC 3339 strings or epoch milliseconds.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom),
        Raw::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
    }
}
