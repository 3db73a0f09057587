use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::share::{resolve_status, ShareStatus};

/// Classification of a file derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Archive,
    Audio,
    Binary,
    Document,
    Image,
    Video,
}

impl FileType {
    /// Derive a file type classification from a MIME type string.
    pub fn from_mime(mime_type: &str) -> Self {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        let (primary, sub) = mime_type.split_once('/').unwrap_or((mime_type.as_str(), ""));
        match primary {
            "audio" => FileType::Audio,
            "image" => FileType::Image,
            "video" => FileType::Video,
            "text" => FileType::Document,
            "application" => match sub {
                "pdf"
                | "msword"
                | "rtf"
                | "json"
                | "vnd.openxmlformats-officedocument.wordprocessingml.document"
                | "vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                | "vnd.openxmlformats-officedocument.presentationml.presentation"
                | "vnd.ms-excel"
                | "vnd.ms-powerpoint" => FileType::Document,
                "zip" | "gzip" | "x-tar" | "x-7z-compressed" | "x-rar-compressed"
                | "vnd.rar" | "x-bzip2" => FileType::Archive,
                _ => FileType::Binary,
            },
            _ => FileType::Binary,
        }
    }
}

/// A stored file's metadata. The bytes live in the object store under `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub original_name: String,
    pub byte_size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    /// IPFS CID, present when the file was pinned on upload.
    #[serde(default)]
    pub ipfs_hash: Option<String>,
    /// Correlation id supplied by the uploading client.
    #[serde(default)]
    pub upload_id: Option<String>,
}

impl FileRecord {
    pub fn is_pinned(&self) -> bool {
        self.ipfs_hash.is_some()
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_mime(&self.mime_type)
    }
}

/// A share link stored in redb, keyed by its token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLinkRecord {
    pub token: String,
    pub file_id: String,
    pub file_name: String,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub max_downloads: u32,
    pub download_count: u32,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// When the download that reached `max_downloads` was recorded.
    #[serde(default)]
    pub exhausted_at: Option<DateTime<Utc>>,
}

impl ShareLinkRecord {
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

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Types of write operations (replicated via muster)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WriteOp {
    CreateFile(FileRecord),
    /// Deletes the file and every share link pointing at it.
    DeleteFile {
        id: String,
    },
    CreateShare(ShareLinkRecord),
    RevokeShare {
        token: String,
    },
    /// Counts one download at instant `at`. Carrying the instant keeps apply
    /// deterministic across replicas.
    RecordDownload {
        token: String,
        at: DateTime<Utc>,
    },
}
