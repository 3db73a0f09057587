//! Display helpers for file listings and share links.

use chrono::{DateTime, Utc};

use crate::storage::models::FileType;

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human-readable byte size using 1024 steps and at most two decimals.
///
/// `0` is `"0 Bytes"`, `1536` is `"1.5 KB"`, `1048576` is `"1 MB"`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

/// Timestamp as shown in listings, e.g. `Mar 5, 2024 14:03`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}

/// Expiry column of a share link relative to `now`.
pub fn format_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(expires_at) = expires_at else {
        return "Never".to_string();
    };
    if expires_at <= now {
        return "Expired".to_string();
    }

    let remaining = expires_at - now;
    if remaining.num_days() >= 1 {
        format!("in {}d", remaining.num_days())
    } else if remaining.num_hours() >= 1 {
        format!("in {}h", remaining.num_hours())
    } else {
        format!("in {}m", remaining.num_minutes().max(1))
    }
}

/// Icon shown next to a file in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileIcon {
    Archive,
    Audio,
    Document,
    Generic,
    Image,
    Pdf,
    Video,
}

impl FileIcon {
    pub fn for_mime(mime_type: &str) -> Self {
        if mime_type.eq_ignore_ascii_case("application/pdf") {
            return FileIcon::Pdf;
        }
        match FileType::from_mime(mime_type) {
            FileType::Archive => FileIcon::Archive,
            FileType::Audio => FileIcon::Audio,
            FileType::Document => FileIcon::Document,
            FileType::Image => FileIcon::Image,
            FileType::Video => FileIcon::Video,
            FileType::Binary => FileIcon::Generic,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            FileIcon::Archive => "📦",
            FileIcon::Audio => "🎵",
            FileIcon::Document => "📝",
            FileIcon::Generic => "📁",
            FileIcon::Image => "🖼️",
            FileIcon::Pdf => "📄",
            FileIcon::Video => "🎬",
        }
    }
}
