use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a share link, derived from its persisted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    Active,
    Expired,
    Exhausted,
}

impl ShareStatus {
    pub fn is_active(self) -> bool {
        matches!(self, ShareStatus::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShareStatus::Active => "active",
            ShareStatus::Expired => "expired",
            ShareStatus::Exhausted => "exhausted",
        }
    }
}

impl std::fmt::Display for ShareStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the status of a share link at `now`.
///
/// Expiry is checked before the download cap, so a link that is both past its
/// expiry and out of downloads reports [`ShareStatus::Expired`]. A missing
/// expiry never expires. A count equal to the cap is already exhausted.
pub fn resolve_status(
    expires_at: Option<DateTime<Utc>>,
    max_downloads: u32,
    download_count: u32,
    now: DateTime<Utc>,
) -> ShareStatus {
    if let Some(expires_at) = expires_at {
        if now >= expires_at {
            return ShareStatus::Expired;
        }
    }

    if download_count >= max_downloads {
        ShareStatus::Exhausted
    } else {
        ShareStatus::Active
    }
}
