use chrono::{DateTime, Utc};

use crate::client::SharedLink;
use crate::format::{format_expiry, format_timestamp};
use crate::share::ShareStatus;

/// One share link as the management table shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRow {
    pub link: SharedLink,
    pub status: ShareStatus,
    /// Only active links can be copied.
    pub can_copy: bool,
    /// Revocation is offered regardless of status.
    pub can_revoke: bool,
    pub downloads: String,
    pub expiry: String,
    pub created: String,
}

impl ShareRow {
    pub fn new(link: SharedLink, now: DateTime<Utc>) -> Self {
        let status = link.status(now);
        Self {
            status,
            can_copy: status.is_active(),
            can_revoke: true,
            downloads: format!("{} / {}", link.download_count, link.max_downloads),
            expiry: format_expiry(link.expires_at, now),
            created: format_timestamp(link.created_at),
            link,
        }
    }

    /// The URL to put on the clipboard, if copying is allowed.
    pub fn copy_url(&self) -> Option<&str> {
        if self.can_copy && !self.link.share_url.is_empty() {
            Some(&self.link.share_url)
        } else {
            None
        }
    }
}

pub fn share_rows(links: Vec<SharedLink>, now: DateTime<Utc>) -> Vec<ShareRow> {
    links.into_iter().map(|l| ShareRow::new(l, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(expires_in: Option<i64>, max: u32, count: u32) -> SharedLink {
        let now = Utc::now();
        SharedLink {
            token: "tok".to_string(),
            file_name: "a.txt".to_string(),
            file_id: Some("f".to_string()),
            has_password: false,
            expires_at: expires_in.map(|h| now + Duration::hours(h)),
            max_downloads: max,
            download_count: count,
            description: None,
            created_at: now - Duration::days(1),
            exhausted_at: None,
            share_url: "http://relay.test/api/share/tok/download".to_string(),
        }
    }

    #[test]
    fn test_active_row_can_copy() {
        let row = ShareRow::new(link(Some(24), 3, 1), Utc::now());
        assert_eq!(row.status, ShareStatus::Active);
        assert!(row.can_copy);
        assert!(row.can_revoke);
        assert_eq!(row.downloads, "1 / 3");
        assert_eq!(row.copy_url(), Some("http://relay.test/api/share/tok/download"));
    }

    #[test]
    fn test_inactive_rows_only_revoke() {
        let now = Utc::now();
        let rows = share_rows(vec![link(Some(-1), 3, 0), link(None, 2, 2)], now);

        assert_eq!(rows[0].status, ShareStatus::Expired);
        assert_eq!(rows[0].expiry, "Expired");
        assert_eq!(rows[1].status, ShareStatus::Exhausted);
        assert_eq!(rows[1].expiry, "Never");
        for row in rows {
            assert!(!row.can_copy);
            assert!(row.can_revoke);
            assert_eq!(row.copy_url(), None);
        }
    }
}
