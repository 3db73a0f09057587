//! Search and ordering shared by the list endpoint and the dashboard.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::models::FileRecord;

/// Fields a file listing can be searched and ordered by.
pub trait Listing {
    fn display_name(&self) -> &str;
    fn mime_type(&self) -> &str;
    fn byte_size(&self) -> u64;
    fn uploaded_at(&self) -> DateTime<Utc>;
}

impl Listing for FileRecord {
    fn display_name(&self) -> &str {
        &self.original_name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn byte_size(&self) -> u64 {
        self.byte_size
    }

    fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Size,
    #[default]
    Date,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Case-insensitive substring match on name or MIME type. A blank query
/// matches everything.
pub fn matches_query<T: Listing>(item: &T, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }

    let needle = query.to_lowercase();
    item.display_name().to_lowercase().contains(&needle)
        || item.mime_type().to_lowercase().contains(&needle)
}

fn compare<T: Listing>(a: &T, b: &T, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a
            .display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase()),
        SortKey::Size => a.byte_size().cmp(&b.byte_size()),
        SortKey::Date => a.uploaded_at().cmp(&b.uploaded_at()),
    }
}

/// Filter by `query`, then sort. The sort is stable: items with equal keys keep
/// their relative order in both directions. Borrowed so views can render without
/// cloning.
pub fn search<'a, T: Listing>(
    items: &'a [T],
    query: &str,
    key: SortKey,
    order: SortOrder,
) -> Vec<&'a T> {
    let mut matched: Vec<&T> = items
        .iter()
        .filter(|item| matches_query(*item, query))
        .collect();
    matched.sort_by(|a, b| match order {
        SortOrder::Asc => compare(*a, *b, key),
        SortOrder::Desc => compare(*b, *a, key),
    });
    matched
}
