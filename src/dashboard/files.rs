use crate::client::FileEntry;
use crate::format::{format_bytes, format_timestamp, FileIcon};

/// One file as the list table shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRow {
    pub entry: FileEntry,
    pub icon: FileIcon,
    pub size: String,
    pub uploaded: String,
    pub selected: bool,
}

impl FileRow {
    pub fn new(entry: FileEntry, selected: bool) -> Self {
        Self {
            icon: FileIcon::for_mime(&entry.mime_type),
            size: format_bytes(entry.size),
            uploaded: format_timestamp(entry.uploaded_at),
            selected,
            entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_row_labels_come_from_entry() {
        let entry = FileEntry {
            id: "1".to_string(),
            original_name: "slides.pdf".to_string(),
            size: 1536,
            mime_type: "application/pdf".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 5, 14, 3, 0).unwrap(),
            ipfs_hash: None,
        };

        let row = FileRow::new(entry, true);
        assert_eq!(row.icon, FileIcon::Pdf);
        assert_eq!(row.size, "1.5 KB");
        assert_eq!(row.uploaded, "Mar 5, 2024 14:03");
        assert!(row.selected);
    }
}
