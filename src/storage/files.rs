use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::FileRecord;
use super::shares::take_file_shares;
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Store a file record
    pub fn put_file(&self, file: &FileRecord) -> Result<(), DatabaseError> {
        debug_assert!(!file.id.is_empty(), "file id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(file)?;
            table.insert(file.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a file by its UUID
    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Delete a file by its UUID together with every share link pointing at it
    pub fn delete_file(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let deleted = {
            let mut table = write_txn.open_table(FILES)?;
            let removed = table.remove(id)?.is_some();
            removed
        };

        if deleted {
            let tokens = take_file_shares(&write_txn, id)?;
            let mut share_table = write_txn.open_table(SHARE_LINKS)?;
            for token in &tokens {
                share_table.remove(token.as_str())?;
            }
            if !tokens.is_empty() {
                tracing::debug!(file_id = %id, links = tokens.len(), "Removed share links of deleted file");
            }
        }

        write_txn.commit()?;
        Ok(deleted)
    }

    /// Get all files (for snapshot/restore)
    pub fn get_all_files(&self) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let file: FileRecord = rmp_serde::from_slice(value.value())?;
            files.push(file);
        }

        Ok(files)
    }

    /// List files, newest upload first
    pub fn list_files(&self) -> Result<Vec<FileRecord>, DatabaseError> {
        let mut files = self.get_all_files()?;
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(files)
    }
}
