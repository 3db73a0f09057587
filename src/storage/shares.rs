use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};

use super::db::{Database, DatabaseError};
use super::models::ShareLinkRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // Share link operations
    // ========================================================================

    /// Store a share link and index it under its file
    pub fn put_share(&self, share: &ShareLinkRecord) -> Result<(), DatabaseError> {
        debug_assert!(!share.token.is_empty(), "share token must not be empty");
        debug_assert!(share.max_downloads > 0, "max_downloads must be positive");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SHARE_LINKS)?;
            let data = rmp_serde::to_vec_named(share)?;
            table.insert(share.token.as_str(), data.as_slice())?;
        }
        index_add(&write_txn, &share.file_id, &share.token)?;
        write_txn.commit()?;
        Ok(())
    }

    /// Get a share link by token
    pub fn get_share(&self, token: &str) -> Result<Option<ShareLinkRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SHARE_LINKS)?;

        match table.get(token)? {
            Some(data) => {
                let share: ShareLinkRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(share))
            }
            None => Ok(None),
        }
    }

    /// Get all share links (for snapshot/restore)
    pub fn get_all_shares(&self) -> Result<Vec<ShareLinkRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SHARE_LINKS)?;

        let mut shares = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let share: ShareLinkRecord = rmp_serde::from_slice(value.value())?;
            shares.push(share);
        }

        Ok(shares)
    }

    /// List share links, newest first
    pub fn list_shares(&self) -> Result<Vec<ShareLinkRecord>, DatabaseError> {
        let mut shares = self.get_all_shares()?;
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    /// Get every share link pointing at a file
    pub fn get_shares_for_file(
        &self,
        file_id: &str,
    ) -> Result<Vec<ShareLinkRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let index = read_txn.open_table(FILE_SHARES)?;
        let table = read_txn.open_table(SHARE_LINKS)?;

        let tokens: Vec<String> = match index.get(file_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut shares = Vec::new();
        for token in tokens {
            if let Some(data) = table.get(token.as_str())? {
                let share: ShareLinkRecord = rmp_serde::from_slice(data.value())?;
                shares.push(share);
            }
        }

        Ok(shares)
    }

    /// Delete a share link by token and clean up the file index
    pub fn delete_share(&self, token: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let file_id: Option<String> = {
            let mut table = write_txn.open_table(SHARE_LINKS)?;
            let result = match table.remove(token)? {
                Some(data) => {
                    let share: ShareLinkRecord = rmp_serde::from_slice(data.value())?;
                    Some(share.file_id)
                }
                None => None,
            };
            result
        };

        if let Some(ref file_id) = file_id {
            index_remove(&write_txn, file_id, token)?;
        }

        write_txn.commit()?;
        Ok(file_id.is_some())
    }

    /// Count one download against a share link at instant `at`.
    ///
    /// Only an active link is counted. The download that reaches the cap stamps
    /// `exhausted_at`. Returns the updated record, or `None` when the link is
    /// unknown or no longer active.
    pub fn record_download(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ShareLinkRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing: Option<ShareLinkRecord> = {
            let table = write_txn.open_table(SHARE_LINKS)?;
            let result = match table.get(token)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut share) if share.status(at).is_active() => {
                share.download_count += 1;
                if share.is_exhausted() {
                    share.exhausted_at = Some(at);
                }

                let data = rmp_serde::to_vec_named(&share)?;
                let mut table = write_txn.open_table(SHARE_LINKS)?;
                table.insert(token, data.as_slice())?;
                Some(share)
            }
            _ => None,
        };

        write_txn.commit()?;
        Ok(updated)
    }
}

// ============================================================================
// File -> tokens index maintenance
// ============================================================================

fn read_index(write_txn: &WriteTransaction, file_id: &str) -> Result<Vec<String>, DatabaseError> {
    let index = write_txn.open_table(FILE_SHARES)?;
    let tokens = match index.get(file_id)? {
        Some(data) => rmp_serde::from_slice(data.value())?,
        None => Vec::new(),
    };
    Ok(tokens)
}

fn write_index(
    write_txn: &WriteTransaction,
    file_id: &str,
    tokens: &[String],
) -> Result<(), DatabaseError> {
    let mut index = write_txn.open_table(FILE_SHARES)?;
    if tokens.is_empty() {
        index.remove(file_id)?;
    } else {
        let data = rmp_serde::to_vec_named(tokens)?;
        index.insert(file_id, data.as_slice())?;
    }
    Ok(())
}

fn index_add(write_txn: &WriteTransaction, file_id: &str, token: &str) -> Result<(), DatabaseError> {
    let mut tokens = read_index(write_txn, file_id)?;
    if !tokens.iter().any(|t| t == token) {
        tokens.push(token.to_string());
        write_index(write_txn, file_id, &tokens)?;
    }
    Ok(())
}

fn index_remove(
    write_txn: &WriteTransaction,
    file_id: &str,
    token: &str,
) -> Result<(), DatabaseError> {
    let mut tokens = read_index(write_txn, file_id)?;
    tokens.retain(|t| t != token);
    write_index(write_txn, file_id, &tokens)
}

/// Drop a file's index entry, returning the tokens it held.
pub(super) fn take_file_shares(
    write_txn: &WriteTransaction,
    file_id: &str,
) -> Result<Vec<String>, DatabaseError> {
    let tokens = read_index(write_txn, file_id)?;
    write_index(write_txn, file_id, &[])?;
    Ok(tokens)
}
