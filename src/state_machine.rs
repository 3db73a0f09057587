//! file-relay's state machine for muster cluster replication.

use serde::{Deserialize, Serialize};

use crate::storage::models::{FileRecord, ShareLinkRecord, WriteOp};
use crate::storage::Database;

/// The file-relay state machine, replicated by muster.
pub struct RelayStateMachine {
    db: Database,
}

impl RelayStateMachine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Full state snapshot for syncing lagging followers.
#[derive(Debug, Serialize, Deserialize)]
pub struct RelaySnapshot {
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub share_links: Vec<ShareLinkRecord>,
}

impl muster::StateMachine for RelayStateMachine {
    type WriteOp = WriteOp;
    type Snapshot = RelaySnapshot;

    fn apply(&self, op: &WriteOp) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match op {
            WriteOp::CreateFile(file) => {
                self.db.put_file(file)?;
            }
            WriteOp::DeleteFile { id } => {
                self.db.delete_file(id)?;
            }
            WriteOp::CreateShare(share) => {
                self.db.put_share(share)?;
            }
            WriteOp::RevokeShare { token } => {
                self.db.delete_share(token)?;
            }
            WriteOp::RecordDownload { token, at } => {
                if self.db.record_download(token, *at)?.is_none() {
                    tracing::warn!(token = %token, "Ignored download against inactive or missing share link");
                }
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<RelaySnapshot, Box<dyn std::error::Error + Send + Sync>> {
        let files = self.db.get_all_files()?;
        let share_links = self.db.get_all_shares()?;
        Ok(RelaySnapshot { files, share_links })
    }

    fn restore(
        &self,
        snapshot: RelaySnapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // A snapshot replaces local state, including records deleted since
        self.db.purge_all()?;
        for file in &snapshot.files {
            self.db.put_file(file)?;
        }
        for share in &snapshot.share_links {
            self.db.put_share(share)?;
        }
        Ok(())
    }
}
