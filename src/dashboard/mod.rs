//! Dashboard controller: owns the view snapshot and drives the client.
//!
//! Every change goes through [`state::update`], and the stats observer is
//! notified after each one so summary figures never lag the list.

mod files;
mod shares;
mod state;

pub use files::FileRow;
pub use shares::{share_rows, ShareRow};
pub use state::{update, Action, FileStats, ViewState};

use chrono::{DateTime, Utc};

use crate::client::{ClientError, RelayClient, UploadOutcome, UploadRequest, UploadTarget};
use crate::listing::SortKey;

type StatsObserver = Box<dyn Fn(FileStats) + Send + Sync>;

/// Result of deleting the selected files.
#[derive(Debug, Default)]
pub struct DeleteSummary {
    pub removed: Vec<String>,
    pub failed: Vec<(String, ClientError)>,
}

pub struct Dashboard {
    client: RelayClient,
    state: ViewState,
    on_stats: Option<StatsObserver>,
}

impl Dashboard {
    pub fn new(client: RelayClient) -> Self {
        Self {
            client,
            state: ViewState::default(),
            on_stats: None,
        }
    }

    /// Register the observer that receives aggregate stats after every change.
    pub fn on_stats(mut self, observer: impl Fn(FileStats) + Send + Sync + 'static) -> Self {
        self.on_stats = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn client(&self) -> &RelayClient {
        &self.client
    }

    pub fn dispatch(&mut self, action: Action) {
        self.state = update(&self.state, action);
        if let Some(ref observer) = self.on_stats {
            observer(self.state.stats());
        }
    }

    pub fn search(&mut self, query: impl Into<String>) {
        self.dispatch(Action::Search(query.into()));
    }

    pub fn sort_by(&mut self, key: SortKey) {
        self.dispatch(Action::SortBy(key));
    }

    pub fn toggle_selected(&mut self, id: impl Into<String>) {
        self.dispatch(Action::ToggleSelected(id.into()));
    }

    pub fn toggle_select_all(&mut self) {
        self.dispatch(Action::ToggleSelectAll);
    }

    /// Reload the file list. On failure the list is emptied and the error returned.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.dispatch(Action::LoadStarted);
        match self.client.list_files().await {
            Ok(files) => {
                self.dispatch(Action::Loaded(files));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load files");
                self.dispatch(Action::LoadFailed);
                Err(e)
            }
        }
    }

    /// Delete every selected file, one request at a time. Files that fail to
    /// delete stay in the list and stay selected.
    pub async fn delete_selected(&mut self) -> DeleteSummary {
        let mut summary = DeleteSummary::default();
        let ids: Vec<String> = self.state.selected.iter().cloned().collect();

        for id in ids {
            match self.client.delete_file(&id).await {
                Ok(()) => summary.removed.push(id),
                Err(e) => {
                    tracing::warn!(file_id = %id, error = %e, "Failed to delete file");
                    summary.failed.push((id, e));
                }
            }
        }

        if !summary.removed.is_empty() {
            self.dispatch(Action::Removed(summary.removed.clone()));
        }
        summary
    }

    /// Upload files sequentially and add each stored file to the list.
    pub async fn upload(
        &mut self,
        uploads: Vec<UploadRequest>,
        target: UploadTarget,
    ) -> Vec<UploadOutcome> {
        let outcomes = self.client.upload_batch(uploads, target).await;
        for outcome in &outcomes {
            if let Ok(ref receipt) = outcome.result {
                if let Some(ref file) = receipt.file {
                    self.dispatch(Action::Added(file.clone()));
                }
            }
        }
        outcomes
    }

    pub async fn shared_links(&self, now: DateTime<Utc>) -> Result<Vec<ShareRow>, ClientError> {
        let links = self.client.list_shared_links().await?;
        Ok(share_rows(links, now))
    }

    pub async fn revoke_link(&self, token: &str) -> Result<(), ClientError> {
        self.client.revoke_share(token).await
    }
}
