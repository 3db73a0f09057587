//! Immutable view snapshots for the file list and the reducer that advances them.

use std::collections::BTreeSet;

use serde::Serialize;

use super::files::FileRow;
use crate::client::FileEntry;
use crate::listing::{self, SortKey, SortOrder};

/// Aggregate figures over every loaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub count: usize,
    pub total_size: u64,
}

impl FileStats {
    pub fn of<'a>(files: impl IntoIterator<Item = &'a FileEntry>) -> Self {
        files.into_iter().fold(FileStats::default(), |acc, f| FileStats {
            count: acc.count + 1,
            total_size: acc.total_size.saturating_add(f.size),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub files: Vec<FileEntry>,
    pub query: String,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub selected: BTreeSet<String>,
    pub loading: bool,
}

#[derive(Debug, Clone)]
pub enum Action {
    LoadStarted,
    Loaded(Vec<FileEntry>),
    /// Reverts to an empty list.
    LoadFailed,
    Search(String),
    /// Same key toggles the order; a new key starts ascending.
    SortBy(SortKey),
    ToggleSelected(String),
    /// Selects every visible file, or clears the selection if all are selected.
    ToggleSelectAll,
    ClearSelection,
    Added(FileEntry),
    Removed(Vec<String>),
}

/// Produce the next snapshot. `state` is left untouched.
pub fn update(state: &ViewState, action: Action) -> ViewState {
    let mut next = state.clone();

    match action {
        Action::LoadStarted => {
            next.loading = true;
        }
        Action::Loaded(files) => {
            next.selected.retain(|id| files.iter().any(|f| &f.id == id));
            next.files = files;
            next.loading = false;
        }
        Action::LoadFailed => {
            next.files.clear();
            next.selected.clear();
            next.loading = false;
        }
        Action::Search(query) => {
            next.query = query;
        }
        Action::SortBy(key) => {
            if next.sort_key == key {
                next.sort_order = next.sort_order.toggled();
            } else {
                next.sort_key = key;
                next.sort_order = SortOrder::Asc;
            }
        }
        Action::ToggleSelected(id) => {
            if !next.selected.remove(&id) && next.files.iter().any(|f| f.id == id) {
                next.selected.insert(id);
            }
        }
        Action::ToggleSelectAll => {
            if state.all_visible_selected() {
                next.selected.clear();
            } else {
                next.selected = state.visible().iter().map(|f| f.id.clone()).collect();
            }
        }
        Action::ClearSelection => {
            next.selected.clear();
        }
        Action::Added(file) => {
            next.files.retain(|f| f.id != file.id);
            next.files.push(file);
        }
        Action::Removed(ids) => {
            next.files.retain(|f| !ids.contains(&f.id));
            for id in &ids {
                next.selected.remove(id);
            }
        }
    }

    next
}

impl ViewState {
    /// Files matching the query, in display order.
    pub fn visible(&self) -> Vec<&FileEntry> {
        listing::search(&self.files, &self.query, self.sort_key, self.sort_order)
    }

    /// Visible files with their display labels, in display order.
    pub fn rows(&self) -> Vec<FileRow> {
        self.visible()
            .into_iter()
            .map(|f| FileRow::new(f.clone(), self.is_selected(&f.id)))
            .collect()
    }

    pub fn stats(&self) -> FileStats {
        FileStats::of(&self.files)
    }

    pub fn selected_stats(&self) -> FileStats {
        FileStats::of(self.files.iter().filter(|f| self.selected.contains(&f.id)))
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn all_visible_selected(&self) -> bool {
        let visible = self.visible();
        !visible.is_empty() && visible.iter().all(|f| self.selected.contains(&f.id))
    }
}
