//! file-relay - An authenticated file relay with expiring, download-capped share links
//!
//! This crate provides:
//! - A REST API to upload, list and delete files, optionally pinning them on IPFS
//! - Share links whose status is resolved from expiry and download count
//! - File and share metadata replicated via muster, stored in redb
//! - A typed client plus dashboard view state (search, sort, selection, batch upload)

pub mod api;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod format;
pub mod listing;
pub mod object_store;
pub mod share;
pub mod state_machine;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use ring::rand::SystemRandom;
use state_machine::RelayStateMachine;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub node: Arc<muster::RedbNode<RelayStateMachine>>,
    pub object_store: Arc<dyn object_store::ObjectStore>,
    /// Present when an IPFS node is configured.
    pub pinner: Option<Arc<dyn object_store::Pinner>>,
    pub rng: SystemRandom,
    /// Serializes share downloads on this node.
    pub download_lock: tokio::sync::Mutex<()>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        node: Arc<muster::RedbNode<RelayStateMachine>>,
        object_store: Arc<dyn object_store::ObjectStore>,
        pinner: Option<Arc<dyn object_store::Pinner>>,
    ) -> Self {
        Self {
            config,
            db,
            node,
            object_store,
            pinner,
            rng: SystemRandom::new(),
            download_lock: tokio::sync::Mutex::new(()),
        }
    }
}
