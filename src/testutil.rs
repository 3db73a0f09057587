//! Shared test helpers for file-relay unit tests.

use std::sync::Arc;

use crate::config::{ClusterConfig, Config, NodeConfig, ShareConfig, StorageConfig};
use crate::object_store::LocalStore;
use crate::state_machine::RelayStateMachine;
use crate::storage::Database;
use crate::AppState;

/// Bearer token accepted by [`test_state`].
pub const TEST_TOKEN: &str = "test-token";

/// Create a test AppState with a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("files");

    let config = Config {
        node: NodeConfig {
            id: uuid::Uuid::new_v4().to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        cluster: ClusterConfig::default(),
        storage: StorageConfig::default(),
        share: ShareConfig::default(),
        api_tokens: vec![TEST_TOKEN.to_string()],
        test_mode: true,
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let object_store = LocalStore::new(&files_dir).expect("Failed to create test object store");

    let muster_storage =
        muster::RedbStorage::new(db.inner()).expect("Failed to create muster storage");
    let state_machine = RelayStateMachine::new(db.clone());
    let muster_config = muster::Config {
        node_id: config.node.id.clone(),
        cluster_port: 0,
        heartbeat_interval_ms: 300,
        election_timeout_ms: 3000,
        discovery: muster::DiscoveryConfig {
            dns_name: None,
            peers: vec![],
            poll_interval_secs: 5,
        },
    };
    let node = muster::MusterNode::new(muster_config, muster_storage, state_machine)
        .expect("Failed to create muster node");

    Arc::new(AppState::new(
        config,
        db,
        Arc::clone(&node),
        Arc::new(object_store),
        None,
    ))
}

/// Serve the router on an ephemeral port, returning its base URL.
pub async fn spawn_server(state: Arc<AppState>) -> String {
    let app = crate::api::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}
