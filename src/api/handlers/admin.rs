use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, Success};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ipfs_enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatusResponse {
    pub cluster_info: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    pub files_deleted: u64,
    pub share_links_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Success<HealthResponse>> {
    Success::json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ipfs_enabled: state.pinner.is_some(),
    })
}

pub async fn cluster_status(
    State(state): State<Arc<AppState>>,
) -> Json<Success<ClusterStatusResponse>> {
    let info = state.node.cluster_info().await;
    let peers: Vec<serde_json::Value> = info
        .peers
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "address": p.address,
                "status": format!("{:?}", p.status),
                "sequence": p.sequence,
            })
        })
        .collect();

    Success::json(ClusterStatusResponse {
        cluster_info: serde_json::json!({
            "nodeId": info.node_id,
            "role": format!("{:?}", info.role),
            "term": info.term,
            "leaderId": info.leader_id,
            "peers": peers,
            "sequence": info.sequence,
        }),
    })
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Success<PurgeResponse>>, ApiError> {
    let stats = state
        .db
        .purge_all()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    tracing::warn!(
        files = stats.files,
        share_links = stats.share_links,
        "Purged all data"
    );

    Ok(Success::json(PurgeResponse {
        files_deleted: stats.files,
        share_links_deleted: stats.share_links,
    }))
}
