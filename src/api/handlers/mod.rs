mod admin;
mod files;
mod shares;

use crate::api::response::ApiError;

pub use admin::{admin_purge, cluster_status, health};
pub use files::{delete_file, list_files, upload_file, upload_to_ipfs};
pub use shares::{
    create_share, download_share, list_shared_links, revoke_share, share_info,
    SHARE_PASSWORD_HEADER,
};

/// Map a MusterError to an ApiError
fn replication_error(e: muster::MusterError) -> ApiError {
    match e {
        muster::MusterError::NotLeader { .. } => {
            ApiError::unavailable("No leader available, retry shortly")
        }
        muster::MusterError::NoQuorum => {
            ApiError::unavailable("Failed to reach quorum for replication")
        }
        _ => ApiError::internal(e.to_string()),
    }
}
