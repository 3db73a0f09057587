use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{auth, handlers};
use crate::AppState;

/// Headroom for multipart framing on top of the per-file limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Request body limit for the upload routes.
fn upload_body_limit(max_upload_size: u64) -> usize {
    usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = upload_body_limit(state.config.max_upload_size);

    let management = Router::new()
        // Files
        .route("/api/files/list", get(handlers::list_files))
        .route(
            "/api/files/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/ipfs/upload",
            post(handlers::upload_to_ipfs).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/files/delete/:id", delete(handlers::delete_file))
        // Share links
        .route("/api/files/share", post(handlers::create_share))
        .route("/api/files/shared-links", get(handlers::list_shared_links))
        .route("/api/files/share/:token", delete(handlers::revoke_share))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_bearer,
        ));

    let mut router = Router::new()
        .merge(management)
        // Public share access
        .route("/api/share/:token", get(handlers::share_info))
        .route("/api/share/:token/download", get(handlers::download_share))
        // Internal
        .route("/_internal/cluster/status", get(handlers::cluster_status))
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled, purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_body_limit_adds_headroom() {
        assert_eq!(upload_body_limit(1024), 1024 + MULTIPART_OVERHEAD);
        assert_eq!(upload_body_limit(u64::MAX), usize::MAX);
    }
}
