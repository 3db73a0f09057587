use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::replication_error;
use crate::api::response::{ApiError, AppJson, Empty, Success};
use crate::object_store::{ObjectReader, ObjectStoreError};
use crate::share::{self, ShareStatus};
use crate::storage::models::{FileRecord, ShareLinkRecord, WriteOp};
use crate::AppState;

/// Header carrying the password of a protected share link.
pub const SHARE_PASSWORD_HEADER: &str = "x-share-password";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    pub file_id: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_in_hours: Option<u32>,
    #[serde(default)]
    pub max_downloads: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    pub token: String,
    pub file_id: String,
    pub file_name: String,
    pub has_password: bool,
    pub expires_at: Option<String>,
    pub max_downloads: u32,
    pub download_count: u32,
    pub remaining_downloads: u32,
    pub description: Option<String>,
    pub created_at: String,
    pub is_exhausted: bool,
    pub exhausted_at: Option<String>,
    pub share_url: String,
    pub status: ShareStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareResponse {
    pub shared_link: ShareLinkResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareListResponse {
    pub shared_links: Vec<ShareLinkResponse>,
}

/// What anyone holding the token may learn about a link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicShareResponse {
    pub file_name: String,
    pub size: u64,
    pub mimetype: String,
    pub has_password: bool,
    pub expires_at: Option<String>,
    pub remaining_downloads: u32,
    pub status: ShareStatus,
}

// ============================================================================
// Authenticated handlers
// ============================================================================

pub async fn create_share(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateShareRequest>,
) -> Result<Json<Success<CreateShareResponse>>, ApiError> {
    let now = Utc::now();

    let expires_at = match (req.expires_at, req.expires_in_hours) {
        (Some(_), Some(_)) => {
            return Err(ApiError::bad_request(
                "provide either expiresAt or expiresInHours, not both",
            ))
        }
        (Some(at), None) => Some(at),
        (None, Some(0)) => return Err(ApiError::bad_request("expiresInHours must be positive")),
        (None, Some(hours)) => Some(
            Duration::try_hours(i64::from(hours))
                .and_then(|d| now.checked_add_signed(d))
                .ok_or_else(|| ApiError::bad_request("expiresInHours is out of range"))?,
        ),
        (None, None) => None,
    };
    if let Some(at) = expires_at {
        if at <= now {
            return Err(ApiError::bad_request("expiresAt must be in the future"));
        }
    }

    let max_downloads = req
        .max_downloads
        .unwrap_or(state.config.share.default_max_downloads);
    if max_downloads == 0 {
        return Err(ApiError::bad_request("maxDownloads must be at least 1"));
    }

    let file = state
        .db
        .get_file(&req.file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let token = share::generate_token(&state.rng).map_err(|e| ApiError::internal(e.to_string()))?;
    let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(
            share::hash_password(&state.rng, password)
                .map_err(|e| ApiError::internal(e.to_string()))?,
        ),
        None => None,
    };

    let record = ShareLinkRecord {
        token: token.clone(),
        file_id: file.id,
        file_name: file.original_name,
        password_hash,
        expires_at,
        max_downloads,
        download_count: 0,
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        created_at: now,
        exhausted_at: None,
    };

    state
        .node
        .replicate(WriteOp::CreateShare(record.clone()))
        .await
        .map_err(replication_error)?;

    tracing::debug!(token = %token, file_id = %record.file_id, "Created share link");

    Ok(Success::json(CreateShareResponse {
        shared_link: share_to_response(&record, &state.config.share.public_base_url, now),
    }))
}

pub async fn list_shared_links(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Success<ShareListResponse>>, ApiError> {
    let shares = state
        .db
        .list_shares()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let now = Utc::now();
    let base_url = &state.config.share.public_base_url;
    let shared_links = shares
        .iter()
        .map(|s| share_to_response(s, base_url, now))
        .collect();

    Ok(Success::json(ShareListResponse { shared_links }))
}

pub async fn revoke_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<Success<Empty>>, ApiError> {
    state
        .db
        .get_share(&token)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Share link not found"))?;

    state
        .node
        .replicate(WriteOp::RevokeShare {
            token: token.clone(),
        })
        .await
        .map_err(replication_error)?;

    tracing::debug!(token = %token, "Revoked share link");
    Ok(Success::json(Empty {}))
}

// ============================================================================
// Public handlers (token is the credential)
// ============================================================================

pub async fn share_info(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<Success<PublicShareResponse>>, ApiError> {
    let share = find_share(&state, &token)?;
    let file = state
        .db
        .get_file(&share.file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Shared file no longer exists"))?;

    Ok(Success::json(PublicShareResponse {
        file_name: share.file_name.clone(),
        size: file.byte_size,
        mimetype: file.mime_type,
        has_password: share.has_password(),
        expires_at: share.expires_at.map(|t| t.to_rfc3339()),
        remaining_downloads: share.remaining_downloads(),
        status: share.status(Utc::now()),
    }))
}

pub async fn download_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let share = find_share(&state, &token)?;

    if let Some(ref hash) = share.password_hash {
        let supplied = headers
            .get(SHARE_PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok());
        let valid = match supplied {
            Some(password) => share::verify_password(password, hash)
                .map_err(|e| ApiError::internal(e.to_string()))?,
            None => false,
        };
        if !valid {
            return Err(ApiError::unauthorized(
                "A valid share password is required",
            ));
        }
    }

    // Check-then-record must not interleave with another download of this node.
    let guard = state.download_lock.lock().await;

    let share = find_share(&state, &token)?;
    let now = Utc::now();
    match share.status(now) {
        ShareStatus::Active => {}
        ShareStatus::Expired => return Err(ApiError::gone("Share link has expired")),
        ShareStatus::Exhausted => {
            return Err(ApiError::gone("Share link has reached its download limit"))
        }
    }

    let file = state
        .db
        .get_file(&share.file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Shared file no longer exists"))?;

    let reader = state.object_store.open(&file.id).await.map_err(|e| match e {
        ObjectStoreError::NotFound(_) => ApiError::not_found("File content not found"),
        _ => ApiError::internal(format!("Failed to retrieve file: {e}")),
    })?;

    state
        .node
        .replicate(WriteOp::RecordDownload {
            token: token.clone(),
            at: now,
        })
        .await
        .map_err(replication_error)?;
    drop(guard);

    tracing::debug!(
        token = %token,
        file_id = %file.id,
        downloads = share.download_count + 1,
        max_downloads = share.max_downloads,
        "Served share download"
    );

    Ok(download_response(&file, reader))
}

// ============================================================================
// Helpers
// ============================================================================

/// Stream `reader` back as an attachment named after the file.
fn download_response(file: &FileRecord, reader: ObjectReader) -> Response {
    let mut response = (StatusCode::OK, Body::from_stream(ReaderStream::new(reader))).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        file.mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        header::HeaderValue::from(file.byte_size),
    );
    let filename = file.original_name.replace(['"', '\\', '\r', '\n'], "_");
    if let Ok(value) = format!("attachment; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    // Every fetch counts against the cap, so nothing may serve it from cache.
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));

    response
}

fn find_share(state: &AppState, token: &str) -> Result<ShareLinkRecord, ApiError> {
    state
        .db
        .get_share(token)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Share link not found"))
}

pub(crate) fn share_url(base_url: &str, token: &str) -> String {
    format!("{base_url}/api/share/{token}/download")
}

pub(crate) fn share_to_response(
    share: &ShareLinkRecord,
    base_url: &str,
    now: DateTime<Utc>,
) -> ShareLinkResponse {
    ShareLinkResponse {
        token: share.token.clone(),
        file_id: share.file_id.clone(),
        file_name: share.file_name.clone(),
        has_password: share.has_password(),
        expires_at: share.expires_at.map(|t| t.to_rfc3339()),
        max_downloads: share.max_downloads,
        download_count: share.download_count,
        remaining_downloads: share.remaining_downloads(),
        description: share.description.clone(),
        created_at: share.created_at.to_rfc3339(),
        is_exhausted: share.is_exhausted(),
        exhausted_at: share.exhausted_at.map(|t| t.to_rfc3339()),
        share_url: share_url(base_url, &share.token),
        status: share.status(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_share() -> ShareLinkRecord {
        ShareLinkRecord {
            token: "tok".to_string(),
            file_id: "file-1".to_string(),
            file_name: "report.pdf".to_string(),
            password_hash: Some("pbkdf2-sha256$1$a$b".to_string()),
            expires_at: None,
            max_downloads: 2,
            download_count: 2,
            description: None,
            created_at: Utc::now(),
            exhausted_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_share_response_derives_fields() {
        let share = sample_share();
        let resp = share_to_response(&share, "https://relay.example", Utc::now());

        assert_eq!(resp.share_url, "https://relay.example/api/share/tok/download");
        assert!(resp.has_password);
        assert!(resp.is_exhausted);
        assert_eq!(resp.remaining_downloads, 0);
        assert_eq!(resp.status, ShareStatus::Exhausted);
    }

    #[test]
    fn test_share_response_never_leaks_password_hash() {
        let resp = share_to_response(&sample_share(), "http://x", Utc::now());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("pbkdf2"));
        assert!(json.contains("\"hasPassword\":true"));
    }

    #[tokio::test]
    async fn test_download_response_streams_attachment() {
        let file = FileRecord {
            id: "file-1".to_string(),
            original_name: "q3 \"final\"\r\n.pdf".to_string(),
            byte_size: 11,
            mime_type: "application/pdf".to_string(),
            uploaded_at: Utc::now(),
            ipfs_hash: None,
            upload_id: None,
        };
        let reader: ObjectReader = Box::new(std::io::Cursor::new(b"hello world".to_vec()));

        let resp = download_response(&file, reader);

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::CONTENT_LENGTH], "11");
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"q3 _final___.pdf\""
        );

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello world");
    }

    #[tokio::test]
    async fn test_download_response_falls_back_on_bad_mime() {
        let file = FileRecord {
            id: "file-2".to_string(),
            original_name: "blob".to_string(),
            byte_size: 0,
            mime_type: "not a\nmime".to_string(),
            uploaded_at: Utc::now(),
            ipfs_hash: None,
            upload_id: None,
        };
        let reader: ObjectReader = Box::new(std::io::Cursor::new(Vec::new()));

        let resp = download_response(&file, reader);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/octet-stream");
    }
}
