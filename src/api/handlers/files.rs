use axum::extract::{Multipart, Path, State};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::replication_error;
use crate::api::response::{ApiError, AppQuery, Empty, Success};
use crate::listing::{self, SortKey, SortOrder};
use crate::storage::models::{FileRecord, FileType, WriteOp};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    pub id: String,
    pub original_name: String,
    pub size: u64,
    pub mimetype: String,
    pub file_type: FileType,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file: FileResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFilesParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

/// Multipart fields of an upload request.
struct UploadForm {
    data: Bytes,
    file_name: Option<String>,
    content_type: Option<String>,
    upload_id: Option<String>,
    custom_name: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<Success<FileListResponse>>, ApiError> {
    let files = state
        .db
        .list_files()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let files = listing::search(
        &files,
        params.search.as_deref().unwrap_or_default(),
        params.sort.unwrap_or_default(),
        params.order.unwrap_or_default(),
    )
    .into_iter()
    .map(file_to_response)
    .collect();

    Ok(Success::json(FileListResponse { files }))
}

/// Store an upload on this node only.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Success<UploadResponse>>, ApiError> {
    let form = read_upload_form(&state, multipart).await?;
    ingest(&state, form, false).await
}

/// Store an upload and pin it on the configured IPFS node.
pub async fn upload_to_ipfs(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Success<UploadResponse>>, ApiError> {
    if state.pinner.is_none() {
        return Err(ApiError::unavailable("IPFS pinning is not configured"));
    }
    let form = read_upload_form(&state, multipart).await?;
    ingest(&state, form, true).await
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Success<Empty>>, ApiError> {
    let file = state
        .db
        .get_file(&id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    // Phase 1: Remove metadata (and the file's share links) via muster
    let operation = WriteOp::DeleteFile { id: id.clone() };
    state
        .node
        .replicate(operation)
        .await
        .map_err(replication_error)?;

    // Phase 2: Release the blob and the pin (best-effort)
    if let Err(e) = state.object_store.delete(&id).await {
        tracing::warn!(file_id = %id, error = %e, "Failed to delete file from object storage");
    }
    if let (Some(cid), Some(pinner)) = (file.ipfs_hash.as_deref(), state.pinner.as_ref()) {
        if let Err(e) = pinner.unpin(cid).await {
            tracing::warn!(file_id = %id, cid = %cid, error = %e, "Failed to unpin file");
        }
    }

    tracing::debug!(file_id = %id, "Deleted file");
    Ok(Success::json(Empty {}))
}

// ============================================================================
// Helpers
// ============================================================================

async fn read_upload_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<UploadForm, ApiError> {
    let mut data: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut upload_id: Option<String> = None;
    let mut custom_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                content_type = field.content_type().map(|s| s.to_string());

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if bytes.len() as u64 > state.config.max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum upload size of {} bytes",
                        state.config.max_upload_size
                    )));
                }
                data = Some(bytes);
            }
            "uploadId" => {
                upload_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid uploadId: {e}")))?,
                );
            }
            "customName" => {
                custom_name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid customName: {e}")))?,
                );
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = data.ok_or_else(|| ApiError::bad_request("file field is required"))?;

    Ok(UploadForm {
        data,
        file_name,
        content_type,
        upload_id: upload_id.filter(|s| !s.trim().is_empty()),
        custom_name,
    })
}

async fn ingest(
    state: &AppState,
    form: UploadForm,
    pin: bool,
) -> Result<Json<Success<UploadResponse>>, ApiError> {
    let name = display_name(form.custom_name.as_deref(), form.file_name.as_deref());
    let mime_type = resolve_mime(form.content_type, &name);
    let byte_size = form.data.len() as u64;
    let id = uuid::Uuid::new_v4().to_string();

    // Phase 1: Upload bytes to object storage (keyed by UUID)
    state
        .object_store
        .put(&id, form.data.clone())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store file: {e}")))?;

    // Phase 2: Pin on IPFS when requested
    let ipfs_hash = match (pin, state.pinner.as_ref()) {
        (true, Some(pinner)) => match pinner.pin(&name, form.data).await {
            Ok(cid) => Some(cid),
            Err(e) => {
                let _ = state.object_store.delete(&id).await;
                return Err(ApiError::bad_gateway(format!("Failed to pin file: {e}")));
            }
        },
        _ => None,
    };

    // Phase 3: Write metadata to redb via muster
    let file_record = FileRecord {
        id: id.clone(),
        original_name: name,
        byte_size,
        mime_type,
        uploaded_at: Utc::now(),
        ipfs_hash: ipfs_hash.clone(),
        upload_id: form.upload_id.clone(),
    };

    let operation = WriteOp::CreateFile(file_record.clone());
    if let Err(e) = state.node.replicate(operation).await {
        // Best-effort cleanup of the uploaded blob and pin
        let _ = state.object_store.delete(&id).await;
        if let (Some(cid), Some(pinner)) = (ipfs_hash.as_deref(), state.pinner.as_ref()) {
            let _ = pinner.unpin(cid).await;
        }
        return Err(replication_error(e));
    }

    tracing::debug!(
        file_id = %id,
        name = %file_record.original_name,
        pinned = file_record.is_pinned(),
        "Stored upload"
    );

    Ok(Success::json(UploadResponse {
        file: file_to_response(&file_record),
        ipfs_hash,
        upload_id: form.upload_id,
    }))
}

/// The uploader's custom name wins over the multipart file name when non-blank.
fn display_name(custom_name: Option<&str>, file_name: Option<&str>) -> String {
    custom_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or(file_name.map(str::trim).filter(|n| !n.is_empty()))
        .unwrap_or("upload")
        .to_string()
}

/// Determine MIME type: from multipart Content-Type, or guess from the name, or fallback
fn resolve_mime(content_type: Option<String>, name: &str) -> String {
    content_type
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .or_else(|| mime_guess::from_path(name).first().map(|m| m.to_string()))
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

pub(crate) fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        id: file.id.clone(),
        original_name: file.original_name.clone(),
        size: file.byte_size,
        mimetype: file.mime_type.clone(),
        file_type: file.file_type(),
        timestamp: file.uploaded_at.to_rfc3339(),
        ipfs_hash: file.ipfs_hash.clone(),
        pinned: file.is_pinned(),
        upload_id: file.upload_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_custom_name() {
        assert_eq!(display_name(Some(" report "), Some("a.pdf")), "report");
        assert_eq!(display_name(Some("   "), Some("a.pdf")), "a.pdf");
        assert_eq!(display_name(None, None), "upload");
    }

    #[test]
    fn test_resolve_mime_guesses_from_name() {
        assert_eq!(
            resolve_mime(Some("application/octet-stream".into()), "photo.png"),
            "image/png"
        );
        assert_eq!(resolve_mime(Some("text/csv".into()), "x.bin"), "text/csv");
        assert_eq!(resolve_mime(None, "noext"), "application/octet-stream");
    }
}
