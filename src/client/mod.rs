//! Typed client for the relay's REST API.
//!
//! Every call is a single request with no retry. Failures come back as
//! [`ClientError`] and are terminal for that action.

mod models;

pub use models::{
    FileEntry, NewShare, SharedLink, UploadReceipt, UploadRequest, UploadTarget,
};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;

use crate::config::DEFAULT_MAX_UPLOAD_SIZE;
use models::{CreatedShare, FileList, SharedLinkList};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Request failed: {0}")]
    Rejected(String),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("{name} is {size} bytes, over the {limit} byte upload limit")]
    TooLarge { name: String, size: u64, limit: u64 },
}

/// Outcome of one file in a batch upload.
#[derive(Debug)]
pub struct UploadOutcome {
    pub file_name: String,
    pub result: Result<UploadReceipt, ClientError>,
}

pub struct RelayClient {
    base_url: String,
    token: Option<String>,
    max_upload_size: u64,
    client: Client,
}

impl RelayClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            client,
        })
    }

    /// Override the advisory per-file limit checked before uploading.
    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = bytes;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and unwrap the `{success, error?, ...}` envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let resp = self.authed(request).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        let envelope: Option<serde_json::Value> = serde_json::from_slice(&body).ok();
        let error_message = envelope
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(|e| e.as_str())
            .map(str::to_string);

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message.unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                }),
            });
        }

        let envelope =
            envelope.ok_or_else(|| ClientError::Decode("response is not JSON".to_string()))?;
        let success = envelope
            .get("success")
            .and_then(|s| s.as_bool())
            .unwrap_or(false);
        if !success {
            return Err(ClientError::Rejected(
                error_message.unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }

        serde_json::from_value(envelope).map_err(|e| ClientError::Decode(e.to_string()))
    }

    // ========================================================================
    // Files
    // ========================================================================

    pub async fn list_files(&self) -> Result<Vec<FileEntry>, ClientError> {
        let list: FileList = self
            .send(self.client.get(self.url("/api/files/list")))
            .await?;
        Ok(list.files)
    }

    pub async fn delete_file(&self, id: &str) -> Result<(), ClientError> {
        let _: IgnoredAny = self
            .send(self.client.delete(self.url(&format!("/api/files/delete/{id}"))))
            .await?;
        Ok(())
    }

    /// Upload one file. Files over the advisory limit fail locally without a request.
    pub async fn upload_file(
        &self,
        upload: UploadRequest,
        target: UploadTarget,
    ) -> Result<UploadReceipt, ClientError> {
        let size = upload.data.len() as u64;
        if size > self.max_upload_size {
            return Err(ClientError::TooLarge {
                name: upload.file_name,
                size,
                limit: self.max_upload_size,
            });
        }

        let mut part = Part::bytes(upload.data.to_vec()).file_name(upload.file_name);
        if let Some(ref mime) = upload.mime_type {
            part = part.mime_str(mime)?;
        }

        let mut form = Form::new().part("file", part);
        if let Some(upload_id) = upload.upload_id {
            form = form.text("uploadId", upload_id);
        }
        if let Some(custom_name) = upload.custom_name {
            form = form.text("customName", custom_name);
        }

        self.send(self.client.post(self.url(target.path())).multipart(form))
            .await
    }

    /// Upload files one at a time, in order. A failure is recorded and the
    /// batch moves on to the next file.
    pub async fn upload_batch(
        &self,
        uploads: Vec<UploadRequest>,
        target: UploadTarget,
    ) -> Vec<UploadOutcome> {
        let mut outcomes = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let file_name = upload.file_name.clone();
            let result = self.upload_file(upload, target).await;
            if let Err(ref e) = result {
                tracing::warn!(file = %file_name, error = %e, "Upload failed");
            }
            outcomes.push(UploadOutcome { file_name, result });
        }
        outcomes
    }

    // ========================================================================
    // Share links
    // ========================================================================

    pub async fn list_shared_links(&self) -> Result<Vec<SharedLink>, ClientError> {
        let list: SharedLinkList = self
            .send(self.client.get(self.url("/api/files/shared-links")))
            .await?;
        Ok(list.shared_links)
    }

    pub async fn create_share(&self, share: &NewShare) -> Result<SharedLink, ClientError> {
        let created: CreatedShare = self
            .send(self.client.post(self.url("/api/files/share")).json(share))
            .await?;
        Ok(created.shared_link)
    }

    pub async fn revoke_share(&self, token: &str) -> Result<(), ClientError> {
        let _: IgnoredAny = self
            .send(self.client.delete(self.url(&format!("/api/files/share/{token}"))))
            .await?;
        Ok(())
    }
}
