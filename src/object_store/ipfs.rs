use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PinError {
    #[error("IPFS request failed: {0}")]
    Request(String),
    #[error("IPFS node rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected IPFS response: {0}")]
    InvalidResponse(String),
}

/// Pins content on a content-addressed network and returns its hash.
#[async_trait]
pub trait Pinner: Send + Sync {
    /// Add and pin `data`, returning the content identifier.
    async fn pin(&self, name: &str, data: Bytes) -> Result<String, PinError>;
    /// Release a pin. Content that is not pinned is not an error.
    async fn unpin(&self, cid: &str) -> Result<(), PinError>;
}

/// Pinner backed by a Kubo node's HTTP RPC API.
pub struct IpfsPinner {
    api_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Deserialize)]
struct RpcError {
    #[serde(rename = "Message")]
    message: String,
}

impl IpfsPinner {
    pub fn new(api_url: &str) -> Result<Self, PinError> {
        let client = Client::builder()
            .build()
            .map_err(|e| PinError::Request(e.to_string()))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn add_url(&self) -> String {
        format!("{}/api/v0/add?pin=true&cid-version=1", self.api_url)
    }

    fn pin_rm_url(&self, cid: &str) -> String {
        format!("{}/api/v0/pin/rm?arg={}", self.api_url, cid)
    }

    async fn rejection(resp: reqwest::Response) -> PinError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RpcError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        PinError::Rejected { status, message }
    }
}

#[async_trait]
impl Pinner for IpfsPinner {
    async fn pin(&self, name: &str, data: Bytes) -> Result<String, PinError> {
        let part = Part::bytes(data.to_vec()).file_name(name.to_string());
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.add_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| PinError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        // Kubo streams one JSON object per added entry; a single file yields one.
        let body = resp
            .text()
            .await
            .map_err(|e| PinError::Request(e.to_string()))?;
        let line = body
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| PinError::InvalidResponse("empty add response".to_string()))?;
        let added: AddResponse = serde_json::from_str(line)
            .map_err(|e| PinError::InvalidResponse(e.to_string()))?;

        tracing::debug!(cid = %added.hash, name = %name, "Pinned content");
        Ok(added.hash)
    }

    async fn unpin(&self, cid: &str) -> Result<(), PinError> {
        let resp = self
            .client
            .post(self.pin_rm_url(cid))
            .send()
            .await
            .map_err(|e| PinError::Request(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }

        match Self::rejection(resp).await {
            PinError::Rejected { message, .. } if message.contains("not pinned") => Ok(()),
            e => Err(e),
        }
    }
}
