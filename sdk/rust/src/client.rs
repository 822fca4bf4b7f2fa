use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ad service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRequest {
    pub user_id: String,
    pub ad_type: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdResponse {
    pub ad_id: String,
    pub ad_type: String,
    pub bid_amount: f64,
    pub user_data: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub ad_type: String,
    pub title: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

/// Result of `GET /test/trace_propagation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePropagationReport {
    pub status: String,
    pub trace_id: String,
    pub span_id: String,
    pub analytics_response: serde_json::Value,
    pub message: String,
    pub timestamp: u64,
}

pub struct AdServiceClient {
    client: Client,
    base_url: String,
}

impl AdServiceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let resp = self.client.get(self.url("/health")).send().await?;
        decode(resp).await
    }

    pub async fn list_ads(&self) -> Result<Vec<AdDescriptor>, ClientError> {
        let resp = self.client.get(self.url("/ads")).send().await?;
        decode(resp).await
    }

    /// Request an ad. A malformed request surfaces as `ClientError::Status`
    /// with status 400 and the service's parse error as the body.
    pub async fn request_ad(&self, req: &AdRequest) -> Result<AdResponse, ClientError> {
        let resp = self
            .client
            .post(self.url("/ads/request"))
            .json(req)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn trace_propagation(&self) -> Result<TracePropagationReport, ClientError> {
        let resp = self
            .client
            .get(self.url("/test/trace_propagation"))
            .send()
            .await?;
        decode(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body: text,
        });
    }

    Ok(serde_json::from_str(&text)?)
}
