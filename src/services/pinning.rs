use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const API_URL: &str = "https://api.pinata.cloud";
const GATEWAY_URL: &str = "https://ipfs.io/ipfs";

/// Content-addressed storage: pin a blob or a JSON document, get back a
/// gateway URL derived from its content hash.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn pin_file(&self, bytes: Vec<u8>, filename: &str) -> Result<String, PinError>;

    async fn pin_json(&self, content: &Value, name: &str) -> Result<String, PinError>;
}

/// Client for the Pinata pinning API.
pub struct PinataClient {
    http: Client,
    api_key: String,
    secret_api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataClient {
    pub fn new(api_key: &str, secret_api_key: &str) -> Self {
        Self::with_base_url(api_key, secret_api_key, API_URL)
    }

    /// Point the client at a custom API root (useful for testing).
    pub fn with_base_url(api_key: &str, secret_api_key: &str, base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            api_key: api_key.to_string(),
            secret_api_key: secret_api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn gateway_url(hash: &str) -> String {
        format!("{GATEWAY_URL}/{hash}")
    }

    async fn into_gateway_url(response: reqwest::Response) -> Result<String, PinError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PinError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: PinResponse = response.json().await?;
        Ok(Self::gateway_url(&body.ipfs_hash))
    }
}

#[async_trait]
impl ContentStore for PinataClient {
    async fn pin_file(&self, bytes: Vec<u8>, filename: &str) -> Result<String, PinError> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.base_url))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_api_key)
            .multipart(form)
            .send()
            .await?;

        Self::into_gateway_url(response).await
    }

    async fn pin_json(&self, content: &Value, name: &str) -> Result<String, PinError> {
        let response = self
            .http
            .post(format!("{}/pinning/pinJSONToIPFS", self.base_url))
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.secret_api_key)
            .json(&json!({
                "pinataContent": content,
                "pinataMetadata": { "name": name },
            }))
            .send()
            .await?;

        Self::into_gateway_url(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("HTTP request to pinning service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("pinning service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
}
