//! HTTP client for the Vertex AI `predictLongRunning` endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::request::GenerateVideoRequest;

/// Model the service submits to unless overridden in config.
pub const VEO_MODEL_ID: &str = "veo-3.1-generate-preview";

/// Connection settings for one Vertex AI project/region.
#[derive(Debug, Clone)]
pub struct VeoConfig {
    pub project_id: String,
    pub location: String,
    pub model_id: String,
}

impl VeoConfig {
    pub fn new(project_id: String, location: String) -> Self {
        Self {
            project_id,
            location,
            model_id: VEO_MODEL_ID.to_string(),
        }
    }

    /// Read from `GCP_PROJECT_ID`, `GCP_LOCATION`, and optional
    /// `VEO_MODEL_ID` overrides.
    pub fn from_env() -> Result<Self, VeoApiError> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .map_err(|_| VeoApiError::Config("GCP_PROJECT_ID is not set".to_string()))?;
        let location =
            std::env::var("GCP_LOCATION").unwrap_or_else(|_| "us-central1".to_string());
        let model_id =
            std::env::var("VEO_MODEL_ID").unwrap_or_else(|_| VEO_MODEL_ID.to_string());
        Ok(Self {
            project_id,
            location,
            model_id,
        })
    }

    /// Regional endpoint plus the full model resource path.
    fn model_url(&self) -> String {
        format!(
            "https://{loc}-aiplatform.googleapis.com/v1/projects/{proj}/locations/{loc}/publishers/google/models/{model}",
            loc = self.location,
            proj = self.project_id,
            model = self.model_id,
        )
    }
}

/// Errors from the Veo API layer.
#[derive(Debug, thiserror::Error)]
pub enum VeoApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Vertex AI returned a non-2xx status code.
    #[error("Veo API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The submit response did not carry an operation name.
    #[error("submit response missing operation name")]
    MissingOperationName,

    /// Could not obtain an access token.
    #[error("token error: {0}")]
    Token(String),

    /// Missing or invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Source of OAuth2 access tokens for Vertex AI calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, VeoApiError>;
}

/// Fixed token, for tests and short-lived tooling.
pub struct StaticTokenProvider(pub String);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, VeoApiError> {
        Ok(self.0.clone())
    }
}

/// Tokens from the GCE/GKE metadata server. Tokens are not cached;
/// the metadata server does its own caching and responds locally.
pub struct MetadataTokenProvider {
    client: reqwest::Client,
}

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

impl MetadataTokenProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for MetadataTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> Result<String, VeoApiError> {
        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|err| VeoApiError::Token(err.to_string()))?;
        if !response.status().is_success() {
            return Err(VeoApiError::Token(format!(
                "metadata server returned {}",
                response.status()
            )));
        }
        let token: MetadataToken = response
            .json()
            .await
            .map_err(|err| VeoApiError::Token(err.to_string()))?;
        Ok(token.access_token)
    }
}

/// One output of a finished operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputVideo {
    pub gcs_uri: String,
    pub mime_type: String,
}

/// Decoded state of a long-running operation.
#[derive(Debug, Clone)]
pub struct OperationStatus {
    pub done: bool,
    pub videos: Vec<OutputVideo>,
    pub error: Option<String>,
    /// Untouched provider response, persisted with the job row.
    pub raw: serde_json::Value,
}

impl OperationStatus {
    /// Decode a `fetchPredictOperation` response.
    ///
    /// `done` absent means still running. A done operation carries
    /// either `response.videos` or an `error.message`.
    pub fn from_raw(raw: serde_json::Value) -> Self {
        let done = raw["done"].as_bool().unwrap_or(false);
        let error = raw["error"]["message"].as_str().map(str::to_string);
        let videos = raw["response"]["videos"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            done,
            videos,
            error,
            raw,
        }
    }
}

/// Submission and polling surface, mockable in tests.
#[async_trait]
pub trait OperationClient: Send + Sync {
    /// Start a generation; returns the provider operation name.
    async fn submit(&self, request: &GenerateVideoRequest) -> Result<String, VeoApiError>;

    /// Fetch the current state of a running operation.
    async fn fetch_operation(
        &self,
        operation_name: &str,
    ) -> Result<OperationStatus, VeoApiError>;
}

/// HTTP client for a single Vertex AI project.
pub struct VeoClient {
    client: reqwest::Client,
    config: VeoConfig,
    tokens: Arc<dyn TokenProvider>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    name: Option<String>,
}

impl VeoClient {
    pub fn new(config: VeoConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            tokens,
        }
    }

    async fn post_json(
        &self,
        url: String,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, VeoApiError> {
        let token = self.tokens.access_token().await?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, surfacing the
    /// status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, VeoApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(VeoApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, VeoApiError> {
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl OperationClient for VeoClient {
    async fn submit(&self, request: &GenerateVideoRequest) -> Result<String, VeoApiError> {
        let url = format!("{}:predictLongRunning", self.config.model_url());
        let body = request.to_body();

        tracing::debug!(model = %self.config.model_id, "submitting generation");
        let response = self.post_json(url, &body).await?;
        let submit: SubmitResponse = Self::parse_response(response).await?;
        submit.name.ok_or(VeoApiError::MissingOperationName)
    }

    async fn fetch_operation(
        &self,
        operation_name: &str,
    ) -> Result<OperationStatus, VeoApiError> {
        let url = format!("{}:fetchPredictOperation", self.config.model_url());
        let body = serde_json::json!({ "operationName": operation_name });

        let response = self.post_json(url, &body).await?;
        let raw: serde_json::Value = Self::parse_response(response).await?;
        Ok(OperationStatus::from_raw(raw))
    }
}
