use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeminiConfig;
use crate::error::{FlowError, Result, ServiceError};

/// External collaborator that turns a prompt into free text.
///
/// `Ok(None)` means the service answered but no text could be extracted.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<Option<String>, ServiceError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Option<Vec<Part>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// One user turn carrying `prompt` as its only part.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: Some(vec![Part {
                    text: Some(prompt.into()),
                }]),
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

impl GenerateContentResponse {
    /// First candidate → its content → first part → text. Any missing link, or an
    /// empty string at the end of the chain, yields `None`.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .first()?
            .text
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}

/// HTTP client for Gemini `generateContent`
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| FlowError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl RecommendationService for GeminiClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<Option<String>, ServiceError> {
        let mut request = self
            .http
            .post(&self.config.api_url)
            .json(&GenerateContentRequest::from_prompt(prompt));
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key)]);
        }

        debug!(url = %self.config.api_url, "Sending generateContent request");
        let response = request.send().await.map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        let decoded: GenerateContentResponse = serde_json::from_str(&body)?;
        Ok(decoded.first_text().map(str::to_string))
    }
}
