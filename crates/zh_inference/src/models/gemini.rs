use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use url::Url;
use zh_core::{Error, GenerationModel, GenerationOutput, Result};

use crate::Config;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiModel {
    client: Client,
    endpoint: Url,
    api_key: String,
    base_prompt: String,
}

impl GeminiModel {
    /// Build a client, reading the credential from `GEMINI_API` when the
    /// config does not carry one.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(GEMINI_API_KEY_ENV).ok());
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &Config, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::BackendUnavailable(format!(
                    "Gemini API key not found, set {}. Visit https://ai.google.dev/gemini-api/docs/api-key",
                    GEMINI_API_KEY_ENV
                ))
            })?;

        let base = config.model_url.as_deref().unwrap_or(DEFAULT_GEMINI_URL);
        let model = config.model_name.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        let endpoint =
            crate::endpoint_url(base, &format!("v1beta/models/{}:generateContent", model))?;

        Ok(Self {
            client: crate::build_client(config.timeout)?,
            endpoint,
            api_key,
            base_prompt: config.base_prompt.clone(),
        })
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl GenerationModel for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, text: &str) -> Result<GenerationOutput> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(format!("{}{}", self.base_prompt, text)),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("Gemini unreachable: {}", e.without_url())))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::BackendUnavailable(format!(
                "Gemini rejected the credential: {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("Gemini returned {}: {}", status, body.trim())));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("Malformed Gemini response: {}", e.without_url())))?;

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::Backend("Gemini returned no candidates".to_string()))?;

        // A blocked reply carries a finish reason but no content parts
        if candidate.content.parts.is_empty() {
            return Err(Error::Backend(format!(
                "Gemini returned an empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        debug!(chars = text.chars().count(), "Gemini generation done");
        Ok(GenerationOutput::from_text(text))
    }
}
