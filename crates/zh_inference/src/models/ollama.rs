use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use url::Url;
use zh_core::{Error, GenerationModel, GenerationOutput, Result};

use crate::Config;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3:latest";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    eval_duration: Option<u64>,
}

/// Strip tabs and newlines so the prompt stays on one line.
pub fn sanitize_prompt_input(text: &str) -> String {
    text.chars().filter(|c| *c != '\t' && *c != '\n').collect()
}

/// Client for a local Ollama server's `/api/generate` endpoint.
pub struct OllamaModel {
    client: Client,
    endpoint: Url,
    model_name: String,
    base_prompt: String,
}

impl OllamaModel {
    pub fn new(config: &Config) -> Result<Self> {
        let base = config.model_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
        let endpoint = crate::endpoint_url(base, "api/generate")?;

        Ok(Self {
            client: crate::build_client(config.timeout)?,
            endpoint,
            model_name: config
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            base_prompt: config.base_prompt.clone(),
        })
    }
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint.as_str())
            .field("model_name", &self.model_name)
            .finish()
    }
}

#[async_trait]
impl GenerationModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(&self, text: &str) -> Result<GenerationOutput> {
        let request = GenerateRequest {
            model: &self.model_name,
            prompt: format!("{}{}", self.base_prompt, sanitize_prompt_input(text)),
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::BackendUnavailable(format!("Ollama at {} unreachable: {}", self.endpoint, e))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("Ollama returned {}: {}", status, body.trim())));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("Malformed Ollama response: {}", e)))?;

        debug!(model = %self.model_name, eval_count = ?body.eval_count, "Ollama generation done");
        Ok(GenerationOutput {
            text: body.response,
            eval_count: body.eval_count,
            eval_duration: body.eval_duration,
        })
    }
}
