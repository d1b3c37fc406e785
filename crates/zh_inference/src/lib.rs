use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use zh_core::{Error, Result};

pub mod models;

pub const DEFAULT_BASE_PROMPT: &str = "Translate the text to pinyin.";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Which generation backend to talk to. Picked once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Ollama,
    Gemini,
    Echo,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "ollama",
            BackendKind::Gemini => "gemini",
            BackendKind::Echo => "echo",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(BackendKind::Ollama),
            "gemini" => Ok(BackendKind::Gemini),
            "echo" => Ok(BackendKind::Echo),
            other => Err(Error::Config(format!(
                "Unknown model backend: {}. Available backends: ollama, gemini, echo",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    /// Backend specific model name, e.g. `llama3:latest` or `gemini-pro`
    pub model_name: Option<String>,
    /// Base URL of the backend API
    pub model_url: Option<String>,
    /// Cloud credential. Gemini falls back to the `GEMINI_API` env var.
    pub api_key: Option<String>,
    pub base_prompt: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model_name: None,
            model_url: None,
            api_key: None,
            base_prompt: DEFAULT_BASE_PROMPT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Resolve `path` below `base`, keeping any path prefix `base` carries
/// (e.g. a backend mounted at `/ollama/` behind a proxy).
pub(crate) fn endpoint_url(base: &str, path: &str) -> Result<Url> {
    let invalid = |e: url::ParseError| Error::InvalidUrl(format!("{}: {}", base, e));
    let mut url = Url::parse(base).map_err(invalid)?;
    if !url.path().ends_with('/') {
        let dir = format!("{}/", url.path());
        url.set_path(&dir);
    }
    url.join(path.trim_start_matches('/')).map_err(invalid)
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{BackendKind, Config};
    pub use zh_core::{Error, GenerationModel, GenerationOutput, Result};
}

pub use models::create_model;
