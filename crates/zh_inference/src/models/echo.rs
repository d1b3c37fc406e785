use async_trait::async_trait;
use zh_core::{GenerationModel, GenerationOutput, Result};

pub const DEFAULT_ECHO_PREFIX: &str = "OK:";

/// Offline backend that returns its input behind a fixed prefix.
#[derive(Debug, Clone)]
pub struct EchoModel {
    prefix: String,
}

impl EchoModel {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for EchoModel {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_PREFIX)
    }
}

#[async_trait]
impl GenerationModel for EchoModel {
    fn name(&self) -> &str {
        "Echo"
    }

    async fn generate(&self, text: &str) -> Result<GenerationOutput> {
        Ok(GenerationOutput::from_text(format!("{}{}", self.prefix, text)))
    }
}
