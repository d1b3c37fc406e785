use std::sync::Arc;
use tracing::info;
use zh_core::{GenerationModel, Result};

use crate::{BackendKind, Config};

pub mod echo;
pub mod gemini;
pub mod ollama;

pub use echo::EchoModel;
pub use gemini::GeminiModel;
pub use ollama::OllamaModel;

/// Build the backend selected by `config.backend`.
///
/// Construction does not touch the network. A missing Gemini credential is
/// reported here as `Error::BackendUnavailable`.
pub fn create_model(config: &Config) -> Result<Arc<dyn GenerationModel>> {
    let model: Arc<dyn GenerationModel> = match config.backend {
        BackendKind::Ollama => Arc::new(OllamaModel::new(config)?),
        BackendKind::Gemini => Arc::new(GeminiModel::new(config)?),
        BackendKind::Echo => Arc::new(EchoModel::default()),
    };
    info!("🧠 Generation backend ready (using {})", model.name());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zh_core::Error;

    #[test]
    fn test_create_model() {
        let model = create_model(&Config::default()).unwrap();
        assert_eq!(model.name(), "Ollama");

        let config = Config {
            backend: BackendKind::Echo,
            ..Config::default()
        };
        assert_eq!(create_model(&config).unwrap().name(), "Echo");

        let config = Config {
            backend: BackendKind::Gemini,
            api_key: Some("key".to_string()),
            ..Config::default()
        };
        assert_eq!(create_model(&config).unwrap().name(), "Gemini");
    }

    #[test]
    fn test_create_model_reports_bad_url() {
        let config = Config {
            model_url: Some("::".to_string()),
            ..Config::default()
        };
        assert!(matches!(create_model(&config), Err(Error::InvalidUrl(_))));
    }
}
