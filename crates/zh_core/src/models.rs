use async_trait::async_trait;
use crate::types::GenerationOutput;
use crate::Result;

#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// Short human readable backend name, used in logs
    fn name(&self) -> &str;

    /// Turn raw article text into annotated text.
    ///
    /// Fails with `Error::BackendUnavailable` when the backend cannot be
    /// reached or rejects the credential, and with `Error::Backend` when it
    /// answers with a failure or a body that cannot be decoded.
    async fn generate(&self, text: &str) -> Result<GenerationOutput>;
}
