use async_trait::async_trait;

use crate::domain::errors::DomainError;

/// Chat-completion backend that turns a grounded prompt into free text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError>;
}
