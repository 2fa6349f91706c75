use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;

use crate::domain::{ports::CompletionBackend, DomainError};

pub struct OpenAiCompletion {
    model: String,
}

impl OpenAiCompletion {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompletion {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError> {
        let client = openai::Client::from_env();
        let agent = client.agent(&self.model).preamble(system).build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::backend("completion", e.to_string()))
    }
}
