pub mod anthropic;
pub mod openai;

use std::sync::Arc;

pub use anthropic::AnthropicCompletion;
pub use openai::OpenAiCompletion;

use crate::domain::ports::CompletionBackend;
use crate::infrastructure::config::LlmConfig;

/// Picks the completion provider named in the config. Provider credentials
/// come from the environment, as rig's clients expect.
pub fn completion_from_config(config: &LlmConfig) -> anyhow::Result<Arc<dyn CompletionBackend>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiCompletion::new(&config.model))),
        "anthropic" => Ok(Arc::new(AnthropicCompletion::new(&config.model))),
        other => anyhow::bail!("unknown llm provider: {other}"),
    }
}
