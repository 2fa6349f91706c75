use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::DomainError;

/// Speech-to-text backend for audio queries.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribes the audio file at `path`. The file is request-scoped; the
    /// caller owns its lifetime and cleanup.
    async fn transcribe(&self, path: &Path, mime: &str) -> Result<String, DomainError>;
}
