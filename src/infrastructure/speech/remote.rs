use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::domain::{ports::SpeechToText, DomainError};

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whisper-compatible transcription endpoint: a multipart `file` upload to
/// `/v1/audio/transcriptions` answering `{text}`.
pub struct RemoteSpeechToText {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl RemoteSpeechToText {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::backend("speech", e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl SpeechToText for RemoteSpeechToText {
    async fn transcribe(&self, path: &Path, mime: &str) -> Result<String, DomainError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::backend("speech", format!("reading audio: {e}")))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| DomainError::backend("speech", e.to_string()))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response = self
            .http
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DomainError::backend("speech", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::backend(
                "speech",
                format!("backend returned {status}"),
            ));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| DomainError::backend("speech", e.to_string()))?;

        Ok(body.text)
    }
}
