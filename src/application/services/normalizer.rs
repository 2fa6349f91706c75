use std::io::Write;
use std::sync::Arc;

use tracing::{instrument, warn};

use crate::domain::{
    detect_audio_mime, detect_image_format,
    ports::{EmbeddingGateway, SpeechToText},
    DomainError, ImageSource, MediaUpload, NormalizedQuery, SearchInput,
};

/// Input ceilings enforced before any backend call.
#[derive(Debug, Clone)]
pub struct MediaLimits {
    pub max_query_chars: usize,
    pub max_image_bytes: usize,
    pub max_audio_bytes: usize,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_query_chars: 500,
            max_image_bytes: 10 * 1024 * 1024,
            max_audio_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Reduces any input modality to `(query_text, embedding_vector)`.
///
/// Image and audio inputs are anchored into the same text-embedding space as
/// plain queries: images are described and the description embedded, audio is
/// transcribed and the transcript embedded. Validation failures surface
/// before a single backend round trip.
pub struct ModalityNormalizer {
    gateway: Arc<dyn EmbeddingGateway>,
    speech: Arc<dyn SpeechToText>,
    limits: MediaLimits,
}

impl ModalityNormalizer {
    pub fn new(gateway: Arc<dyn EmbeddingGateway>, speech: Arc<dyn SpeechToText>) -> Self {
        Self {
            gateway,
            speech,
            limits: MediaLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: MediaLimits) -> Self {
        self.limits = limits;
        self
    }

    #[instrument(skip(self, input), fields(modality = input.modality()))]
    pub async fn normalize(&self, input: &SearchInput) -> Result<NormalizedQuery, DomainError> {
        match input {
            SearchInput::Text { message } => self.normalize_text(message).await,
            SearchInput::Image(upload) => self.normalize_image(upload).await,
            SearchInput::Audio(upload) => self.normalize_audio(upload).await,
        }
    }

    async fn normalize_text(&self, message: &str) -> Result<NormalizedQuery, DomainError> {
        let text = message.trim();
        if text.is_empty() {
            return Err(DomainError::invalid_query("Query must not be empty"));
        }
        if text.chars().count() > self.limits.max_query_chars {
            return Err(DomainError::invalid_query(format!(
                "Query exceeds {} characters",
                self.limits.max_query_chars
            )));
        }

        let vector = self.gateway.embed_text(text).await?;
        Ok(NormalizedQuery {
            text: text.to_string(),
            vector,
        })
    }

    async fn normalize_image(&self, upload: &MediaUpload) -> Result<NormalizedQuery, DomainError> {
        let format = detect_image_format(upload)
            .ok_or_else(|| DomainError::invalid_image("Invalid image type"))?;
        if upload.bytes.len() > self.limits.max_image_bytes {
            return Err(DomainError::invalid_image("Image too large"));
        }

        let source = ImageSource::from_upload(upload, format);
        let description = self
            .gateway
            .describe_image(&source)
            .await
            .map_err(into_description_failure)?;
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::description_failed("empty description"));
        }

        // Embed the description, not the image, so image search shares the
        // text-embedding space of every other query.
        let vector = self.gateway.embed_text(&description).await?;
        Ok(NormalizedQuery {
            text: description,
            vector,
        })
    }

    async fn normalize_audio(&self, upload: &MediaUpload) -> Result<NormalizedQuery, DomainError> {
        let mime = detect_audio_mime(upload)
            .ok_or_else(|| DomainError::invalid_audio("Invalid audio type"))?;
        if upload.bytes.is_empty() {
            return Err(DomainError::invalid_audio("Invalid audio file"));
        }
        if upload.bytes.len() > self.limits.max_audio_bytes {
            return Err(DomainError::invalid_audio("Audio too large"));
        }

        // Request-scoped spill to disk; the handle's drop removes the file on
        // every exit path, including the error returns below.
        let mut spooled = tempfile::NamedTempFile::new()
            .map_err(|e| DomainError::internal(format!("temp file: {e}")))?;
        spooled
            .write_all(&upload.bytes)
            .and_then(|_| spooled.flush())
            .map_err(|e| DomainError::internal(format!("temp file: {e}")))?;

        let transcript = match self.speech.transcribe(spooled.path(), mime).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "speech backend failed");
                return Err(DomainError::TranscriptionFailed);
            }
        };
        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(DomainError::TranscriptionFailed);
        }

        let vector = self.gateway.embed_text(&transcript).await?;
        Ok(NormalizedQuery {
            text: transcript,
            vector,
        })
    }
}

fn into_description_failure(err: DomainError) -> DomainError {
    if err.is_client_error() {
        err
    } else {
        DomainError::description_failed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::Embedding;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[derive(Default)]
    struct MockGateway {
        embed_calls: AtomicUsize,
        describe_calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingGateway for MockGateway {
        async fn embed_text(&self, text: &str) -> Result<Embedding, DomainError> {
            if text.trim().is_empty() {
                return Err(DomainError::empty_input("blank text"));
            }
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Embedding::new(vec![1.0, 0.0, 0.0, 0.0]))
        }

        async fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed_text(text).await?);
            }
            Ok(out)
        }

        async fn embed_image(&self, _image: &ImageSource) -> Result<Embedding, DomainError> {
            Ok(Embedding::new(vec![0.0, 1.0, 0.0, 0.0]))
        }

        async fn describe_image(&self, _image: &ImageSource) -> Result<String, DomainError> {
            self.describe_calls.fetch_add(1, Ordering::SeqCst);
            Ok("a red waterproof running shoe".to_string())
        }

        fn dimension(&self) -> usize {
            4
        }

        async fn health(&self) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct MockSpeech {
        transcript: String,
        calls: AtomicUsize,
    }

    impl MockSpeech {
        fn new(transcript: &str) -> Self {
            Self {
                transcript: transcript.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SpeechToText for MockSpeech {
        async fn transcribe(&self, path: &Path, _mime: &str) -> Result<String, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(path.exists(), "audio temp file must exist during transcription");
            Ok(self.transcript.clone())
        }
    }

    fn normalizer(gateway: Arc<MockGateway>, speech: Arc<MockSpeech>) -> ModalityNormalizer {
        ModalityNormalizer::new(gateway, speech)
    }

    #[tokio::test]
    async fn test_text_query_trimmed_and_embedded() {
        let gateway = Arc::new(MockGateway::default());
        let n = normalizer(gateway.clone(), Arc::new(MockSpeech::new("")));

        let q = n
            .normalize(&SearchInput::text("  waterproof phone  "))
            .await
            .unwrap();
        assert_eq!(q.text, "waterproof phone");
        assert_eq!(q.vector.dimension(), 4);
        assert_eq!(gateway.embed_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_backend() {
        let gateway = Arc::new(MockGateway::default());
        let n = normalizer(gateway.clone(), Arc::new(MockSpeech::new("")));

        let err = n.normalize(&SearchInput::text("   ")).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuery(_)));
        assert_eq!(gateway.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_length_boundary() {
        let gateway = Arc::new(MockGateway::default());
        let n = normalizer(gateway.clone(), Arc::new(MockSpeech::new("")));

        let exactly_max = "a".repeat(500);
        assert!(n.normalize(&SearchInput::text(exactly_max)).await.is_ok());

        let one_over = "a".repeat(501);
        let err = n.normalize(&SearchInput::text(one_over)).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_image_described_then_text_embedded() {
        let gateway = Arc::new(MockGateway::default());
        let n = normalizer(gateway.clone(), Arc::new(MockSpeech::new("")));

        let upload = MediaUpload::new(PNG_HEADER.to_vec()).with_file_name("shoe.png");
        let q = n.normalize(&SearchInput::Image(upload)).await.unwrap();

        assert_eq!(q.text, "a red waterproof running shoe");
        assert_eq!(gateway.describe_calls.load(Ordering::SeqCst), 1);
        // The description goes through the text embedder, never embed_image.
        assert_eq!(gateway.embed_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_text_file_as_image_rejected_without_backend_calls() {
        let gateway = Arc::new(MockGateway::default());
        let n = normalizer(gateway.clone(), Arc::new(MockSpeech::new("")));

        let upload = MediaUpload::new(b"just words".to_vec())
            .with_content_type("text/plain")
            .with_file_name("query.txt");
        let err = n.normalize(&SearchInput::Image(upload)).await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidImage(ref m) if m == "Invalid image type"));
        assert_eq!(gateway.describe_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_image_rejected() {
        let gateway = Arc::new(MockGateway::default());
        let n = normalizer(gateway.clone(), Arc::new(MockSpeech::new(""))).with_limits(MediaLimits {
            max_image_bytes: 16,
            ..MediaLimits::default()
        });

        let mut bytes = PNG_HEADER.to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        let err = n
            .normalize(&SearchInput::Image(MediaUpload::new(bytes)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidImage(ref m) if m == "Image too large"));
    }

    #[tokio::test]
    async fn test_audio_transcribed_and_embedded() {
        let gateway = Arc::new(MockGateway::default());
        let speech = Arc::new(MockSpeech::new("find me a cheap tablet"));
        let n = normalizer(gateway.clone(), speech.clone());

        let upload = MediaUpload::new(vec![0u8; 128]).with_content_type("audio/mpeg");
        let q = n.normalize(&SearchInput::Audio(upload)).await.unwrap();

        assert_eq!(q.text, "find me a cheap tablet");
        assert_eq!(speech.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.embed_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_transcription_fails() {
        let gateway = Arc::new(MockGateway::default());
        let speech = Arc::new(MockSpeech::new("   "));
        let n = normalizer(gateway.clone(), speech);

        let upload = MediaUpload::new(vec![0u8; 128]).with_content_type("audio/wav");
        let err = n.normalize(&SearchInput::Audio(upload)).await.unwrap_err();

        assert!(matches!(err, DomainError::TranscriptionFailed));
        assert_eq!(gateway.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_audio_type_rejected() {
        let gateway = Arc::new(MockGateway::default());
        let n = normalizer(gateway.clone(), Arc::new(MockSpeech::new("hi")));

        let upload = MediaUpload::new(vec![0u8; 8]).with_content_type("application/pdf");
        let err = n.normalize(&SearchInput::Audio(upload)).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidAudio(_)));
    }
}
