use thiserror::Error;

/// Failure taxonomy for the search pipeline.
///
/// Validation variants surface as HTTP 400 and are raised before any backend
/// call; backend variants surface as HTTP 500 with a stage-identifying
/// message. Degraded search (nothing found, everything filtered out) is not
/// an error and never appears here.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("{0}")]
    InvalidImage(String),

    #[error("{0}")]
    InvalidAudio(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Image description failed: {0}")]
    DescriptionFailed(String),

    #[error("Transcription failed")]
    TranscriptionFailed,

    #[error("{backend} unavailable: {detail}")]
    BackendUnavailable { backend: String, detail: String },

    #[error("Collection dimension is {actual}, expected {expected}; drop and recreate the collection")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn invalid_audio(msg: impl Into<String>) -> Self {
        Self::InvalidAudio(msg.into())
    }

    pub fn unsupported_media(msg: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }

    pub fn description_failed(msg: impl Into<String>) -> Self {
        Self::DescriptionFailed(msg.into())
    }

    pub fn backend(backend: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            detail: detail.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for failures caused by the request itself rather than a backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput(_)
                | Self::InvalidQuery(_)
                | Self::InvalidImage(_)
                | Self::InvalidAudio(_)
                | Self::UnsupportedMediaType(_)
                | Self::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
