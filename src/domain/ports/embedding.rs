use async_trait::async_trait;

use crate::domain::{errors::DomainError, Embedding, ImageSource};

/// Uniform interface over the embedding backend; hides provider transport.
///
/// Implementations must return vectors of exactly `dimension()` elements for
/// every successful call, reject blank text before any backend round trip,
/// and probe the backend at construction so a dead provider fails fast
/// instead of queueing broken state into dependent components.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    async fn embed_text(&self, text: &str) -> Result<Embedding, DomainError>;

    async fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError>;

    /// Embeds image content directly. Fails with `UnsupportedMediaType` when
    /// the content is not an allow-listed image format.
    async fn embed_image(&self, image: &ImageSource) -> Result<Embedding, DomainError>;

    /// Natural-language description of an image; used both as chunk content
    /// for image indexing and as the textual anchor for image search.
    async fn describe_image(&self, image: &ImageSource) -> Result<String, DomainError>;

    /// The active model's fixed vector dimension, for sizing the index schema.
    fn dimension(&self) -> usize;

    /// Live backend probe.
    async fn health(&self) -> Result<(), DomainError>;
}
