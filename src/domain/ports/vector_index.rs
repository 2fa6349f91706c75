use async_trait::async_trait;

use crate::domain::{errors::DomainError, Embedding, ProductChunk, ProductMatch};

/// Uniform interface to the vector similarity index, one named collection.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Idempotent create-if-absent. Never silently succeeds when an existing
    /// collection has a different vector size; a dimension change requires
    /// [`VectorIndex::recreate_collection`], not auto-migration.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError>;

    /// The explicit drop-and-recreate path for dimension changes.
    async fn recreate_collection(&self, dimension: usize) -> Result<(), DomainError>;

    /// Writes one row per chunk carrying product id, product name, chunk type
    /// and vector. Chunks with empty vectors are silently skipped — a missing
    /// embedding for one attribute must not block the rest.
    async fn upsert_chunks(
        &self,
        product_id: i64,
        chunks: &[ProductChunk],
    ) -> Result<(), DomainError>;

    /// Removes all rows for a product. Idempotent; a no-op when nothing exists.
    async fn delete_by_product(&self, product_id: i64) -> Result<(), DomainError>;

    /// Ranked nearest neighbors, ordered by ascending cosine distance.
    ///
    /// Fails softly: backend errors yield an empty list (a degraded index
    /// must not take down the query path), and an empty query vector
    /// short-circuits to empty without calling the backend.
    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
    ) -> Result<Vec<ProductMatch>, DomainError>;
}
