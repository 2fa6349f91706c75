use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{
    ports::VectorIndex, DomainError, Embedding, ProductChunk, ProductMatch,
};

/// Process-local index used in tests and single-node development. Mirrors
/// the Qdrant adapter's semantics, including the dimension guard and the
/// empty-query short-circuit.
pub struct InMemoryIndex {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    dimension: Option<usize>,
    rows: Vec<ProductChunk>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, DomainError> {
        self.inner
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, DomainError> {
        self.inner
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError> {
        let mut inner = self.write()?;
        match inner.dimension {
            Some(existing) if existing != dimension => Err(DomainError::DimensionMismatch {
                expected: dimension,
                actual: existing,
            }),
            Some(_) => Ok(()),
            None => {
                inner.dimension = Some(dimension);
                Ok(())
            }
        }
    }

    async fn recreate_collection(&self, dimension: usize) -> Result<(), DomainError> {
        let mut inner = self.write()?;
        inner.rows.clear();
        inner.dimension = Some(dimension);
        Ok(())
    }

    async fn upsert_chunks(
        &self,
        product_id: i64,
        chunks: &[ProductChunk],
    ) -> Result<(), DomainError> {
        let mut inner = self.write()?;
        for chunk in chunks {
            if chunk.vector.is_empty() {
                continue;
            }
            debug_assert_eq!(chunk.product_id, product_id);
            inner.rows.push(chunk.clone());
        }
        Ok(())
    }

    async fn delete_by_product(&self, product_id: i64) -> Result<(), DomainError> {
        let mut inner = self.write()?;
        inner.rows.retain(|row| row.product_id != product_id);
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
    ) -> Result<Vec<ProductMatch>, DomainError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let inner = self.read()?;

        let mut scored: Vec<ProductMatch> = inner
            .rows
            .iter()
            .map(|row| {
                ProductMatch::new(row.product_id, &row.product_name, query.cosine_distance(&row.vector))
                    .with_kind(row.kind)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(scored.into_iter().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChunkKind;

    fn chunk(product_id: i64, kind: ChunkKind, content: &str, vector: Vec<f32>) -> ProductChunk {
        ProductChunk::new(product_id, format!("Product {product_id}"), kind, content)
            .with_vector(Embedding::new(vector))
    }

    #[tokio::test]
    async fn test_upsert_and_search_orders_by_distance() {
        let index = InMemoryIndex::new();
        index.ensure_collection(3).await.unwrap();

        index
            .upsert_chunks(
                1,
                &[chunk(1, ChunkKind::Name, "exact", vec![1.0, 0.0, 0.0])],
            )
            .await
            .unwrap();
        index
            .upsert_chunks(
                2,
                &[chunk(2, ChunkKind::Name, "off-axis", vec![0.0, 1.0, 0.0])],
            )
            .await
            .unwrap();

        let hits = index
            .search(&Embedding::new(vec![1.0, 0.0, 0.0]), 10)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].product_id, 1);
        assert!(hits[0].distance < 0.001);
        assert_eq!(hits[1].product_id, 2);
        assert!(hits[1].distance > 0.9);
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let index = InMemoryIndex::new();
        index
            .upsert_chunks(1, &[chunk(1, ChunkKind::Name, "n", vec![1.0])])
            .await
            .unwrap();

        let hits = index.search(&Embedding::empty(), 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_chunks_with_empty_vectors_skipped() {
        let index = InMemoryIndex::new();
        let unembedded = ProductChunk::new(1, "P", ChunkKind::Description, "never embedded");
        index
            .upsert_chunks(
                1,
                &[
                    unembedded,
                    chunk(1, ChunkKind::Name, "n", vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let hits = index
            .search(&Embedding::new(vec![1.0, 0.0]), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, Some(ChunkKind::Name));
    }

    #[tokio::test]
    async fn test_delete_by_product_is_idempotent() {
        let index = InMemoryIndex::new();
        index
            .upsert_chunks(1, &[chunk(1, ChunkKind::Name, "n", vec![1.0])])
            .await
            .unwrap();

        index.delete_by_product(1).await.unwrap();
        // Second delete finds nothing and still succeeds.
        index.delete_by_product(1).await.unwrap();

        let hits = index.search(&Embedding::new(vec![1.0]), 10).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_collection_rejects_dimension_change() {
        let index = InMemoryIndex::new();
        index.ensure_collection(128).await.unwrap();
        index.ensure_collection(128).await.unwrap();

        let err = index.ensure_collection(256).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::DimensionMismatch {
                expected: 256,
                actual: 128
            }
        ));

        // The explicit path clears the data and adopts the new size.
        index.recreate_collection(256).await.unwrap();
        index.ensure_collection(256).await.unwrap();
    }
}
