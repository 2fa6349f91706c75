use async_trait::async_trait;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfig;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeleteCollectionBuilder, DeletePointsBuilder, Distance,
    Filter, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{
    ports::VectorIndex, ChunkKind, DomainError, Embedding, ProductChunk, ProductMatch,
};

/// Qdrant-backed vector index. One named collection holds every chunk kind,
/// discriminated by a `type` payload field, so the relevance filtering stays
/// a single code path regardless of modality.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantIndex {
    pub fn connect(url: &str, collection: &str) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| DomainError::backend("qdrant", e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    async fn collection_dimension(&self) -> Result<Option<usize>, DomainError> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| DomainError::backend("qdrant", e.to_string()))?;

        if !collections
            .collections
            .iter()
            .any(|c| c.name == self.collection)
        {
            return Ok(None);
        }

        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| DomainError::backend("qdrant", e.to_string()))?;

        let size = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                VectorsConfig::Params(params) => Some(params.size as usize),
                VectorsConfig::ParamsMap(_) => None,
            })
            .ok_or_else(|| {
                DomainError::backend("qdrant", "collection has no readable vector config")
            })?;

        Ok(Some(size))
    }

    async fn create_collection(&self, dimension: usize) -> Result<(), DomainError> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(dimension as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(|e| DomainError::backend("qdrant", e.to_string()))?;
        Ok(())
    }

    fn point_id() -> u64 {
        let bytes = Uuid::new_v4();
        let bytes = bytes.as_bytes();
        u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), DomainError> {
        match self.collection_dimension().await? {
            Some(existing) if existing != dimension => Err(DomainError::DimensionMismatch {
                expected: dimension,
                actual: existing,
            }),
            Some(_) => Ok(()),
            None => self.create_collection(dimension).await,
        }
    }

    async fn recreate_collection(&self, dimension: usize) -> Result<(), DomainError> {
        if self.collection_dimension().await?.is_some() {
            self.client
                .delete_collection(DeleteCollectionBuilder::new(&self.collection))
                .await
                .map_err(|e| DomainError::backend("qdrant", e.to_string()))?;
        }
        self.create_collection(dimension).await
    }

    async fn upsert_chunks(
        &self,
        product_id: i64,
        chunks: &[ProductChunk],
    ) -> Result<(), DomainError> {
        let points: Vec<PointStruct> = chunks
            .iter()
            .filter(|chunk| !chunk.vector.is_empty())
            .map(|chunk| {
                let payload: Payload = serde_json::json!({
                    "product_id": product_id,
                    "product_name": chunk.product_name,
                    "type": chunk.kind.as_str(),
                    "content": chunk.content,
                    "indexed_at": chrono::Utc::now().to_rfc3339(),
                })
                .try_into()
                .map_err(|_| DomainError::internal("Failed to create payload"))?;

                Ok(PointStruct::new(
                    Self::point_id(),
                    chunk.vector.as_slice().to_vec(),
                    payload,
                ))
            })
            .collect::<Result<_, DomainError>>()?;

        if points.is_empty() {
            return Ok(());
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| DomainError::backend("qdrant", e.to_string()))?;

        Ok(())
    }

    async fn delete_by_product(&self, product_id: i64) -> Result<(), DomainError> {
        let filter = Filter::must([Condition::matches("product_id", product_id)]);

        // wait(true): the delete must be acknowledged before a re-import
        // starts inserting, or a concurrent search could see both versions.
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(filter)
                    .wait(true),
            )
            .await
            .map_err(|e| DomainError::backend("qdrant", e.to_string()))?;

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

        let results = match self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query.as_slice().to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
        {
            Ok(results) => results,
            Err(e) => {
                // A degraded index must not take down the query path.
                warn!(error = %e, "vector search failed, returning no results");
                return Ok(Vec::new());
            }
        };

        let matches: Vec<ProductMatch> = results
            .result
            .into_iter()
            .filter_map(|point| parse_match(&point.payload, point.score))
            .collect();

        Ok(matches)
    }
}

/// Maps one scored point's payload back to a [`ProductMatch`]. Points with
/// an unreadable payload are dropped rather than failing the whole result
/// set.
fn parse_match(
    payload: &std::collections::HashMap<String, qdrant_client::qdrant::Value>,
    score: f32,
) -> Option<ProductMatch> {
    let product_id = payload.get("product_id")?.as_integer()?;
    let title = payload.get("product_name")?.as_str()?.to_string();
    let kind = payload
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(|s| ChunkKind::parse(s));

    // Qdrant reports cosine similarity; the pipeline filters on cosine
    // distance.
    let mut matched = ProductMatch::new(product_id, title, 1.0 - score);
    if let Some(kind) = kind {
        matched = matched.with_kind(kind);
    }
    Some(matched)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use qdrant_client::qdrant::Value;

    use super::*;

    fn payload(entries: Vec<(&str, Value)>) -> HashMap<String, Value> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_parse_match_maps_payload_and_score() {
        let payload = payload(vec![
            ("product_id", Value::from(42i64)),
            ("product_name", Value::from("AquaPhone X")),
            ("type", Value::from("description")),
            ("content", Value::from("waterproof smartphone")),
        ]);

        let matched = parse_match(&payload, 0.8).unwrap();
        assert_eq!(matched.product_id, 42);
        assert_eq!(matched.title, "AquaPhone X");
        assert_eq!(matched.kind, Some(ChunkKind::Description));
        assert!((matched.distance - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_match_tolerates_missing_or_unknown_type() {
        let without_type = payload(vec![
            ("product_id", Value::from(7i64)),
            ("product_name", Value::from("HydroCam Pro")),
        ]);
        assert_eq!(parse_match(&without_type, 0.5).unwrap().kind, None);

        let unknown_type = payload(vec![
            ("product_id", Value::from(7i64)),
            ("product_name", Value::from("HydroCam Pro")),
            ("type", Value::from("hologram")),
        ]);
        assert_eq!(parse_match(&unknown_type, 0.5).unwrap().kind, None);
    }

    #[test]
    fn test_parse_match_drops_incomplete_payloads() {
        let missing_name = payload(vec![("product_id", Value::from(7i64))]);
        assert!(parse_match(&missing_name, 0.5).is_none());
        assert!(parse_match(&HashMap::new(), 0.5).is_none());
    }
}
