use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::{
    extract_chunks,
    ports::{EmbeddingGateway, VectorIndex},
    ChunkKind, DomainError, ImageSource, Product, ProductChunk,
};

/// How image chunks get their vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageEmbeddingMode {
    /// Describe the image and embed the description, so image chunks live in
    /// the same text space the search queries use. The description replaces
    /// the chunk content.
    #[default]
    Describe,
    /// Embed the image directly via the backend's image model.
    Direct,
}

impl ImageEmbeddingMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "describe" => Some(Self::Describe),
            "direct" => Some(Self::Direct),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub chunks: usize,
}

/// Drives chunk extraction, embedding and index writes for catalog records.
///
/// Re-importing a product deletes its prior rows before inserting the new
/// ones, so an edit can never leave stale chunks behind.
pub struct CatalogService {
    gateway: Arc<dyn EmbeddingGateway>,
    index: Arc<dyn VectorIndex>,
    image_mode: ImageEmbeddingMode,
    image_concurrency: usize,
}

impl CatalogService {
    pub fn new(gateway: Arc<dyn EmbeddingGateway>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            gateway,
            index,
            image_mode: ImageEmbeddingMode::default(),
            image_concurrency: 4,
        }
    }

    pub fn with_image_mode(mut self, mode: ImageEmbeddingMode) -> Self {
        self.image_mode = mode;
        self
    }

    /// Imports one product: extract chunks, embed them, replace whatever the
    /// index held for this product. The delete is acknowledged before the
    /// insert begins.
    #[instrument(skip(self, product), fields(product_id = product.id))]
    pub async fn import(&self, product: &Product) -> Result<usize, DomainError> {
        product.validate()?;

        let chunks = extract_chunks(product);
        let embedded = self.embed_chunks(chunks).await?;

        self.index.delete_by_product(product.id).await?;
        self.index.upsert_chunks(product.id, &embedded).await?;

        info!(chunks = embedded.len(), "product indexed");
        Ok(embedded.len())
    }

    /// Imports a batch. One bad product is logged and skipped; the batch
    /// continues.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub async fn import_batch(&self, products: &[Product]) -> ImportReport {
        let mut report = ImportReport::default();
        for product in products {
            match self.import(product).await {
                Ok(count) => {
                    report.imported += 1;
                    report.chunks += count;
                }
                Err(e) => {
                    warn!(product_id = product.id, error = %e, "skipping product");
                    report.skipped += 1;
                }
            }
        }
        report
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i64) -> Result<(), DomainError> {
        if product_id <= 0 {
            return Err(DomainError::validation("Product id must be positive"));
        }
        self.index.delete_by_product(product_id).await
    }

    /// Text chunks go to the backend as one batch; image chunks resolve
    /// individually (bounded concurrency) since each needs its own fetch.
    async fn embed_chunks(
        &self,
        chunks: Vec<ProductChunk>,
    ) -> Result<Vec<ProductChunk>, DomainError> {
        let (image_chunks, text_chunks): (Vec<ProductChunk>, Vec<ProductChunk>) =
            chunks.into_iter().partition(|c| c.kind == ChunkKind::Image);

        let texts: Vec<&str> = text_chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = self.gateway.embed_texts(&texts).await?;
        if vectors.len() != text_chunks.len() {
            return Err(DomainError::internal(format!(
                "embedding backend returned {} vectors for {} chunks",
                vectors.len(),
                text_chunks.len()
            )));
        }

        let mut embedded: Vec<ProductChunk> = text_chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| chunk.with_vector(vector))
            .collect();

        let images: Vec<ProductChunk> = stream::iter(
            image_chunks
                .into_iter()
                .map(|chunk| self.embed_image_chunk(chunk)),
        )
        .buffered(self.image_concurrency)
        .try_collect()
        .await?;
        embedded.extend(images);

        Ok(embedded)
    }

    async fn embed_image_chunk(&self, chunk: ProductChunk) -> Result<ProductChunk, DomainError> {
        let source = ImageSource::url(&chunk.content);
        match self.image_mode {
            ImageEmbeddingMode::Direct => {
                let vector = self.gateway.embed_image(&source).await?;
                Ok(chunk.with_vector(vector))
            }
            ImageEmbeddingMode::Describe => {
                let description = self.gateway.describe_image(&source).await?;
                let vector = self.gateway.embed_text(&description).await?;
                let mut chunk = chunk.with_vector(vector);
                chunk.content = description;
                Ok(chunk)
            }
        }
    }
}
