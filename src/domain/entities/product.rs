use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::entities::embedding::Embedding;
use crate::domain::errors::{DomainError, Result};

/// A catalog item, normalized from a loosely typed JSON or XML record.
///
/// Created at ingestion time and never mutated after indexing; re-importing
/// a product replaces all of its prior vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// Leaf fields the parser did not recognize, in encounter order. These
    /// become `generic` chunks so new vendor fields are searchable without a
    /// schema change.
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

impl Product {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    /// A product must carry a positive id before any vector write; chunks
    /// without an owning id are rejected at this gate.
    pub fn validate(&self) -> Result<()> {
        if self.id <= 0 {
            return Err(DomainError::validation("Product id must be positive"));
        }
        Ok(())
    }
}

/// Discriminator for the semantic role of a chunk within its product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Name,
    Description,
    Brand,
    Category,
    Price,
    Specification,
    Feature,
    Image,
    Generic,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Brand => "brand",
            Self::Category => "category",
            Self::Price => "price",
            Self::Specification => "specification",
            Self::Feature => "feature",
            Self::Image => "image",
            Self::Generic => "generic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "description" => Some(Self::Description),
            "brand" => Some(Self::Brand),
            "category" => Some(Self::Category),
            "price" => Some(Self::Price),
            "specification" => Some(Self::Specification),
            "feature" => Some(Self::Feature),
            "image" => Some(Self::Image),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    /// Scalar-field and generic chunks are suppressed when the same
    /// (kind, content) pair repeats; specification and feature chunks are
    /// not, since multiple distinct entries of those kinds are expected.
    pub fn deduplicates(&self) -> bool {
        !matches!(self, Self::Specification | Self::Feature)
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic embeddable unit derived from a [`Product`].
///
/// Content is non-empty after trimming; for image chunks it is the image URL
/// rather than literal text. The vector stays empty until the catalog
/// service embeds the chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductChunk {
    pub product_id: i64,
    pub product_name: String,
    pub kind: ChunkKind,
    pub content: String,
    #[serde(default = "Embedding::empty")]
    pub vector: Embedding,
}

impl ProductChunk {
    pub fn new(
        product_id: i64,
        product_name: impl Into<String>,
        kind: ChunkKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            kind,
            content: content.into(),
            vector: Embedding::empty(),
        }
    }

    pub fn with_vector(mut self, vector: Embedding) -> Self {
        self.vector = vector;
        self
    }
}

/// Splits a product into semantically distinct chunks for fine-grained
/// retrieval.
///
/// One chunk per non-empty scalar field (name, description, brand, category,
/// price), an `image` chunk only when the image URL validates, one
/// `specification` chunk per entry as `"{name}: {value}"`, one `feature`
/// chunk per non-empty feature, and one `generic` chunk per unrecognized
/// leaf field keyed by its own name. Duplicate (kind, content) pairs are
/// suppressed for deduplicating kinds.
pub fn extract_chunks(product: &Product) -> Vec<ProductChunk> {
    let mut chunks: Vec<ProductChunk> = Vec::new();
    let mut seen: HashSet<(ChunkKind, String)> = HashSet::new();

    let mut push = |kind: ChunkKind, content: &str, chunks: &mut Vec<ProductChunk>| {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        if kind.deduplicates() && !seen.insert((kind, content.to_string())) {
            return;
        }
        chunks.push(ProductChunk::new(product.id, &product.name, kind, content));
    };

    push(ChunkKind::Name, &product.name, &mut chunks);
    push(ChunkKind::Description, &product.description, &mut chunks);
    push(ChunkKind::Brand, &product.brand, &mut chunks);
    push(ChunkKind::Category, &product.category, &mut chunks);
    if let Some(price) = product.price {
        push(ChunkKind::Price, &format!("{price}"), &mut chunks);
    }
    if is_valid_image_url(&product.image_url) {
        push(ChunkKind::Image, &product.image_url, &mut chunks);
    }
    for (name, value) in &product.specifications {
        push(
            ChunkKind::Specification,
            &format!("{name}: {value}"),
            &mut chunks,
        );
    }
    for feature in &product.features {
        push(ChunkKind::Feature, feature, &mut chunks);
    }
    for (field, value) in &product.extra {
        push(ChunkKind::Generic, &format!("{field}: {value}"), &mut chunks);
    }

    chunks
}

/// Minimal check that an image reference is a fetchable http(s) URL.
pub fn is_valid_image_url(url: &str) -> bool {
    let url = url.trim();
    let rest = match url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };
    let host = rest.split('/').next().unwrap_or_default();
    !host.is_empty() && !url.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        let mut product = Product::new(42, "AquaPhone X");
        product.sku = "AQX-001".into();
        product.description = "Waterproof smartphone with a 48MP camera".into();
        product.brand = "HydroTech".into();
        product.category = "Smartphones".into();
        product.price = Some(599.99);
        product.image_url = "https://cdn.example.com/aquaphone.jpg".into();
        product.rating = Some(4.5);
        product.stock = Some(12);
        product
            .specifications
            .insert("Display".into(), "6.1 inch OLED".into());
        product
            .specifications
            .insert("Battery".into(), "4500 mAh".into());
        product.features = vec!["IP68 water resistance".into(), "Wireless charging".into()];
        product
    }

    #[test]
    fn test_extract_chunks_full_product() {
        let chunks = extract_chunks(&sample_product());

        let kinds: Vec<ChunkKind> = chunks.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChunkKind::Name,
                ChunkKind::Description,
                ChunkKind::Brand,
                ChunkKind::Category,
                ChunkKind::Price,
                ChunkKind::Image,
                ChunkKind::Specification,
                ChunkKind::Specification,
                ChunkKind::Feature,
                ChunkKind::Feature,
            ]
        );
        assert!(chunks.iter().all(|c| c.product_id == 42));
        assert!(chunks.iter().all(|c| c.product_name == "AquaPhone X"));
        assert!(chunks.iter().all(|c| c.vector.is_empty()));

        let price = chunks.iter().find(|c| c.kind == ChunkKind::Price).unwrap();
        assert_eq!(price.content, "599.99");

        let specs: Vec<&str> = chunks
            .iter()
            .filter(|c| c.kind == ChunkKind::Specification)
            .map(|c| c.content.as_str())
            .collect();
        assert_eq!(specs, vec!["Battery: 4500 mAh", "Display: 6.1 inch OLED"]);
    }

    #[test]
    fn test_extract_chunks_skips_blank_fields() {
        let mut product = Product::new(7, "Bare");
        product.description = "   ".into();
        product.features = vec!["".into(), "  ".into(), "real feature".into()];

        let chunks = extract_chunks(&product);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].kind, ChunkKind::Name);
        assert_eq!(chunks[1].content, "real feature");
    }

    #[test]
    fn test_image_chunk_requires_valid_url() {
        let mut product = Product::new(7, "Cam");
        product.image_url = "not a url".into();
        assert!(!extract_chunks(&product)
            .iter()
            .any(|c| c.kind == ChunkKind::Image));

        product.image_url = "https://cdn.example.com/cam.png".into();
        assert!(extract_chunks(&product)
            .iter()
            .any(|c| c.kind == ChunkKind::Image));
    }

    #[test]
    fn test_duplicate_generic_fields_suppressed() {
        let mut product = Product::new(7, "Dup");
        product.extra = vec![
            ("color".into(), "Red".into()),
            ("color".into(), "Red".into()),
            ("color".into(), "Blue".into()),
        ];

        let generic_contents: Vec<String> = extract_chunks(&product)
            .into_iter()
            .filter(|c| c.kind == ChunkKind::Generic)
            .map(|c| c.content)
            .collect();
        assert_eq!(generic_contents, vec!["color: Red", "color: Blue"]);
    }

    #[test]
    fn test_same_content_different_kinds_both_kept() {
        let mut product = Product::new(7, "Acme");
        product.brand = "Acme".into();

        let chunks = extract_chunks(&product);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].kind, ChunkKind::Name);
        assert_eq!(chunks[1].kind, ChunkKind::Brand);
        assert_eq!(chunks[0].content, chunks[1].content);
    }

    #[test]
    fn test_feature_duplicates_kept() {
        let mut product = Product::new(7, "Feat");
        product.features = vec!["fast charging".into(), "fast charging".into()];

        let features = extract_chunks(&product)
            .into_iter()
            .filter(|c| c.kind == ChunkKind::Feature)
            .count();
        assert_eq!(features, 2);
    }

    #[test]
    fn test_validate_rejects_missing_id() {
        assert!(Product::new(0, "NoId").validate().is_err());
        assert!(Product::new(-3, "NoId").validate().is_err());
        assert!(Product::new(1, "Ok").validate().is_ok());
    }

    #[test]
    fn test_image_url_validation() {
        assert!(is_valid_image_url("https://example.com/a.jpg"));
        assert!(is_valid_image_url("http://example.com/a.jpg"));
        assert!(!is_valid_image_url("ftp://example.com/a.jpg"));
        assert!(!is_valid_image_url("https://"));
        assert!(!is_valid_image_url("https://exa mple.com/a.jpg"));
        assert!(!is_valid_image_url(""));
    }
}
