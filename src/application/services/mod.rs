pub mod catalog;
pub mod normalizer;
pub mod recommend;

pub use catalog::{CatalogService, ImageEmbeddingMode, ImportReport};
pub use normalizer::{MediaLimits, ModalityNormalizer};
pub use recommend::{RecommendPrompts, RecommendService, SearchPolicy};
