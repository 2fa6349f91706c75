use serde::{Deserialize, Serialize};

use crate::domain::entities::product::ChunkKind;
use crate::domain::entities::query::ChatTurn;

/// One similarity-search neighbor. Ephemeral — never persisted, ordered by
/// ascending cosine distance as returned by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product_id: i64,
    pub title: String,
    /// Cosine distance to the query vector; lower is more similar.
    pub distance: f32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChunkKind>,
}

impl ProductMatch {
    pub fn new(product_id: i64, title: impl Into<String>, distance: f32) -> Self {
        Self {
            product_id,
            title: title.into(),
            distance,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ChunkKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Similarity on the 0..1 scale used when listing candidates in prompts.
    pub fn similarity(&self) -> f32 {
        (1.0 - self.distance).clamp(0.0, 1.0)
    }
}

/// The assembled outcome of one pipeline run.
///
/// `products` reflects exactly the filtered candidate set that grounded the
/// recommendation; `turns` carries the new user/assistant pair only when the
/// completion backend actually ran, so callers can extend their own history.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub query: String,
    pub response: String,
    pub products: Vec<ProductMatch>,
    pub turns: Vec<ChatTurn>,
}

impl Recommendation {
    pub fn no_results(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: message.into(),
            products: Vec::new(),
            turns: Vec::new(),
        }
    }
}
