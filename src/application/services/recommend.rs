use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::application::services::normalizer::ModalityNormalizer;
use crate::domain::{
    ports::{CompletionBackend, VectorIndex},
    ChatTurn, DomainError, ProductMatch, Recommendation, SearchInput, TurnRole,
};

/// Knobs for the search-and-filter half of the pipeline.
#[derive(Debug, Clone)]
pub struct SearchPolicy {
    /// Neighbors requested from the index. Kept small so prompts stay compact.
    pub top_k: usize,
    /// Hard relevance cutoff on cosine distance; candidates beyond it are
    /// discarded entirely, even when nothing else qualifies.
    pub max_distance: f32,
    pub completion_timeout: Duration,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_distance: 0.5,
            completion_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendPrompts {
    /// System instruction for the completion backend.
    pub system: String,
    /// Canned body returned when nothing survives the relevance cutoff.
    pub no_results: String,
}

impl Default for RecommendPrompts {
    fn default() -> Self {
        Self {
            system: "You are a shopping assistant. Recommend only products from the \
                     provided list, never invent alternatives, and keep the answer short."
                .to_string(),
            no_results: "Sorry, no matching products were found. Try describing what you \
                         are looking for in different words."
                .to_string(),
        }
    }
}

/// Runs the query-to-recommendation pipeline:
/// normalize → search → filter → (no-results | completion) → response.
///
/// Stages are strictly sequential; each backend failure is translated into
/// the domain error taxonomy here and nothing is retried. When zero
/// candidates survive the cutoff the completion backend is never invoked, so
/// the model can't hallucinate a recommendation with no grounding.
pub struct RecommendService {
    normalizer: ModalityNormalizer,
    index: Arc<dyn VectorIndex>,
    completion: Arc<dyn CompletionBackend>,
    prompts: RecommendPrompts,
    policy: SearchPolicy,
}

impl RecommendService {
    pub fn new(
        normalizer: ModalityNormalizer,
        index: Arc<dyn VectorIndex>,
        completion: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            normalizer,
            index,
            completion,
            prompts: RecommendPrompts::default(),
            policy: SearchPolicy::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: RecommendPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[instrument(skip(self, input, history), fields(modality = input.modality()))]
    pub async fn recommend(
        &self,
        input: SearchInput,
        history: &[ChatTurn],
    ) -> Result<Recommendation, DomainError> {
        let normalized = self.normalizer.normalize(&input).await?;

        let hits = self
            .index
            .search(&normalized.vector, self.policy.top_k)
            .await?;
        let products = self.filter_candidates(hits);

        if products.is_empty() {
            debug!(query = %normalized.text, "no candidates within relevance cutoff");
            return Ok(Recommendation::no_results(
                normalized.text,
                &self.prompts.no_results,
            ));
        }

        let prompt = build_prompt(&normalized.text, &products, history);
        let response = tokio::time::timeout(
            self.policy.completion_timeout,
            self.completion.complete(&self.prompts.system, &prompt),
        )
        .await
        .map_err(|_| DomainError::timeout("Recommendation timed out"))??;

        let turns = vec![
            ChatTurn::user(&normalized.text),
            ChatTurn::assistant(&response),
        ];
        Ok(Recommendation {
            query: normalized.text,
            response,
            products,
            turns,
        })
    }

    /// Applies the hard distance cutoff, then collapses chunk-level hits to
    /// one entry per product keeping the best distance, ascending.
    fn filter_candidates(&self, hits: Vec<ProductMatch>) -> Vec<ProductMatch> {
        let mut products: Vec<ProductMatch> = Vec::new();
        for hit in hits {
            if !hit.distance.is_finite() || hit.distance > self.policy.max_distance {
                continue;
            }
            match products
                .iter_mut()
                .find(|p| p.product_id == hit.product_id)
            {
                Some(existing) => {
                    if hit.distance < existing.distance {
                        *existing = hit;
                    }
                }
                None => products.push(hit),
            }
        }
        products.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        products
    }
}

/// Builds the single user turn sent to the completion backend: the original
/// query plus a numbered listing of the surviving candidates, with any
/// caller-supplied history prepended. System-role turns in the history are
/// dropped — they are never part of accumulated history.
fn build_prompt(query: &str, products: &[ProductMatch], history: &[ChatTurn]) -> String {
    let listing = products
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {} (similarity {:.2})", i + 1, p.title, p.similarity()))
        .collect::<Vec<_>>()
        .join("\n");

    let request = format!("Customer request: {query}\n\nMatching products:\n{listing}");

    let context = history
        .iter()
        .filter(|t| t.role != TurnRole::System)
        .map(|t| format!("{}: {}", t.role.as_str(), t.content))
        .collect::<Vec<_>>()
        .join("\n");

    if context.is_empty() {
        return request;
    }

    format!("Previous conversation:\n{context}\n\nCurrent message from user: {request}")
}
