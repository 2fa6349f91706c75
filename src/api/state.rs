use std::sync::Arc;

use crate::application::{CatalogService, RecommendService};
use crate::domain::ports::EmbeddingGateway;
use crate::infrastructure::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub recommend: Arc<RecommendService>,
    pub catalog: Arc<CatalogService>,
    /// Shared with the services above; also served directly by the
    /// embedding passthrough endpoints.
    pub gateway: Arc<dyn EmbeddingGateway>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        recommend: Arc<RecommendService>,
        catalog: Arc<CatalogService>,
        gateway: Arc<dyn EmbeddingGateway>,
        config: AppConfig,
    ) -> Self {
        Self {
            recommend,
            catalog,
            gateway,
            config: Arc::new(config),
        }
    }
}
