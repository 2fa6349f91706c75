use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopsense::api::{create_router, AppState};
use shopsense::application::services::{
    CatalogService, ImageEmbeddingMode, ModalityNormalizer, RecommendService,
};
use shopsense::domain::ports::{EmbeddingGateway, VectorIndex};
use shopsense::infrastructure::{
    completion_from_config, AppConfig, QdrantIndex, RemoteEmbeddingGateway, RemoteSpeechToText,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=debug,shopsense=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let app_config = AppConfig::load()?;
    let config = app_config.config.clone();

    // Fail fast: a dead embedding backend should stop the process here, not
    // surface on the first request.
    let gateway = Arc::new(
        RemoteEmbeddingGateway::connect(
            &config.embedding.url,
            Duration::from_secs(config.embedding.timeout_seconds),
        )
        .await?,
    );
    info!(dimension = gateway.dimension(), "embedding gateway connected");

    let index = Arc::new(QdrantIndex::connect(
        &config.qdrant.url,
        &config.qdrant.collection,
    )?);
    index.ensure_collection(gateway.dimension()).await?;

    let speech = Arc::new(RemoteSpeechToText::new(
        &config.speech.url,
        &config.speech.model,
        Duration::from_secs(config.speech.timeout_seconds),
    )?);
    let completion = completion_from_config(&config.llm)?;

    let normalizer = ModalityNormalizer::new(gateway.clone(), speech)
        .with_limits(app_config.media_limits());
    let recommend = Arc::new(
        RecommendService::new(normalizer, index.clone(), completion)
            .with_prompts(app_config.prompts())
            .with_policy(app_config.search_policy()),
    );

    let image_mode = ImageEmbeddingMode::parse(&config.ingest.image_mode)
        .ok_or_else(|| anyhow::anyhow!("unknown image_mode: {}", config.ingest.image_mode))?;
    let catalog =
        Arc::new(CatalogService::new(gateway.clone(), index).with_image_mode(image_mode));

    let state = AppState::new(recommend, catalog, gateway, app_config);
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
