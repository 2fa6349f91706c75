//! Offline batch import: parses a JSON or XML catalog export and writes each
//! product's chunks into the vector index the API searches.
//!
//! Usage: `ingest [--recreate] <catalog.json|catalog.xml>`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopsense::application::services::{CatalogService, ImageEmbeddingMode};
use shopsense::domain::ports::{EmbeddingGateway, VectorIndex};
use shopsense::domain::Product;
use shopsense::infrastructure::{
    parse_products_json, parse_products_xml, AppConfig, QdrantIndex, RemoteEmbeddingGateway,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ingest=info,shopsense=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let mut recreate = false;
    let mut file: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--recreate" => recreate = true,
            other => file = Some(other.to_string()),
        }
    }
    let file = file.ok_or_else(|| {
        anyhow::anyhow!("usage: ingest [--recreate] <catalog.json|catalog.xml>")
    })?;

    let products = load_products(Path::new(&file))?;
    info!(count = products.len(), file = %file, "catalog parsed");

    let app_config = AppConfig::load()?;
    let config = &app_config.config;

    // Collection setup failure is fatal for the whole run; nothing is
    // touched before both backends answer.
    let gateway = Arc::new(
        RemoteEmbeddingGateway::connect(
            &config.embedding.url,
            Duration::from_secs(config.embedding.timeout_seconds),
        )
        .await?,
    );
    let index = Arc::new(QdrantIndex::connect(
        &config.qdrant.url,
        &config.qdrant.collection,
    )?);
    if recreate {
        index.recreate_collection(gateway.dimension()).await?;
        info!("collection recreated");
    } else {
        index.ensure_collection(gateway.dimension()).await?;
    }

    let image_mode = ImageEmbeddingMode::parse(&config.ingest.image_mode)
        .ok_or_else(|| anyhow::anyhow!("unknown image_mode: {}", config.ingest.image_mode))?;
    let catalog = CatalogService::new(gateway, index).with_image_mode(image_mode);

    let report = catalog.import_batch(&products).await;
    info!(
        imported = report.imported,
        skipped = report.skipped,
        chunks = report.chunks,
        "import finished"
    );

    if report.imported == 0 && report.skipped > 0 {
        anyhow::bail!("no products were imported");
    }
    Ok(())
}

fn load_products(path: &Path) -> anyhow::Result<Vec<Product>> {
    let raw = std::fs::read_to_string(path)?;
    let products = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_products_json(&raw)?,
        Some("xml") => parse_products_xml(&raw)?,
        _ => anyhow::bail!("unsupported catalog format, expected .json or .xml"),
    };
    Ok(products)
}
