pub mod embedding;
pub mod health;
pub mod products;
pub mod search;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::middleware::{api_key_auth, request_logger};
use crate::api::state::AppState;

/// Headroom on top of the configured upload ceiling for multipart framing,
/// so the transport-level cap never fires before the normalizer's own
/// size checks get to decide.
const BODY_LIMIT_OVERHEAD: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.config.cors_allowed_origins);
    let limits = &state.config.config.limits;
    let body_limit = limits.max_image_bytes.max(limits.max_audio_bytes) + BODY_LIMIT_OVERHEAD;

    let protected = Router::new()
        .route("/api/search/text", post(search::text_search))
        .route("/api/search/image", post(search::image_search))
        .route("/api/search/audio", post(search::audio_search))
        .route("/api/products", post(products::create_product))
        .route("/api/products/{id}", delete(products::delete_product))
        .route("/dimension", get(embedding::dimension))
        .route("/text-embedding", post(embedding::text_embedding))
        .route("/image-embedding", post(embedding::image_embedding))
        .route("/healthstatus", get(embedding::health_status))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api_key_auth,
        ));

    Router::new()
        .route("/", get(health::index))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}
