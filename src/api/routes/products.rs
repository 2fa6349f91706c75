use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::infrastructure::parse_product_json;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub product_id: i64,
    pub chunks: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Ingests one product from a loosely typed JSON payload: parse, chunk,
/// embed, replace whatever the index held for it.
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ImportResponse>, ApiError> {
    let product = parse_product_json(&payload)?;
    let chunks = state.catalog.import(&product).await?;

    Ok(Json(ImportResponse {
        success: true,
        product_id: product.id,
        chunks,
    }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.catalog.delete_product(id).await?;
    Ok(Json(DeleteResponse { success: true }))
}
