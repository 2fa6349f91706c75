use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::{
    detect_image_format, DomainError, Embedding, ImageSource, MediaUpload,
};

/// Passthrough endpoints exposing the embedding backend directly, for
/// debugging and for external ingestion tooling.

#[derive(Debug, Serialize)]
pub struct DimensionResponse {
    pub dimension: usize,
}

#[derive(Debug, Deserialize)]
pub struct TextEmbeddingRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Embedding>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn dimension(State(state): State<AppState>) -> Json<DimensionResponse> {
    Json(DimensionResponse {
        dimension: state.gateway.dimension(),
    })
}

pub async fn text_embedding(
    State(state): State<AppState>,
    Json(request): Json<TextEmbeddingRequest>,
) -> Result<Json<EmbeddingsResponse>, ApiError> {
    if request.texts.is_empty() {
        return Err(DomainError::empty_input("No texts provided").into());
    }
    let texts: Vec<&str> = request.texts.iter().map(String::as_str).collect();
    let embeddings = state.gateway.embed_texts(&texts).await?;
    Ok(Json(EmbeddingsResponse { embeddings }))
}

pub async fn image_embedding(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<EmbeddingsResponse>, ApiError> {
    let mut upload: Option<MediaUpload> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DomainError::validation(format!("Malformed multipart body: {e}")))?;

        let mut found = MediaUpload::new(bytes.to_vec());
        if let Some(content_type) = content_type {
            found = found.with_content_type(content_type);
        }
        if let Some(file_name) = file_name {
            found = found.with_file_name(file_name);
        }
        upload = Some(found);
        break;
    }

    let upload = upload.ok_or_else(|| DomainError::invalid_image("No image file provided"))?;
    let format = detect_image_format(&upload)
        .ok_or_else(|| DomainError::invalid_image("Invalid image type"))?;

    let embedding = state
        .gateway
        .embed_image(&ImageSource::from_upload(&upload, format))
        .await?;
    Ok(Json(EmbeddingsResponse {
        embeddings: vec![embedding],
    }))
}

pub async fn health_status(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    state.gateway.health().await?;
    Ok(Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    }))
}
