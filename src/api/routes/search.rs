use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::{
    ChatTurn, DomainError, MediaUpload, ProductMatch, Recommendation, SearchInput,
};

#[derive(Debug, Deserialize)]
pub struct TextSearchRequest {
    pub message: String,
    /// Prior user/assistant turns, owned by the caller. The response returns
    /// them extended with this exchange.
    #[serde(default)]
    pub history: Option<Vec<ChatTurn>>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub response: String,
    pub products: Vec<ProductMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ChatTurn>>,
}

impl SearchResponse {
    fn from_recommendation(rec: Recommendation, history: Option<Vec<ChatTurn>>) -> Self {
        let history = history.map(|mut turns| {
            turns.extend(rec.turns.clone());
            turns
        });
        Self {
            success: true,
            query: rec.query,
            response: rec.response,
            products: rec.products,
            history,
        }
    }
}

pub async fn text_search(
    State(state): State<AppState>,
    Json(request): Json<TextSearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let history = request.history.clone().unwrap_or_default();
    let rec = state
        .recommend
        .recommend(SearchInput::text(request.message), &history)
        .await?;
    Ok(Json(SearchResponse::from_recommendation(
        rec,
        request.history,
    )))
}

pub async fn image_search(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SearchResponse>, ApiError> {
    let upload = extract_upload(multipart, "image")
        .await?
        .ok_or_else(|| DomainError::invalid_image("No image file provided"))?;

    let rec = state
        .recommend
        .recommend(SearchInput::Image(upload), &[])
        .await?;
    Ok(Json(SearchResponse::from_recommendation(rec, None)))
}

pub async fn audio_search(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SearchResponse>, ApiError> {
    let upload = extract_upload(multipart, "audio")
        .await?
        .ok_or_else(|| DomainError::invalid_audio("No audio file provided"))?;

    let rec = state
        .recommend
        .recommend(SearchInput::Audio(upload), &[])
        .await?;
    Ok(Json(SearchResponse::from_recommendation(rec, None)))
}

/// Pulls the named file field out of a multipart body.
async fn extract_upload(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<Option<MediaUpload>, DomainError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DomainError::validation(format!("Malformed multipart body: {e}")))?;

        let mut upload = MediaUpload::new(bytes.to_vec());
        if let Some(content_type) = content_type {
            upload = upload.with_content_type(content_type);
        }
        if let Some(file_name) = file_name {
            upload = upload.with_file_name(file_name);
        }
        return Ok(Some(upload));
    }

    Ok(None)
}
