use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub service: String,
    pub version: String,
}

/// Root banner; the only route outside the API-key check.
pub async fn index() -> Json<BannerResponse> {
    Json(BannerResponse {
        service: "shopsense".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
