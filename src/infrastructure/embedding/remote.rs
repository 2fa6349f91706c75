use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::info;

use crate::domain::{ports::EmbeddingGateway, DomainError, Embedding, ImageSource};

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct DimensionResponse {
    dimension: usize,
}

#[derive(Debug, Deserialize)]
struct DescriptionResponse {
    description: String,
}

/// HTTP client for the embedding sidecar.
///
/// [`RemoteEmbeddingGateway::connect`] probes the backend and fetches the
/// active model's vector dimension up front, so a dead provider fails the
/// process at startup instead of failing the first request.
pub struct RemoteEmbeddingGateway {
    http: reqwest::Client,
    base_url: String,
    dimension: usize,
}

impl RemoteEmbeddingGateway {
    pub async fn connect(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::backend("embedding", e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();

        let gateway = Self {
            http,
            base_url,
            dimension: 0,
        };
        gateway.health().await?;

        let dimension: DimensionResponse = gateway
            .get_json(&gateway.url("/dimension"))
            .await?;
        info!(dimension = dimension.dimension, "embedding backend ready");

        Ok(Self {
            dimension: dimension.dimension,
            ..gateway
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, DomainError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::backend("embedding", e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DomainError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::backend(
                "embedding",
                format!("backend returned {status}"),
            ));
        }
        response
            .json()
            .await
            .map_err(|e| DomainError::backend("embedding", e.to_string()))
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), DomainError> {
        if vector.len() != self.dimension {
            return Err(DomainError::internal(format!(
                "backend returned a {}-dimensional vector, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        Ok(())
    }

    async fn post_image(
        &self,
        path: &str,
        image: &ImageSource,
    ) -> Result<reqwest::Response, DomainError> {
        let request = match image {
            ImageSource::Bytes { data, mime, name } => {
                let part = multipart::Part::bytes(data.clone())
                    .file_name(name.clone())
                    .mime_str(mime)
                    .map_err(|e| DomainError::backend("embedding", e.to_string()))?;
                let form = multipart::Form::new().part("image", part);
                self.http.post(self.url(path)).multipart(form)
            }
            ImageSource::Url(url) => self
                .http
                .post(self.url(path))
                .json(&serde_json::json!({ "url": url })),
        };

        request
            .send()
            .await
            .map_err(|e| DomainError::backend("embedding", e.to_string()))
    }
}

#[async_trait]
impl EmbeddingGateway for RemoteEmbeddingGateway {
    async fn embed_text(&self, text: &str) -> Result<Embedding, DomainError> {
        let vectors = self.embed_texts(&[text]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    async fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(DomainError::empty_input("Cannot embed blank text"));
        }

        let response = self
            .http
            .post(self.url("/text-embedding"))
            .json(&serde_json::json!({ "texts": texts }))
            .send()
            .await
            .map_err(|e| DomainError::backend("embedding", e.to_string()))?;
        let body: EmbeddingsResponse = Self::decode(response).await?;

        if body.embeddings.len() != texts.len() {
            return Err(DomainError::internal(format!(
                "backend returned {} embeddings for {} texts",
                body.embeddings.len(),
                texts.len()
            )));
        }
        for vector in &body.embeddings {
            self.check_dimension(vector)?;
        }

        Ok(body.embeddings.into_iter().map(Embedding::new).collect())
    }

    async fn embed_image(&self, image: &ImageSource) -> Result<Embedding, DomainError> {
        let response = self.post_image("/image-embedding", image).await?;
        if response.status() == reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE {
            return Err(DomainError::unsupported_media("not an accepted image"));
        }
        let body: EmbeddingsResponse = Self::decode(response).await?;
        let vector = body
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))?;
        self.check_dimension(&vector)?;
        Ok(Embedding::new(vector))
    }

    async fn describe_image(&self, image: &ImageSource) -> Result<String, DomainError> {
        let response = self.post_image("/image-description", image).await?;
        let body: DescriptionResponse = Self::decode(response).await?;
        Ok(body.description)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn health(&self) -> Result<(), DomainError> {
        let response = self
            .http
            .get(self.url("/healthstatus"))
            .send()
            .await
            .map_err(|e| DomainError::backend("embedding", e.to_string()))?;
        if !response.status().is_success() {
            return Err(DomainError::backend(
                "embedding",
                format!("health probe returned {}", response.status()),
            ));
        }
        Ok(())
    }
}
