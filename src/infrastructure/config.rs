use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::application::services::{MediaLimits, RecommendPrompts, SearchPolicy};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub qdrant: QdrantConfig,
    pub llm: LlmConfig,
    pub speech: SpeechConfig,
    pub search: SearchConfig,
    pub limits: LimitsConfig,
    pub ingest: IngestConfig,
    /// Requests without a matching `X-API-Key` header or `api_key` cookie are
    /// rejected. Empty means the check is disabled (dev mode).
    pub api_key: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding sidecar.
    pub url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Base URL of the speech-to-text backend.
    pub url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
    /// Hard cosine-distance cutoff; candidates beyond it are discarded.
    pub max_distance: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_query_chars: usize,
    pub max_image_bytes: usize,
    pub max_audio_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// "describe" anchors image chunks into the text-embedding space;
    /// "direct" uses the backend's image model.
    pub image_mode: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub system: String,
    pub no_results: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
            qdrant: QdrantConfig::default(),
            llm: LlmConfig::default(),
            speech: SpeechConfig::default(),
            search: SearchConfig::default(),
            limits: LimitsConfig::default(),
            ingest: IngestConfig::default(),
            api_key: String::new(),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "products".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9000".to_string(),
            model: "whisper-1".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_distance: 0.5,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let defaults = MediaLimits::default();
        Self {
            max_query_chars: defaults.max_query_chars,
            max_image_bytes: defaults.max_image_bytes,
            max_audio_bytes: defaults.max_audio_bytes,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            image_mode: "describe".to_string(),
        }
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        let defaults = RecommendPrompts::default();
        Self {
            system: defaults.system,
            no_results: defaults.no_results,
        }
    }
}

impl AppConfig {
    /// Loads the YAML config file named by `SHOPSENSE_CONFIG` (default
    /// `config.yaml`, missing file means defaults), then applies environment
    /// overrides for deploy-time values.
    pub fn load() -> anyhow::Result<Self> {
        let path =
            std::env::var("SHOPSENSE_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
        let mut app = Self::from_file(&path)?;
        app.apply_env();
        Ok(app)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let app = serde_yaml::from_str(&raw)?;
        Ok(app)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("QDRANT_URL") {
            self.config.qdrant.url = url;
        }
        if let Ok(url) = std::env::var("EMBEDDING_GATEWAY_URL") {
            self.config.embedding.url = url;
        }
        if let Ok(url) = std::env::var("SPEECH_BACKEND_URL") {
            self.config.speech.url = url;
        }
        if let Ok(key) = std::env::var("SHOPSENSE_API_KEY") {
            self.config.api_key = key;
        }
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.config.server.host = host;
        }
        if let Ok(port) = std::env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.config.server.port = port;
            }
        }
    }

    pub fn search_policy(&self) -> SearchPolicy {
        SearchPolicy {
            top_k: self.config.search.top_k,
            max_distance: self.config.search.max_distance,
            completion_timeout: Duration::from_secs(self.config.llm.timeout_seconds),
        }
    }

    pub fn media_limits(&self) -> MediaLimits {
        MediaLimits {
            max_query_chars: self.config.limits.max_query_chars,
            max_image_bytes: self.config.limits.max_image_bytes,
            max_audio_bytes: self.config.limits.max_audio_bytes,
        }
    }

    pub fn prompts(&self) -> RecommendPrompts {
        RecommendPrompts {
            system: self.prompts.system.clone(),
            no_results: self.prompts.no_results.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_policy() {
        let app = AppConfig::default();
        assert_eq!(app.config.search.top_k, 3);
        assert!((app.config.search.max_distance - 0.5).abs() < f32::EPSILON);
        assert_eq!(app.config.limits.max_query_chars, 500);
        assert!(app.config.api_key.is_empty());
    }

    #[test]
    fn test_partial_yaml_overlays_defaults() {
        let yaml = r#"
config:
  search:
    top_k: 5
  api_key: "sekrit"
prompts:
  no_results: "nothing here"
"#;
        let app: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(app.config.search.top_k, 5);
        assert!((app.config.search.max_distance - 0.5).abs() < f32::EPSILON);
        assert_eq!(app.config.api_key, "sekrit");
        assert_eq!(app.prompts.no_results, "nothing here");
        assert!(!app.prompts.system.is_empty());
    }
}
