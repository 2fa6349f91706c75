pub mod config;
pub mod embedding;
pub mod llm;
pub mod records;
pub mod speech;
pub mod vector_index;

pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::RemoteEmbeddingGateway;
pub use llm::{completion_from_config, AnthropicCompletion, OpenAiCompletion};
pub use records::{parse_product_json, parse_products_json, parse_products_xml};
pub use speech::RemoteSpeechToText;
pub use vector_index::{InMemoryIndex, QdrantIndex};
