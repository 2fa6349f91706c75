mod completion;
mod embedding;
mod speech;
mod vector_index;

pub use completion::CompletionBackend;
pub use embedding::EmbeddingGateway;
pub use speech::SpeechToText;
pub use vector_index::VectorIndex;
