pub mod in_memory;
pub mod qdrant;

pub use in_memory::InMemoryIndex;
pub use qdrant::QdrantIndex;
