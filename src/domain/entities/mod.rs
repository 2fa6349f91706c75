mod embedding;
mod matches;
mod media;
mod product;
mod query;

pub use embedding::Embedding;
pub use matches::{ProductMatch, Recommendation};
pub use media::{detect_audio_mime, detect_image_format, ImageFormat, ImageSource};
pub use product::{extract_chunks, is_valid_image_url, ChunkKind, Product, ProductChunk};
pub use query::{ChatTurn, MediaUpload, NormalizedQuery, SearchInput, TurnRole};
