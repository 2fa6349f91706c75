use serde::{Deserialize, Serialize};

use crate::domain::entities::embedding::Embedding;

/// One incoming search request, tagged by modality.
///
/// The orchestrator matches on this exhaustively; there is no runtime type
/// sniffing past this point.
#[derive(Debug, Clone)]
pub enum SearchInput {
    Text { message: String },
    Image(MediaUpload),
    Audio(MediaUpload),
}

impl SearchInput {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text {
            message: message.into(),
        }
    }

    pub fn modality(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image(_) => "image",
            Self::Audio(_) => "audio",
        }
    }
}

/// Raw bytes of an uploaded file plus whatever the client declared about it.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl MediaUpload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: None,
            file_name: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// The canonical form every modality reduces to before search: the query
/// text that grounds the prompt and the vector that drives the index lookup.
#[derive(Debug, Clone)]
pub struct NormalizedQuery {
    pub text: String,
    pub vector: Embedding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_tags() {
        assert_eq!(SearchInput::text("q").modality(), "text");
        assert_eq!(
            SearchInput::Image(MediaUpload::new(vec![1])).modality(),
            "image"
        );
        assert_eq!(
            SearchInput::Audio(MediaUpload::new(vec![1])).modality(),
            "audio"
        );
    }

    #[test]
    fn test_turn_role_serializes_lowercase() {
        let turn = ChatTurn::user("hello");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }
}
