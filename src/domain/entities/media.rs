use crate::domain::entities::query::MediaUpload;

/// Image formats the embedding backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Sniffs the leading magic bytes. More trustworthy than anything the
    /// client declared, so it wins over the content-type header.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }
}

/// Resolves an upload to an allow-listed image format, or `None` when it is
/// not an acceptable image. Magic bytes are checked first, then the declared
/// content type, then the file extension.
pub fn detect_image_format(upload: &MediaUpload) -> Option<ImageFormat> {
    if let Some(format) = ImageFormat::sniff(&upload.bytes) {
        return Some(format);
    }
    if let Some(declared) = upload.content_type.as_deref() {
        if let Some(format) = ImageFormat::from_mime(declared) {
            return Some(format);
        }
        // A declared non-image type is a hard no even if the extension looks right.
        return None;
    }
    let name = upload.file_name.as_deref()?;
    let guessed = mime_guess::from_path(name).first()?;
    ImageFormat::from_mime(guessed.essence_str())
}

const AUDIO_MIMES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/ogg",
    "audio/webm",
    "audio/mp4",
    "audio/x-m4a",
    "audio/flac",
    "audio/x-flac",
];

/// Resolves an upload to an accepted audio MIME type, or `None`. Audio
/// containers are too varied to sniff reliably, so the declared type and the
/// file extension carry the decision.
pub fn detect_audio_mime(upload: &MediaUpload) -> Option<&'static str> {
    if let Some(declared) = upload.content_type.as_deref() {
        let declared = declared.trim().to_ascii_lowercase();
        if let Some(mime) = AUDIO_MIMES.iter().find(|m| **m == declared) {
            return Some(mime);
        }
        if declared == "video/webm" {
            // Browsers record microphone audio into webm containers tagged as video.
            return Some("audio/webm");
        }
        return None;
    }
    let name = upload.file_name.as_deref()?;
    let guessed = mime_guess::from_path(name).first()?;
    let essence = guessed.essence_str().to_ascii_lowercase();
    AUDIO_MIMES.iter().find(|m| **m == essence).copied()
}

/// Image content addressed either by uploaded bytes or by URL reference.
/// Ingestion embeds catalog images by URL; search uploads arrive as bytes.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Bytes {
        data: Vec<u8>,
        mime: String,
        name: String,
    },
    Url(String),
}

impl ImageSource {
    pub fn from_upload(upload: &MediaUpload, format: ImageFormat) -> Self {
        Self::Bytes {
            data: upload.bytes.clone(),
            mime: format.mime().to_string(),
            name: upload
                .file_name
                .clone()
                .unwrap_or_else(|| "upload".to_string()),
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }
}
