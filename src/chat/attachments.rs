use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::Path;

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("unsupported image type for {path}; expected one of: jpg, jpeg, png, gif")]
    UnsupportedType { path: String },
    #[error("failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("image {path} is empty")]
    Empty { path: String },
}

/// An image waiting to be sent with the next user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub file_name: String,
    pub base64: String,
    pub byte_len: usize,
}

impl StagedImage {
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.into(),
            base64: STANDARD.encode(bytes),
            byte_len: bytes.len(),
        }
    }
}

pub fn stage_image(path: &Path) -> Result<StagedImage, AttachmentError> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false);
    if !supported {
        return Err(AttachmentError::UnsupportedType {
            path: path.display().to_string(),
        });
    }

    let bytes = fs::read(path).map_err(|source| AttachmentError::Read {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(AttachmentError::Empty {
            path: path.display().to_string(),
        });
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(StagedImage::from_bytes(file_name, &bytes))
}

pub fn decode_image(base64: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(base64)
}
