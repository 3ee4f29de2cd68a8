//! Image payloads passed into and out of the pipeline.

use image::ImageFormat;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinaryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot determine image format of {0}")]
    UnknownFormat(String),
}

/// Raw image bytes with their MIME type and format name.
///
/// Immutable: every pipeline run builds a new `Binary` and leaves its input
/// alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    content: Vec<u8>,
    mime_type: String,
    format: String,
}

impl Binary {
    pub fn new(
        content: impl Into<Vec<u8>>,
        mime_type: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            mime_type: mime_type.into(),
            format: format.into(),
        }
    }

    /// Read an image file, taking format and MIME type from its extension.
    pub fn from_path(path: &Path) -> Result<Self, BinaryError> {
        let (mime_type, format) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| {
                ImageFormat::from_extension(ext)
                    .map(|f| (f.to_mime_type(), ext.to_ascii_lowercase()))
            })
            .ok_or_else(|| BinaryError::UnknownFormat(path.display().to_string()))?;
        let content = fs::read(path)?;
        Ok(Self::new(content, mime_type, format))
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Format name used as the encode target, e.g. `"png"`.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
