//! Codec trait: the seam between the pipeline and the image library.
//!
//! A [`Codec`] turns raw payload bytes into an editable image and back. The
//! pipeline never touches pixels itself; it only hands the image from one
//! transform to the next.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec), backed by the `image` crate.

use super::params::EncodeOptions;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Decode/encode capability consumed by the filter manager.
pub trait Codec: Sync {
    /// In-memory editable image handed from step to step.
    type Image: Send;

    /// Decode raw payload bytes.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Image, CodecError>;

    /// Encode `image` as `format` (e.g. `"png"`, `"jpeg"`).
    fn encode(
        &self,
        image: &Self::Image,
        format: &str,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, CodecError>;
}
