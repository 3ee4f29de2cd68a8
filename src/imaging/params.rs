//! Parameter types shared by the codec boundary and the pipeline.
//!
//! - [`Quality`]: lossy encoding quality (0–100, default 100). Out-of-range
//!   values are rejected, not clamped.
//! - [`EncodeOptions`]: everything the codec needs besides the target format.

use serde::{Deserialize, Serialize};

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub const MAX: u32 = 100;

    /// Returns `None` when `value` is above 100.
    pub fn new(value: u32) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<u32> for Quality {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("quality must be 0-100, got {value}"))
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Options handed to [`Codec::encode`](super::Codec::encode).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub quality: Quality,
}
