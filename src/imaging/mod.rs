//! Image processing in pure Rust, no system libraries.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Encode** | `image` encoders (JPEG/AVIF take quality) |
//! | **Transforms** | `image::DynamicImage` resize/crop/rotate/flip/grayscale |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: [`Quality`] and [`EncodeOptions`]
//! - **Codec**: [`Codec`] trait + [`RustCodec`]
//! - **Transforms**: built-in step types registered by [`register_builtin_transforms`]

pub mod calculations;
pub mod codec;
mod params;
pub mod rust_codec;
pub mod transforms;

pub use codec::{Codec, CodecError};
pub use params::{EncodeOptions, Quality};
pub use rust_codec::RustCodec;
pub use transforms::register_builtin_transforms;
