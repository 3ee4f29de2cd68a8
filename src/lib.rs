//! # filterchain
//!
//! Named image filter sets. A filter set is a chain of transform steps
//! (thumbnail, crop, rotate, ...) plus an encoding quality, defined in
//! configuration and applied to raw image payloads.
//!
//! # Architecture: One Pass Per Payload
//!
//! ```text
//! Binary + "thumbnail"
//!   1. Resolve   filters.toml  →  ordered steps + quality
//!   2. Decode    bytes         →  editable image      (Codec)
//!   3. Apply     image         →  image, per step     (TransformRegistry)
//!   4. Encode    image         →  bytes, input format (Codec)
//! ```
//!
//! The result is a new [`Binary`](binary::Binary) that keeps the input's MIME
//! type and format. Every error aborts the run; nothing is cached and nothing
//! is written anywhere.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Walk input files and apply a filter set to each, in parallel |
//! | [`binary`] | Immutable image payload (bytes + MIME type + format) |
//! | [`config`] | TOML filter set definitions, layering, validation |
//! | [`filter`] | Transform registry, filter set resolution, the filter manager |
//! | [`imaging`] | `image`-crate codec and the built-in transforms |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Step Types Are Data
//!
//! Which transforms run, and in which order, comes from configuration. The
//! code only knows a map from step type name to a [`Transform`](filter::Transform).
//! New step types are added by registering them; the manager never changes.
//!
//! ## No Global Registry
//!
//! The registry is owned by a [`FilterManager`](filter::FilterManager) built
//! at startup. Registering needs `&mut`, so once the manager is shared across
//! threads for concurrent runs it is read-only.
//!
//! ## Options Stay Untyped Until the Transform
//!
//! Step options are passed through as a TOML table. Each transform
//! deserializes its own options struct, so adding a step type never touches
//! the config schema.
//!
//! ## Quality Is Validated, Not Clamped
//!
//! A filter set quality above 100 is a configuration error, reported before
//! any image is decoded. A missing quality means 100.

pub mod batch;
pub mod binary;
pub mod config;
pub mod filter;
pub mod imaging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
