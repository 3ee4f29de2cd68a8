//! The filter manager: runs a named filter set over a payload.
//!
//! ```text
//! resolve set ──► decode ──► step 1 ──► step 2 ──► … ──► encode ──► Binary
//!     │              │          │                           │
//!  Configuration  InvalidPayload  UnknownStepType / Transform  Encode
//! ```
//!
//! The set is resolved before anything is decoded, so an unknown name or a
//! bad quality never costs a decode. Every error aborts the run; no partial
//! image is ever returned.

use super::registry::TransformRegistry;
use super::resolver::{FilterConfiguration, ResolvedFilterSet, resolve_filter_set};
use super::transform::{Transform, TransformError};
use crate::binary::Binary;
use crate::config::ConfigError;
use crate::imaging::{Codec, CodecError, EncodeOptions};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Could not find filter loader for \"{step_type}\" filter type in filter set \"{filter_set}\"")]
    UnknownStepType {
        step_type: String,
        filter_set: String,
    },
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[source] CodecError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("Encode failed: {0}")]
    Encode(#[source] CodecError),
}

/// Applies configured filter sets using a codec and a transform registry.
///
/// Register transforms with [`add_loader`](Self::add_loader) during startup.
/// After that the manager is only read, and can be shared across threads
/// when its codec and configuration are `Sync`.
pub struct FilterManager<C: Codec, F> {
    config: F,
    codec: C,
    registry: TransformRegistry<C::Image>,
}

impl<C: Codec, F: FilterConfiguration> FilterManager<C, F> {
    /// Manager with an empty registry.
    pub fn new(config: F, codec: C) -> Self {
        Self::with_registry(config, codec, TransformRegistry::new())
    }

    pub fn with_registry(config: F, codec: C, registry: TransformRegistry<C::Image>) -> Self {
        Self {
            config,
            codec,
            registry,
        }
    }

    /// Bind `step_type` to `transform`, replacing any previous binding.
    pub fn add_loader(
        &mut self,
        step_type: impl Into<String>,
        transform: impl Transform<C::Image> + 'static,
    ) {
        self.registry.register(step_type, transform);
    }

    pub fn registry(&self) -> &TransformRegistry<C::Image> {
        &self.registry
    }

    pub fn config(&self) -> &F {
        &self.config
    }

    /// Resolve a filter set without running it.
    pub fn resolve<'a>(&'a self, filter_set: &'a str) -> Result<ResolvedFilterSet<'a>, FilterError> {
        Ok(resolve_filter_set(&self.config, filter_set)?)
    }

    /// Run `filter_set` over `binary` and return the re-encoded result.
    ///
    /// The result keeps the input's MIME type and format; only the content
    /// changes.
    pub fn apply_filter_set(&self, binary: &Binary, filter_set: &str) -> Result<Binary, FilterError> {
        let resolved = self.resolve(filter_set)?;

        let mut image = self
            .codec
            .decode(binary.content())
            .map_err(FilterError::InvalidPayload)?;

        for (index, step) in resolved.steps.iter().enumerate() {
            let transform =
                self.registry
                    .resolve(&step.step_type)
                    .map_err(|_| FilterError::UnknownStepType {
                        step_type: step.step_type.clone(),
                        filter_set: filter_set.to_string(),
                    })?;
            debug!(filter_set, step = index, step_type = %step.step_type, "applying step");
            image = transform.apply(image, &step.options)?;
        }

        let options = EncodeOptions {
            quality: resolved.quality,
        };
        let content = self
            .codec
            .encode(&image, binary.format(), &options)
            .map_err(FilterError::Encode)?;

        info!(
            filter_set,
            steps = resolved.steps.len(),
            quality = resolved.quality.value(),
            input_bytes = binary.len(),
            output_bytes = content.len(),
            "filter set applied"
        );

        Ok(Binary::new(content, binary.mime_type(), binary.format()))
    }
}

impl<C, F> FilterManager<C, F>
where
    C: Codec,
    F: FilterConfiguration + Sync,
{
    /// Run `filter_set` over independent payloads in parallel.
    ///
    /// Results come back in input order; one failure does not affect the
    /// other payloads.
    pub fn apply_filter_set_batch(
        &self,
        binaries: &[Binary],
        filter_set: &str,
    ) -> Vec<Result<Binary, FilterError>> {
        binaries
            .par_iter()
            .map(|binary| self.apply_filter_set(binary, filter_set))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterSetConfig, FilterStep};
    use crate::filter::StepOptions;
    use crate::imaging::codec::tests::{MockCodec, MockImage, RecordedOp};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Config = HashMap<String, FilterSetConfig>;

    fn thumb_options() -> StepOptions {
        toml::from_str("size = [180, 180]\nmode = \"outbound\"").unwrap()
    }

    fn thumbnail_config(quality: Option<u32>) -> Config {
        HashMap::from([(
            "thumbnail".to_string(),
            FilterSetConfig {
                quality,
                filters: vec![FilterStep::new("thumbnail", thumb_options())],
            },
        )])
    }

    /// Transform that records every call and tags the image with its name.
    #[derive(Clone, Default)]
    struct RecordingLoader {
        calls: Arc<Mutex<Vec<(MockImage, StepOptions)>>>,
    }

    impl RecordingLoader {
        fn calls(&self) -> Vec<(MockImage, StepOptions)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transform<MockImage> for RecordingLoader {
        fn apply(
            &self,
            mut image: MockImage,
            options: &StepOptions,
        ) -> Result<MockImage, TransformError> {
            self.calls
                .lock()
                .unwrap()
                .push((image.clone(), options.clone()));
            image.steps.push("recorded".into());
            Ok(image)
        }
    }

    fn tag(name: &'static str) -> impl Transform<MockImage> {
        move |mut image: MockImage, _: &StepOptions| -> Result<MockImage, TransformError> {
            image.steps.push(name.to_string());
            Ok(image)
        }
    }

    fn encode_op(codec: &MockCodec) -> (MockImage, String, u32) {
        codec
            .get_operations()
            .into_iter()
            .find_map(|op| match op {
                RecordedOp::Encode {
                    image,
                    format,
                    quality,
                } => Some((image, format, quality)),
                _ => None,
            })
            .expect("encode was not called")
    }

    #[test]
    fn unknown_filter_set_fails_before_decoding() {
        let manager = FilterManager::new(Config::new(), MockCodec::returning(b"out"));
        let binary = Binary::new("aContent", "image/png", "png");

        let err = manager.apply_filter_set(&binary, "thumbnail").unwrap_err();
        assert!(matches!(
            err,
            FilterError::Configuration(ConfigError::UnknownFilterSet(ref n)) if n == "thumbnail"
        ));
        assert_eq!(manager.codec.decode_count(), 0);
    }

    #[test]
    fn invalid_quality_fails_before_decoding() {
        let manager = FilterManager::new(thumbnail_config(Some(150)), MockCodec::returning(b""));
        let binary = Binary::new("aContent", "image/png", "png");

        let err = manager.apply_filter_set(&binary, "thumbnail").unwrap_err();
        assert!(matches!(
            err,
            FilterError::Configuration(ConfigError::InvalidQuality { quality: 150, .. })
        ));
        assert_eq!(manager.codec.decode_count(), 0);
    }

    #[test]
    fn missing_loader_names_step_type_and_filter_set() {
        let manager = FilterManager::new(thumbnail_config(None), MockCodec::returning(b""));
        let binary = Binary::new("aContent", "image/png", "png");

        let err = manager.apply_filter_set(&binary, "thumbnail").unwrap_err();
        assert!(matches!(
            &err,
            FilterError::UnknownStepType { step_type, filter_set }
                if step_type == "thumbnail" && filter_set == "thumbnail"
        ));
        assert!(
            err.to_string()
                .contains("Could not find filter loader for \"thumbnail\" filter type")
        );
        // Nothing gets encoded after an aborted run.
        assert!(
            !manager
                .codec
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Encode { .. }))
        );
    }

    #[test]
    fn returns_filtered_content() {
        let loader = RecordingLoader::default();
        let mut manager = FilterManager::new(
            thumbnail_config(None),
            MockCodec::returning(b"theFilteredContent"),
        );
        manager.add_loader("thumbnail", loader.clone());

        let binary = Binary::new("aOriginalContent", "image/png", "png");
        let filtered = manager.apply_filter_set(&binary, "thumbnail").unwrap();

        assert_eq!(filtered.content(), b"theFilteredContent");

        // Decoded once, from the original bytes.
        assert_eq!(manager.codec.decode_count(), 1);
        assert_eq!(
            manager.codec.get_operations()[0],
            RecordedOp::Decode(b"aOriginalContent".to_vec())
        );

        // Loader called once with the decoded image and the exact options.
        let calls = loader.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            MockImage {
                source: b"aOriginalContent".to_vec(),
                steps: vec![],
            }
        );
        assert_eq!(calls[0].1, thumb_options());

        // The loader's output is what gets encoded.
        let (encoded, _, _) = encode_op(&manager.codec);
        assert_eq!(encoded.steps, vec!["recorded".to_string()]);

        // The input is untouched.
        assert_eq!(binary.content(), b"aOriginalContent");
    }

    #[test]
    fn keeps_format_of_original_binary() {
        let mut manager =
            FilterManager::new(thumbnail_config(None), MockCodec::returning(b"aFilteredContent"));
        manager.add_loader("thumbnail", RecordingLoader::default());

        let binary = Binary::new("aOriginalContent", "image/png", "theFormat");
        let filtered = manager.apply_filter_set(&binary, "thumbnail").unwrap();

        assert_eq!(filtered.format(), "theFormat");
        let (_, format, _) = encode_op(&manager.codec);
        assert_eq!(format, "theFormat");
    }

    #[test]
    fn keeps_mime_type_of_original_binary() {
        let mut manager =
            FilterManager::new(thumbnail_config(None), MockCodec::returning(b"aFilteredContent"));
        manager.add_loader("thumbnail", RecordingLoader::default());

        let binary = Binary::new("aOriginalContent", "theMimeType", "png");
        let filtered = manager.apply_filter_set(&binary, "thumbnail").unwrap();

        assert_eq!(filtered.mime_type(), "theMimeType");
    }

    #[test]
    fn encodes_with_configured_quality() {
        let mut manager =
            FilterManager::new(thumbnail_config(Some(80)), MockCodec::returning(b"x"));
        manager.add_loader("thumbnail", RecordingLoader::default());

        manager
            .apply_filter_set(&Binary::new("aOriginalContent", "image/png", "png"), "thumbnail")
            .unwrap();

        let (_, format, quality) = encode_op(&manager.codec);
        assert_eq!(format, "png");
        assert_eq!(quality, 80);
    }

    #[test]
    fn encodes_with_quality_100_when_not_set() {
        let mut manager = FilterManager::new(thumbnail_config(None), MockCodec::returning(b"x"));
        manager.add_loader("thumbnail", RecordingLoader::default());

        manager
            .apply_filter_set(&Binary::new("aOriginalContent", "image/png", "png"), "thumbnail")
            .unwrap();

        let (_, format, quality) = encode_op(&manager.codec);
        assert_eq!(format, "png");
        assert_eq!(quality, 100);
    }

    #[test]
    fn steps_run_in_declared_order() {
        let config = HashMap::from([(
            "chain".to_string(),
            FilterSetConfig {
                quality: None,
                filters: vec![
                    FilterStep::new("b", StepOptions::new()),
                    FilterStep::new("a", StepOptions::new()),
                    FilterStep::new("b", StepOptions::new()),
                ],
            },
        )]);
        let mut manager = FilterManager::new(config, MockCodec::returning(b"x"));
        manager.add_loader("a", tag("a"));
        manager.add_loader("b", tag("b"));

        manager
            .apply_filter_set(&Binary::new("src", "image/png", "png"), "chain")
            .unwrap();

        let (image, _, _) = encode_op(&manager.codec);
        assert_eq!(image.steps, vec!["b", "a", "b"]);
    }

    #[test]
    fn empty_filter_set_roundtrips_without_transforms() {
        let config = HashMap::from([("identity".to_string(), FilterSetConfig::default())]);
        let loader = RecordingLoader::default();
        let mut manager = FilterManager::new(config, MockCodec::returning(b"reencoded"));
        manager.add_loader("thumbnail", loader.clone());

        let filtered = manager
            .apply_filter_set(&Binary::new("src", "image/gif", "gif"), "identity")
            .unwrap();

        assert_eq!(filtered.content(), b"reencoded");
        assert_eq!(filtered.mime_type(), "image/gif");
        assert_eq!(manager.codec.decode_count(), 1);
        assert!(loader.calls().is_empty());

        let (image, format, quality) = encode_op(&manager.codec);
        assert!(image.steps.is_empty());
        assert_eq!(format, "gif");
        assert_eq!(quality, 100);
    }

    #[test]
    fn undecodable_payload_is_invalid_payload() {
        let mut manager = FilterManager::new(thumbnail_config(None), MockCodec::failing_decode());
        manager.add_loader("thumbnail", RecordingLoader::default());

        let err = manager
            .apply_filter_set(&Binary::new("garbage", "image/png", "png"), "thumbnail")
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidPayload(CodecError::Decode(_))));
    }

    #[test]
    fn transform_errors_propagate_unchanged() {
        let config = HashMap::from([(
            "chain".to_string(),
            FilterSetConfig {
                quality: None,
                filters: vec![
                    FilterStep::new("explode", StepOptions::new()),
                    FilterStep::new("after", StepOptions::new()),
                ],
            },
        )]);
        let after = RecordingLoader::default();
        let mut manager = FilterManager::new(config, MockCodec::returning(b"x"));
        manager.add_loader(
            "explode",
            |_: MockImage, _: &StepOptions| -> Result<MockImage, TransformError> {
                Err(TransformError::Geometry("crop outside image".into()))
            },
        );
        manager.add_loader("after", after.clone());

        let err = manager
            .apply_filter_set(&Binary::new("src", "image/png", "png"), "chain")
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::Transform(TransformError::Geometry(ref m)) if m == "crop outside image"
        ));
        assert_eq!(err.to_string(), "Invalid geometry: crop outside image");
        assert!(after.calls().is_empty());
    }

    #[test]
    fn later_registration_wins() {
        let mut manager = FilterManager::new(thumbnail_config(None), MockCodec::returning(b"x"));
        manager.add_loader("thumbnail", tag("first"));
        manager.add_loader("thumbnail", tag("second"));

        manager
            .apply_filter_set(&Binary::new("src", "image/png", "png"), "thumbnail")
            .unwrap();

        let (image, _, _) = encode_op(&manager.codec);
        assert_eq!(image.steps, vec!["second"]);
    }

    #[test]
    fn batch_keeps_input_order_and_isolates_failures() {
        let mut manager = FilterManager::new(thumbnail_config(None), MockCodec::returning(b"x"));
        manager.add_loader("thumbnail", RecordingLoader::default());

        let binaries = vec![
            Binary::new("one", "image/png", "png"),
            Binary::new("two", "image/jpeg", "jpeg"),
        ];
        let results = manager.apply_filter_set_batch(&binaries, "thumbnail");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().mime_type(), "image/png");
        assert_eq!(results[1].as_ref().unwrap().mime_type(), "image/jpeg");
        assert_eq!(manager.codec.decode_count(), 2);

        let missing = manager.apply_filter_set_batch(&binaries, "nope");
        assert!(missing.iter().all(|r| r.is_err()));
    }
}
