//! The transform capability bound to a step type.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Free-form options for one step, exactly as configured.
///
/// The pipeline never looks inside; each transform parses its own options
/// (see [`parse_options`]).
pub type StepOptions = toml::Table;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Invalid options for \"{step}\": {message}")]
    InvalidOptions { step: String, message: String },
    #[error("Invalid geometry: {0}")]
    Geometry(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Applies one step's options to an image.
///
/// `I` is the codec's editable image type. Ownership of the image moves
/// through the transform: return the same value mutated, or a new one.
pub trait Transform<I>: Send + Sync {
    fn apply(&self, image: I, options: &StepOptions) -> Result<I, TransformError>;
}

impl<I, F> Transform<I> for F
where
    F: Fn(I, &StepOptions) -> Result<I, TransformError> + Send + Sync,
{
    fn apply(&self, image: I, options: &StepOptions) -> Result<I, TransformError> {
        self(image, options)
    }
}

/// Deserialize a step's options into the transform's own typed struct.
pub fn parse_options<T: DeserializeOwned>(
    step: &str,
    options: &StepOptions,
) -> Result<T, TransformError> {
    toml::Value::Table(options.clone())
        .try_into()
        .map_err(|e: toml::de::Error| TransformError::InvalidOptions {
            step: step.to_string(),
            message: e.message().to_string(),
        })
}
