//! Filter set configuration.
//!
//! Filter sets are named, ordered chains of transform steps plus an optional
//! encoding quality. They are loaded from TOML files; several files can be
//! layered, later files overriding earlier ones.
//!
//! ## Config File Format
//!
//! ```toml
//! [filter_sets.thumbnail]
//! quality = 80                  # 0-100, defaults to 100 when omitted
//!
//! [[filter_sets.thumbnail.filters]]
//! type = "thumbnail"            # step type, resolved against the transform registry
//! size = [180, 180]             # every other key is passed to the transform untouched
//! mode = "outbound"
//!
//! [[filter_sets.thumbnail.filters]]
//! type = "grayscale"
//! ```
//!
//! Steps run in the order they are declared. A filter set with no
//! `filters` is valid: the image is decoded and re-encoded unchanged.
//!
//! ## Layering
//!
//! ```text
//! filters.toml          ← base definitions
//! filters.local.toml    ← overrides (merged key by key per filter set)
//! ```
//!
//! Tables merge recursively; arrays (such as a set's `filters`) are replaced
//! wholesale by the overriding layer. Unknown keys on a filter set are
//! rejected to catch typos early.

use crate::filter::{FilterConfiguration, StepOptions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Could not find configuration for filter set \"{0}\"")]
    UnknownFilterSet(String),
    #[error("Filter set \"{filter_set}\" has quality {quality}, expected 0-100")]
    InvalidQuality { filter_set: String, quality: u32 },
}

/// All filter sets known to the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiltersConfig {
    pub filter_sets: BTreeMap<String, FilterSetConfig>,
}

/// One named filter set as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSetConfig {
    /// Encoding quality for the final image. `None` means 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    /// Steps in execution order.
    #[serde(default)]
    pub filters: Vec<FilterStep>,
}

/// A single step: its type name plus whatever options the transform takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStep {
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(flatten)]
    pub options: StepOptions,
}

impl FilterStep {
    pub fn new(step_type: impl Into<String>, options: StepOptions) -> Self {
        Self {
            step_type: step_type.into(),
            options,
        }
    }
}

impl FiltersConfig {
    /// Validate every filter set: quality range and non-empty step types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, set) in &self.filter_sets {
            set.validate(name)?;
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filter_sets.keys().map(String::as_str)
    }
}

impl FilterSetConfig {
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        match self.quality {
            Some(q) if q > 100 => {
                return Err(ConfigError::InvalidQuality {
                    filter_set: name.to_string(),
                    quality: q,
                });
            }
            _ => {}
        }
        if let Some(pos) = self.filters.iter().position(|f| f.step_type.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "filter set \"{name}\": step {} has an empty type",
                pos + 1
            )));
        }
        Ok(())
    }
}

impl FilterConfiguration for FiltersConfig {
    fn get(&self, name: &str) -> Option<&FilterSetConfig> {
        self.filter_sets.get(name)
    }
}

impl FilterConfiguration for HashMap<String, FilterSetConfig> {
    fn get(&self, name: &str) -> Option<&FilterSetConfig> {
        HashMap::get(self, name)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Deserialize a merged TOML value and validate it.
pub fn resolve_config(value: toml::Value) -> Result<FiltersConfig, ConfigError> {
    let config: FiltersConfig = value.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a single config file.
pub fn load_config(path: &Path) -> Result<FiltersConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Load and merge config files in order; later files win.
pub fn load_config_layers<P: AsRef<Path>>(paths: &[P]) -> Result<FiltersConfig, ConfigError> {
    if paths.is_empty() {
        return Err(ConfigError::Validation(
            "at least one config file is required".into(),
        ));
    }
    let mut merged = toml::Value::Table(toml::Table::new());
    for path in paths {
        merged = merge_toml(merged, load_raw_config(path.as_ref())?);
    }
    resolve_config(merged)
}

/// Returns a fully-commented sample config with a few common filter sets.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# filterchain configuration
# ========================
#
# Each [filter_sets.<name>] table defines a named chain of steps.
# Steps run top to bottom; each one receives the previous step's output.
#
# quality  - encoding quality of the final image (0-100, default 100).
#            Honored by JPEG and AVIF output (0 is encoded as 1); other
#            formats ignore it.
# filters  - ordered list of steps. `type` picks the transform, every other
#            key is that transform's option.
#
# Built-in step types:
#   thumbnail        size = [w, h], mode = "inset" | "outbound", allow_upscale = false
#   resize           size = [w, h]
#   relative_resize  one of: heighten = h, widen = w, increase = px, scale = factor
#   crop             start = [x, y], size = [w, h]
#   rotate           angle = 90 | 180 | 270
#   flip             axis = "x" | "y"
#   grayscale        (no options)
#   upscale          min = [w, h]
#   downscale        max = [w, h]

[filter_sets.thumbnail]
quality = 80

[[filter_sets.thumbnail.filters]]
type = "thumbnail"
size = [180, 180]
mode = "outbound"

[filter_sets.preview]
quality = 90

[[filter_sets.preview.filters]]
type = "downscale"
max = [1280, 1280]

[filter_sets.avatar]

[[filter_sets.avatar.filters]]
type = "thumbnail"
size = [64, 64]
mode = "outbound"

[[filter_sets.avatar.filters]]
type = "grayscale"
"##
}
