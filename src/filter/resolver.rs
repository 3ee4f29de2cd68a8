//! Filter set lookup and validation.

use crate::config::{ConfigError, FilterSetConfig, FilterStep};
use crate::imaging::Quality;
use serde::Serialize;

/// Source of filter set definitions, keyed by name.
pub trait FilterConfiguration {
    fn get(&self, name: &str) -> Option<&FilterSetConfig>;
}

/// A filter set checked and ready to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFilterSet<'a> {
    pub name: &'a str,
    pub steps: &'a [FilterStep],
    pub quality: Quality,
}

/// Look up `name` and turn its raw quality into an effective [`Quality`].
///
/// Fails when the set is unknown or its quality is outside 0-100. An empty
/// step list is fine.
pub fn resolve_filter_set<'a, F>(
    config: &'a F,
    name: &'a str,
) -> Result<ResolvedFilterSet<'a>, ConfigError>
where
    F: FilterConfiguration + ?Sized,
{
    let set = config
        .get(name)
        .ok_or_else(|| ConfigError::UnknownFilterSet(name.to_string()))?;

    let quality = match set.quality {
        None => Quality::default(),
        Some(q) => Quality::new(q).ok_or_else(|| ConfigError::InvalidQuality {
            filter_set: name.to_string(),
            quality: q,
        })?,
    };

    Ok(ResolvedFilterSet {
        name,
        steps: &set.filters,
        quality,
    })
}
