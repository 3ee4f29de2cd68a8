//! The filter pipeline: named filter sets dispatched to registered transforms.
//!
//! The module is split into:
//! - **Transform**: the [`Transform`] capability and its [`StepOptions`]
//! - **Registry**: [`TransformRegistry`], step-type name → transform
//! - **Resolver**: [`FilterConfiguration`] lookup + quality validation
//! - **Manager**: [`FilterManager`], decode → steps → encode

mod manager;
mod registry;
mod resolver;
mod transform;

pub use manager::{FilterError, FilterManager};
pub use registry::{LookupError, TransformRegistry};
pub use resolver::{FilterConfiguration, ResolvedFilterSet, resolve_filter_set};
pub use transform::{StepOptions, Transform, TransformError, parse_options};
