//! Step-type → transform bindings.
//!
//! Built once during startup and then only read. Registration takes
//! `&mut self`, so a registry shared across threads for concurrent runs
//! cannot be mutated while those runs are active.

use super::transform::Transform;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no transform registered for step type \"{0}\"")]
pub struct LookupError(pub String);

pub struct TransformRegistry<I> {
    transforms: HashMap<String, Box<dyn Transform<I>>>,
}

impl<I> TransformRegistry<I> {
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Bind `step_type` to `transform`. An existing binding is replaced.
    pub fn register(
        &mut self,
        step_type: impl Into<String>,
        transform: impl Transform<I> + 'static,
    ) {
        let step_type = step_type.into();
        if self
            .transforms
            .insert(step_type.clone(), Box::new(transform))
            .is_some()
        {
            debug!(step_type = %step_type, "replaced transform binding");
        }
    }

    pub fn resolve(&self, step_type: &str) -> Result<&dyn Transform<I>, LookupError> {
        self.transforms
            .get(step_type)
            .map(|t| t.as_ref())
            .ok_or_else(|| LookupError(step_type.to_string()))
    }

    pub fn contains(&self, step_type: &str) -> bool {
        self.transforms.contains_key(step_type)
    }

    /// Registered step types, sorted.
    pub fn step_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl<I> Default for TransformRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}
