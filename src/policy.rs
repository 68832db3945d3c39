//! Which fields a resource accepts on writes, and which it requires on create.

use crate::config::ResourceDefinition;
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct FieldPolicy {
    allowed: HashSet<String>,
    /// Declaration order, so the first missing field reported is stable.
    required: Vec<String>,
}

impl FieldPolicy {
    pub fn new<A, R>(allowed: A, required: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        FieldPolicy {
            allowed: allowed.into_iter().map(Into::into).collect(),
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_definition(def: &ResourceDefinition) -> Self {
        FieldPolicy::new(def.allowed_fields.iter().cloned(), def.required_fields.iter().cloned())
    }

    pub fn is_allowed(&self, field: &str) -> bool {
        self.allowed.contains(field)
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required.iter().any(|f| f == field)
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }
}
