//! Shared application state for all routes: the resources by path segment and the storage they use.

use crate::config::{ResourceDefinition, Settings};
use crate::error::ConfigError;
use crate::service::Resource;
use crate::store::Storage;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ResourceRegistry {
    by_path: HashMap<String, Resource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        ResourceRegistry::default()
    }

    /// One resource per definition, all sharing `settings` and `storage`.
    pub fn build(
        definitions: Vec<ResourceDefinition>,
        settings: Arc<Settings>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, ConfigError> {
        let mut registry = ResourceRegistry::new();
        for def in definitions {
            registry.register(Resource::new(def, settings.clone(), storage.clone()))?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, resource: Resource) -> Result<(), ConfigError> {
        let path = resource.path_segment().to_string();
        if self.by_path.contains_key(&path) {
            return Err(ConfigError::DuplicatePathSegment(path));
        }
        self.by_path.insert(path, resource);
        Ok(())
    }

    /// Replace a registered resource, e.g. to attach hooks after building from config.
    pub fn replace(&mut self, resource: Resource) -> Option<Resource> {
        self.by_path.insert(resource.path_segment().to_string(), resource)
    }

    pub fn get(&self, path_segment: &str) -> Option<&Resource> {
        self.by_path.get(path_segment)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub resources: Arc<ResourceRegistry>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, resources: ResourceRegistry) -> Self {
        AppState {
            storage,
            resources: Arc::new(resources),
        }
    }
}
