//! Registry of resource types

use crate::error::{EngineError, Result};
use crate::resource::{BoxedResource, Resource};
use std::collections::BTreeMap;

/// A named set of resource types sharing one `meta` value.
pub struct Provider<M> {
    name: &'static str,
    resources: BTreeMap<&'static str, BoxedResource<M>>,
}

impl<M> Provider<M> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            resources: BTreeMap::new(),
        }
    }

    /// Register a resource type, replacing any previous one with the same name.
    pub fn with_resource(mut self, resource: impl Resource<M> + 'static) -> Self {
        self.register(Box::new(resource));
        self
    }

    pub fn register(&mut self, resource: BoxedResource<M>) {
        self.resources.insert(resource.type_name(), resource);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a resource type.
    pub fn resource(&self, type_name: &str) -> Result<&dyn Resource<M>> {
        self.resources
            .get(type_name)
            .map(|r| r.as_ref())
            .ok_or_else(|| EngineError::UnknownResourceType(type_name.to_string()))
    }

    /// Registered type names, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }
}

impl<M> std::fmt::Debug for Provider<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}
