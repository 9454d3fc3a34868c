pub mod adapter;
pub mod overrides;
pub mod schema;
pub mod search;
pub mod twitter;

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::{CapabilityError, Result};
use crate::interfaces::capabilities::Capability;

/// Collects authored and adapted capabilities before registration.
#[derive(Default)]
pub struct CapabilitySetBuilder {
    capabilities: Vec<Arc<dyn Capability>>,
}

impl CapabilitySetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, capability: Arc<dyn Capability>) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn extend<I>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Capability>>,
    {
        self.capabilities.extend(capabilities);
        self
    }

    /// Fails on the first repeated name.
    pub fn build(self) -> Result<CapabilitySet> {
        let mut seen = HashSet::new();
        for capability in &self.capabilities {
            if !seen.insert(capability.name().to_string()) {
                return Err(CapabilityError::DuplicateCapability(
                    capability.name().to_string(),
                ));
            }
        }
        Ok(CapabilitySet {
            capabilities: self.capabilities.into(),
        })
    }
}

/// Immutable, name-unique set of capabilities registered with the host.
#[derive(Clone)]
pub struct CapabilitySet {
    capabilities: Arc<[Arc<dyn Capability>]>,
}

impl CapabilitySet {
    pub fn builder() -> CapabilitySetBuilder {
        CapabilitySetBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities
            .iter()
            .find(|capability| capability.name() == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.capabilities
            .iter()
            .map(|capability| capability.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Capability>> {
        self.capabilities.iter()
    }

    pub fn describe(&self) -> Vec<Value> {
        self.capabilities
            .iter()
            .map(|capability| {
                json!({
                    "name": capability.name(),
                    "description": capability.description(),
                    "schema": capability.schema(),
                })
            })
            .collect()
    }
}
