//! Tracked state of managed resource instances

use crate::types::Address;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last known state of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceState {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Remote id
    pub id: String,
    /// Addresses this instance depended on when it was last applied
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl InstanceState {
    pub fn address(&self) -> Address {
        Address::new(self.resource_type.clone(), self.name.clone())
    }

    /// Attribute value, with `id` resolving to the remote id.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        if key == "id" {
            return Some(Value::String(self.id.clone()));
        }
        self.attributes.get(key).cloned()
    }
}

/// All tracked instances, keyed by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Incremented on every persisted change
    #[serde(default)]
    pub serial: u64,
    /// Identifies the history this state belongs to
    #[serde(default)]
    pub lineage: String,
    #[serde(default)]
    pub resources: BTreeMap<String, InstanceState>,
}

impl State {
    pub fn new(lineage: impl Into<String>) -> Self {
        Self {
            lineage: lineage.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, address: &Address) -> Option<&InstanceState> {
        self.resources.get(&address.to_string())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.resources.contains_key(&address.to_string())
    }

    pub fn insert(&mut self, instance: InstanceState) {
        self.resources
            .insert(instance.address().to_string(), instance);
    }

    pub fn remove(&mut self, address: &Address) -> Option<InstanceState> {
        self.resources.remove(&address.to_string())
    }

    /// Tracked addresses, sorted.
    pub fn addresses(&self) -> Vec<Address> {
        self.resources.values().map(InstanceState::address).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
