//! Presence-aware attribute bag handed to resource callbacks

use crate::value::Value;
use std::collections::BTreeMap;

/// Attributes and id of one resource instance.
///
/// An attribute is *present* when it was set by configuration, a schema
/// default, or a previous read. An empty id means the instance does not
/// exist remotely; a read that clears it drops the instance from state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: String,
    attributes: BTreeMap<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn from_parts(id: impl Into<String>, attributes: BTreeMap<String, Value>) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Whether the instance has a remote identity.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Value of a present attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Value of an attribute that is present and not the zero value.
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_empty())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Strings of a list or set attribute; empty when absent.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(Value::string_list).unwrap_or_default()
    }

    /// Entries of a map attribute; empty when absent.
    pub fn get_string_map(&self, key: &str) -> BTreeMap<String, String> {
        self.get(key).map(Value::string_map).unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Remove an attribute, making it absent.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Set an attribute from a wire value; `null` makes it absent.
    pub fn set_from_json(&mut self, key: &str, value: &serde_json::Value) {
        match Value::from_json(value) {
            Some(v) => self.set(key, v),
            None => {
                self.attributes.remove(key);
            }
        }
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn into_parts(self) -> (String, BTreeMap<String, Value>) {
        (self.id, self.attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presence() {
        let mut data = ResourceData::new();
        assert!(!data.has_id());
        data.set("name", "a");
        data.set("policies", Value::List(vec![]));

        assert!(data.get("policies").is_some());
        assert!(data.get_ok("policies").is_none());
        assert_eq!(data.get_ok("name"), Some(&Value::from("a")));
        assert!(data.get("missing").is_none());
    }

    #[test]
    fn test_set_from_json() {
        let mut data = ResourceData::with_id("x");
        data.set_from_json("metadata", &json!({"version": "1"}));
        assert_eq!(data.get_string_map("metadata")["version"], "1");

        data.set_from_json("metadata", &json!(null));
        assert!(data.get("metadata").is_none());
    }

    #[test]
    fn test_clearing_id() {
        let mut data = ResourceData::with_id("auth/aws/config/identity");
        assert!(data.has_id());
        data.set_id("");
        assert!(!data.has_id());
    }
}
