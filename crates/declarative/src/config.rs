//! Configuration documents and references between resources
//!
//! A document is TOML with one table per resource instance:
//!
//! ```toml
//! [resource.vault_identity_entity.a]
//! name = "alice"
//!
//! [resource.vault_identity_entity_alias.a]
//! name = "alice"
//! canonical_id = "${vault_identity_entity.a.id}"
//! ```
//!
//! A string consisting of exactly one `${type.name.attr}` reference takes
//! the referenced value with its type; references embedded in a longer
//! string are interpolated.

use crate::error::{EngineError, Result};
use crate::types::Address;
use crate::value::Value;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z0-9_]+)\.([A-Za-z0-9_-]+)\.([A-Za-z0-9_]+)\}")
        .expect("REFERENCE is a valid regex pattern")
});

/// A `${type.name.attr}` reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reference {
    pub target: Address,
    pub attribute: String,
    /// Text as written, including `${}`
    pub raw: String,
}

/// Every reference inside a value, in order of appearance.
pub fn references(value: &Value) -> Vec<Reference> {
    let mut out = Vec::new();
    collect_references(value, &mut out);
    out
}

fn collect_references(value: &Value, out: &mut Vec<Reference>) {
    match value {
        Value::String(s) => {
            for caps in REFERENCE.captures_iter(s) {
                out.push(Reference {
                    target: Address::new(&caps[1], &caps[2]),
                    attribute: caps[3].to_string(),
                    raw: caps[0].to_string(),
                });
            }
        }
        Value::List(items) => items.iter().for_each(|v| collect_references(v, out)),
        Value::Map(map) => map.values().for_each(|v| collect_references(v, out)),
        Value::Bool(_) | Value::Int(_) => {}
    }
}

/// What a reference, or a value containing references, resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Known(Value),
    /// The target is settled and does not carry the attribute
    Absent,
    /// Only known once the target has been applied
    Unknown,
}

impl Resolved {
    /// `Known` for a present value, `Absent` otherwise.
    pub fn settled(value: Option<Value>) -> Self {
        value.map_or(Self::Absent, Self::Known)
    }

    /// `Known` for a present value, `Unknown` otherwise.
    pub fn pending(value: Option<Value>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }
}

/// Substitute references using `lookup`.
///
/// Any unknown reference makes the whole value unknown. An absent whole
/// reference makes the value absent. Absent list items and map entries are
/// dropped, and absent references inside a longer string become empty text.
pub fn resolve(value: &Value, lookup: &dyn Fn(&Reference) -> Resolved) -> Resolved {
    match value {
        Value::String(s) => resolve_string(s, lookup),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match resolve(item, lookup) {
                    Resolved::Known(v) => out.push(v),
                    Resolved::Absent => {}
                    Resolved::Unknown => return Resolved::Unknown,
                }
            }
            Resolved::Known(Value::List(out))
        }
        Value::Map(map) => {
            let mut out = BTreeMap::new();
            for (key, item) in map {
                match resolve(item, lookup) {
                    Resolved::Known(v) => {
                        out.insert(key.clone(), v);
                    }
                    Resolved::Absent => {}
                    Resolved::Unknown => return Resolved::Unknown,
                }
            }
            Resolved::Known(Value::Map(out))
        }
        Value::Bool(_) | Value::Int(_) => Resolved::Known(value.clone()),
    }
}

fn resolve_string(s: &str, lookup: &dyn Fn(&Reference) -> Resolved) -> Resolved {
    let refs = references(&Value::String(s.to_string()));
    if refs.is_empty() {
        return Resolved::Known(Value::String(s.to_string()));
    }
    if refs.len() == 1 && refs[0].raw == s {
        return lookup(&refs[0]);
    }
    let mut out = s.to_string();
    for reference in &refs {
        let text = match lookup(reference) {
            Resolved::Known(Value::String(v)) => v,
            Resolved::Known(other) => other.to_string(),
            Resolved::Absent => String::new(),
            Resolved::Unknown => return Resolved::Unknown,
        };
        out = out.replacen(&reference.raw, &text, 1);
    }
    Resolved::Known(Value::String(out))
}

/// Declared configuration of one resource instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    pub address: Address,
    /// Raw attributes, references unresolved
    pub attributes: BTreeMap<String, Value>,
}

impl ResourceConfig {
    /// Resources this one references.
    pub fn dependencies(&self) -> BTreeSet<Address> {
        self.attributes
            .values()
            .flat_map(references)
            .map(|r| r.target)
            .collect()
    }

    /// Resolve attributes. Returns known values and the keys whose values
    /// are still unknown; keys that resolve to an absent value are left out
    /// of both.
    pub fn resolve(
        &self,
        lookup: &dyn Fn(&Reference) -> Resolved,
    ) -> (BTreeMap<String, Value>, Vec<String>) {
        let mut known = BTreeMap::new();
        let mut unknown = Vec::new();
        for (key, value) in &self.attributes {
            match resolve(value, lookup) {
                Resolved::Known(v) => {
                    known.insert(key.clone(), v);
                }
                Resolved::Absent => {}
                Resolved::Unknown => unknown.push(key.clone()),
            }
        }
        (known, unknown)
    }
}

/// A parsed configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigDocument {
    /// The `[provider]` table, left for the caller to interpret
    pub provider: toml::Table,
    resources: BTreeMap<Address, ResourceConfig>,
}

impl ConfigDocument {
    /// Parse a TOML document.
    pub fn parse(text: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(text)?;
        let mut doc = Self::default();

        for (key, value) in table {
            match (key.as_str(), value) {
                ("provider", toml::Value::Table(t)) => doc.provider = t,
                ("resource", toml::Value::Table(types)) => {
                    for (resource_type, instances) in types {
                        let toml::Value::Table(instances) = instances else {
                            return Err(EngineError::InvalidConfig(format!(
                                "resource.{resource_type} must be a table of instances"
                            )));
                        };
                        for (name, body) in instances {
                            let address = Address::new(resource_type.clone(), name);
                            let toml::Value::Table(body) = body else {
                                return Err(EngineError::InvalidConfig(format!(
                                    "resource.{address} must be a table"
                                )));
                            };
                            let attributes = body
                                .iter()
                                .map(|(k, v)| (k.clone(), Value::from_toml(v)))
                                .collect();
                            doc.insert(ResourceConfig {
                                address,
                                attributes,
                            });
                        }
                    }
                }
                (other, _) => {
                    return Err(EngineError::InvalidConfig(format!(
                        "unsupported top-level key {other:?}, expected \"provider\" or \"resource\""
                    )));
                }
            }
        }

        doc.check_references()?;
        Ok(doc)
    }

    /// Add or replace a resource declaration.
    pub fn insert(&mut self, resource: ResourceConfig) {
        self.resources.insert(resource.address.clone(), resource);
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceConfig> {
        self.resources.get(address)
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Dependency edges: each address to the addresses it references.
    pub fn dependency_map(&self) -> BTreeMap<Address, BTreeSet<Address>> {
        self.resources
            .iter()
            .map(|(addr, r)| (addr.clone(), r.dependencies()))
            .collect()
    }

    fn check_references(&self) -> Result<()> {
        for resource in self.resources.values() {
            for reference in resource.attributes.values().flat_map(references) {
                if !self.resources.contains_key(&reference.target) {
                    return Err(EngineError::InvalidReference {
                        address: resource.address.to_string(),
                        reference: reference.raw,
                        target: reference.target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
[provider]
address = "http://127.0.0.1:8200"

[resource.vault_identity_entity.a]
name = "alice"
policies = ["test"]
metadata = { version = "1" }

[resource.vault_identity_entity_alias.a]
name = "alice-${vault_identity_entity.a.name}"
canonical_id = "${vault_identity_entity.a.id}"
custom_metadata = "${vault_identity_entity.a.metadata}"
"#;

    fn lookup(reference: &Reference) -> Resolved {
        match reference.attribute.as_str() {
            "name" => Resolved::Known(Value::from("alice")),
            "metadata" => Resolved::Known(Value::Map(BTreeMap::from([(
                "version".to_string(),
                Value::from("1"),
            )]))),
            "policies" => Resolved::Absent,
            _ => Resolved::Unknown,
        }
    }

    #[test]
    fn test_parse_document() {
        let doc = ConfigDocument::parse(DOC).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.provider["address"].as_str(), Some("http://127.0.0.1:8200"));

        let entity = doc
            .get(&Address::new("vault_identity_entity", "a"))
            .unwrap();
        assert_eq!(entity.attributes["policies"], Value::from(vec!["test"]));
        assert!(entity.dependencies().is_empty());
    }

    #[test]
    fn test_dependencies_from_references() {
        let doc = ConfigDocument::parse(DOC).unwrap();
        let deps = doc.dependency_map();
        let alias = Address::new("vault_identity_entity_alias", "a");
        assert_eq!(
            deps[&alias],
            BTreeSet::from([Address::new("vault_identity_entity", "a")])
        );
    }

    #[test]
    fn test_resolve_keeps_type_of_whole_reference() {
        let doc = ConfigDocument::parse(DOC).unwrap();
        let alias = doc
            .get(&Address::new("vault_identity_entity_alias", "a"))
            .unwrap();
        let (known, unknown) = alias.resolve(&lookup);

        assert_eq!(known["name"], Value::from("alice-alice"));
        assert!(known["custom_metadata"].as_map().is_some());
        assert_eq!(unknown, vec!["canonical_id".to_string()]);
    }

    #[test]
    fn test_reference_to_undeclared_resource() {
        let err = ConfigDocument::parse(
            "[resource.vault_identity_entity_alias.a]\ncanonical_id = \"${vault_identity_entity.missing.id}\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidReference { .. }));
    }

    #[test]
    fn test_rejects_unknown_top_level_key() {
        let err = ConfigDocument::parse("[variable.x]\ndefault = 1\n").unwrap_err();
        assert!(err.to_string().contains("unsupported top-level key"));
    }

    #[test]
    fn test_resolve_inside_collections() {
        let value = Value::List(vec![Value::from("${a.b.name}"), Value::from("x")]);
        assert_eq!(
            resolve(&value, &lookup),
            Resolved::Known(Value::from(vec!["alice", "x"]))
        );
        assert_eq!(resolve(&Value::from("${a.b.id}"), &lookup), Resolved::Unknown);
    }

    #[test]
    fn test_absent_reference_drops_the_key() {
        let doc = ConfigDocument::parse(
            r#"
[resource.vault_identity_entity.a]
name = "alice"

[resource.vault_identity_entity.b]
name = "bob-${vault_identity_entity.a.policies}"
policies = "${vault_identity_entity.a.policies}"
metadata = { team = "${vault_identity_entity.a.policies}", owner = "${vault_identity_entity.a.name}" }
"#,
        )
        .unwrap();
        let entity = doc.get(&Address::new("vault_identity_entity", "b")).unwrap();
        let (known, unknown) = entity.resolve(&lookup);

        assert!(unknown.is_empty());
        assert!(!known.contains_key("policies"));
        assert_eq!(known["name"], Value::from("bob-"));
        assert_eq!(
            known["metadata"],
            Value::Map(BTreeMap::from([(
                "owner".to_string(),
                Value::from("alice")
            )]))
        );
    }
}
