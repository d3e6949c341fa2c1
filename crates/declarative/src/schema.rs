//! Typed field schema for resources
//!
//! A [`Schema`] declares which arguments a resource accepts, their types,
//! defaults and constraints. The engine uses it to validate configuration
//! before any remote call and to normalize values before diffing.

use crate::error::SchemaError;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Type of a schema field. Collections hold strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bool,
    Int,
    /// Ordered list of strings
    List,
    /// Unordered set of strings
    Set,
    /// String-keyed map of strings
    Map,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::Int, Value::Int(_)) => true,
            (Self::List | Self::Set, Value::List(items)) => {
                items.iter().all(|v| matches!(v, Value::String(_)))
            }
            (Self::Map, Value::Map(map)) => map.values().all(|v| matches!(v, Value::String(_))),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "number"),
            Self::List => write!(f, "list of strings"),
            Self::Set => write!(f, "set of strings"),
            Self::Map => write!(f, "map of strings"),
        }
    }
}

/// Value normalizer applied before storing or comparing a field.
pub type StateFunc = fn(&Value) -> Value;

/// Declaration of one resource argument or attribute.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: &'static str,
    /// Allowed string values
    pub one_of: Option<&'static [&'static str]>,
    pub state_func: Option<StateFunc>,
}

impl FieldSchema {
    fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            description: "",
            one_of: None,
            state_func: None,
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn int(name: &'static str) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn list(name: &'static str) -> Self {
        Self::new(name, FieldType::List)
    }

    pub fn set(name: &'static str) -> Self {
        Self::new(name, FieldType::Set)
    }

    pub fn map(name: &'static str) -> Self {
        Self::new(name, FieldType::Map)
    }

    /// Must be present in configuration.
    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    /// May be present in configuration.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    /// Value comes from the server. Combined with `optional`, an unset field
    /// keeps whatever the server reports.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Changing the value replaces the resource.
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Hide the value in plan output.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Value used when the field is not configured.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Restrict a string field to an allow-list.
    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.one_of = Some(allowed);
        self
    }

    pub fn state_func(mut self, f: StateFunc) -> Self {
        self.state_func = Some(f);
        self
    }

    /// Whether configuration may set this field.
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }

    /// Normalized form of a value for this field.
    pub fn normalize(&self, value: Value) -> Value {
        let value = match self.state_func {
            Some(f) => f(&value),
            None => value,
        };
        match (self.field_type, value) {
            (FieldType::Set, Value::List(mut items)) => {
                items.sort_by_key(ToString::to_string);
                items.dedup();
                Value::List(items)
            }
            (_, value) => value,
        }
    }

    fn check(&self, resource: &str, value: &Value) -> Result<(), SchemaError> {
        if !self.field_type.accepts(value) {
            return Err(SchemaError::TypeMismatch {
                resource: resource.to_string(),
                field: self.name.to_string(),
                expected: self.field_type,
                found: value.kind(),
            });
        }
        if let (Some(allowed), Some(s)) = (self.one_of, value.as_str())
            && !allowed.contains(&s)
        {
            return Err(SchemaError::NotOneOf {
                resource: resource.to_string(),
                field: self.name.to_string(),
                allowed: allowed.iter().map(ToString::to_string).collect(),
                value: s.to_string(),
            });
        }
        Ok(())
    }
}

/// Ordered collection of field declarations for one resource type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter()
    }

    /// Validate configured attributes.
    ///
    /// Keys listed in `unknown` have values that are not known yet (pending
    /// references); they count as present but are not type-checked.
    pub fn validate(
        &self,
        resource: &str,
        attributes: &BTreeMap<String, Value>,
        unknown: &[String],
    ) -> Result<(), SchemaError> {
        for key in attributes.keys().chain(unknown.iter()) {
            let field = self.field(key).ok_or_else(|| SchemaError::UnknownField {
                resource: resource.to_string(),
                field: key.clone(),
            })?;
            if !field.is_configurable() {
                return Err(SchemaError::ComputedOnly {
                    resource: resource.to_string(),
                    field: key.clone(),
                });
            }
        }

        for field in &self.fields {
            match attributes.get(field.name) {
                Some(value) => field.check(resource, value)?,
                None if field.required && !unknown.iter().any(|k| k == field.name) => {
                    return Err(SchemaError::MissingRequired {
                        resource: resource.to_string(),
                        field: field.name.to_string(),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Fill in defaults for fields that are not set.
    pub fn apply_defaults(&self, attributes: &mut BTreeMap<String, Value>) {
        for field in &self.fields {
            if let Some(default) = &field.default {
                attributes
                    .entry(field.name.to_string())
                    .or_insert_with(|| default.clone());
            }
        }
    }

    /// Normalize every declared field in place.
    pub fn normalize(&self, attributes: &mut BTreeMap<String, Value>) {
        for field in &self.fields {
            if let Some(value) = attributes.remove(field.name) {
                attributes.insert(field.name.to_string(), field.normalize(value));
            }
        }
    }
}
