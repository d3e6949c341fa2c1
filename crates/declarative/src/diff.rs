//! Diff computation between declared and tracked state

use crate::schema::Schema;
use crate::state::InstanceState;
use crate::types::Address;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;

/// What the engine will do with an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeAction {
    NoOp,
    Create,
    Update,
    /// Delete then create, because a `force_new` field changed
    Replace,
    Delete,
}

impl ChangeAction {
    /// Plan symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoOp => " ",
            Self::Create => "+",
            Self::Update => "~",
            Self::Replace => "-/+",
            Self::Delete => "-",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "delete",
        };
        f.write_str(text)
    }
}

/// Change of a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    pub old: Option<Value>,
    /// `None` with `unknown == false` means the attribute is removed
    pub new: Option<Value>,
    /// Value is known only after dependencies are applied
    pub unknown: bool,
    pub forces_replacement: bool,
    pub sensitive: bool,
}

/// Declared attributes after reference resolution, defaults and
/// normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Desired {
    pub attributes: BTreeMap<String, Value>,
    pub unknown: Vec<String>,
}

/// Planned change of one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDiff {
    pub address: Address,
    pub action: ChangeAction,
    pub changes: Vec<AttributeChange>,
}

impl ResourceDiff {
    /// Compare declared against tracked state.
    pub fn compute(
        address: Address,
        schema: &Schema,
        prior: Option<&InstanceState>,
        desired: Option<&Desired>,
    ) -> Self {
        match (prior, desired) {
            (None, None) => Self {
                address,
                action: ChangeAction::NoOp,
                changes: Vec::new(),
            },
            (None, Some(desired)) => Self {
                address,
                action: ChangeAction::Create,
                changes: creation_changes(schema, desired),
            },
            (Some(prior), None) => Self {
                address,
                action: ChangeAction::Delete,
                changes: prior
                    .attributes
                    .iter()
                    .map(|(k, v)| AttributeChange {
                        name: k.clone(),
                        old: Some(v.clone()),
                        new: None,
                        unknown: false,
                        forces_replacement: false,
                        sensitive: schema.field(k).is_some_and(|f| f.sensitive),
                    })
                    .collect(),
            },
            (Some(prior), Some(desired)) => {
                let changes = update_changes(schema, prior, desired);
                let action = if changes.is_empty() {
                    ChangeAction::NoOp
                } else if changes.iter().any(|c| c.forces_replacement) {
                    ChangeAction::Replace
                } else {
                    ChangeAction::Update
                };
                Self {
                    address,
                    action,
                    changes,
                }
            }
        }
    }

    pub fn has_changes(&self) -> bool {
        self.action != ChangeAction::NoOp
    }

    /// Whether the attribute is changing, or may change.
    pub fn changes_attribute(&self, name: &str) -> bool {
        self.changes.iter().any(|c| c.name == name)
    }
}

fn creation_changes(schema: &Schema, desired: &Desired) -> Vec<AttributeChange> {
    schema
        .fields()
        .filter_map(|field| {
            let name = field.name;
            let unknown = desired.unknown.iter().any(|k| k == name);
            let new = desired.attributes.get(name).cloned();
            if new.is_none() && !unknown && !field.computed {
                return None;
            }
            Some(AttributeChange {
                name: name.to_string(),
                old: None,
                unknown: unknown || new.is_none(),
                new,
                forces_replacement: false,
                sensitive: field.sensitive,
            })
        })
        .collect()
}

fn update_changes(schema: &Schema, prior: &InstanceState, desired: &Desired) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    for field in schema.fields().filter(|f| f.is_configurable()) {
        let name = field.name;
        let old = prior.attributes.get(name);
        let unknown = desired.unknown.iter().any(|k| k == name);
        let new = desired.attributes.get(name);

        if !unknown {
            // Unset optional+computed fields keep the server's value.
            if new.is_none() && field.computed {
                continue;
            }
            if same_value(old, new) {
                continue;
            }
        }

        changes.push(AttributeChange {
            name: name.to_string(),
            old: old.cloned(),
            new: new.cloned(),
            unknown,
            forces_replacement: field.force_new,
            sensitive: field.sensitive,
        });
    }
    changes
}

/// Absent and zero values are equal.
fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b || (a.is_empty() && b.is_empty()),
        (Some(v), None) | (None, Some(v)) => v.is_empty(),
        (None, None) => true,
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub additions: usize,
    pub changes: usize,
    pub replacements: usize,
    pub removals: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs<'a>(diffs: impl IntoIterator<Item = &'a ResourceDiff>) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.action {
                ChangeAction::Create => summary.additions += 1,
                ChangeAction::Update => summary.changes += 1,
                ChangeAction::Replace => summary.replacements += 1,
                ChangeAction::Delete => summary.removals += 1,
                ChangeAction::NoOp => {}
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.changes + self.replacements + self.removals
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to replace, {} to destroy",
            self.additions, self.changes, self.replacements, self.removals
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchema;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSchema::string("name").required(),
            FieldSchema::set("policies").optional(),
            FieldSchema::string("backend")
                .optional()
                .default_value("aws")
                .force_new(),
            FieldSchema::string("accessor").computed(),
            FieldSchema::string("description").optional().computed(),
        ])
    }

    fn prior(attrs: &[(&str, Value)]) -> InstanceState {
        InstanceState {
            resource_type: "test".into(),
            name: "a".into(),
            id: "id-1".into(),
            dependencies: vec![],
            attributes: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        }
    }

    fn desired(attrs: &[(&str, Value)], unknown: &[&str]) -> Desired {
        Desired {
            attributes: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
            unknown: unknown.iter().map(ToString::to_string).collect(),
        }
    }

    fn addr() -> Address {
        Address::new("test", "a")
    }

    #[test]
    fn test_create() {
        let d = desired(&[("name", "x".into())], &[]);
        let diff = ResourceDiff::compute(addr(), &schema(), None, Some(&d));
        assert_eq!(diff.action, ChangeAction::Create);
        let accessor = diff.changes.iter().find(|c| c.name == "accessor").unwrap();
        assert!(accessor.unknown);
        assert!(!diff.changes_attribute("policies"));
    }

    #[test]
    fn test_no_op_when_equal() {
        let p = prior(&[
            ("name", "x".into()),
            ("backend", "aws".into()),
            ("policies", Value::List(vec![])),
            ("accessor", "acc".into()),
            ("description", "from server".into()),
        ]);
        let d = desired(&[("name", "x".into()), ("backend", "aws".into())], &[]);
        let diff = ResourceDiff::compute(addr(), &schema(), Some(&p), Some(&d));
        assert_eq!(diff.action, ChangeAction::NoOp);
    }

    #[test]
    fn test_update_and_removal() {
        let p = prior(&[("name", "x".into()), ("policies", vec!["a"].into())]);
        let d = desired(&[("name", "y".into())], &[]);
        let diff = ResourceDiff::compute(addr(), &schema(), Some(&p), Some(&d));
        assert_eq!(diff.action, ChangeAction::Update);
        assert!(diff.changes_attribute("name"));
        let policies = diff.changes.iter().find(|c| c.name == "policies").unwrap();
        assert_eq!(policies.new, None);
        assert!(!policies.unknown);
    }

    #[test]
    fn test_force_new_replaces() {
        let p = prior(&[("name", "x".into()), ("backend", "aws".into())]);
        let d = desired(&[("name", "x".into()), ("backend", "aws2".into())], &[]);
        let diff = ResourceDiff::compute(addr(), &schema(), Some(&p), Some(&d));
        assert_eq!(diff.action, ChangeAction::Replace);
    }

    #[test]
    fn test_unknown_value_is_a_change() {
        let p = prior(&[("name", "x".into())]);
        let d = desired(&[], &["name"]);
        let diff = ResourceDiff::compute(addr(), &schema(), Some(&p), Some(&d));
        assert_eq!(diff.action, ChangeAction::Update);
        assert!(diff.changes[0].unknown);
    }

    #[test]
    fn test_delete_and_summary() {
        let p = prior(&[("name", "x".into())]);
        let delete = ResourceDiff::compute(addr(), &schema(), Some(&p), None);
        assert_eq!(delete.action, ChangeAction::Delete);

        let d = desired(&[("name", "x".into())], &[]);
        let create = ResourceDiff::compute(addr(), &schema(), None, Some(&d));
        let summary = DiffSummary::from_diffs([&delete, &create]);
        assert_eq!(summary.total(), 2);
        assert_eq!(
            summary.to_string(),
            "1 to add, 0 to change, 0 to replace, 1 to destroy"
        );
    }
}
