//! Error types for schema validation and the engine

use crate::schema::FieldType;
use thiserror::Error;

/// A configuration value that does not fit a resource schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{resource}: unsupported argument {field:?}")]
    UnknownField { resource: String, field: String },

    #[error("{resource}: missing required argument {field:?}")]
    MissingRequired { resource: String, field: String },

    #[error("{resource}: argument {field:?} must be a {expected}, got {found}")]
    TypeMismatch {
        resource: String,
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    #[error("{resource}: expected {field} to be one of {allowed:?}, got {value:?}")]
    NotOneOf {
        resource: String,
        field: String,
        allowed: Vec<String>,
        value: String,
    },

    #[error("{resource}: argument {field:?} is computed and cannot be set")]
    ComputedOnly { resource: String, field: String },
}

/// Errors raised while loading, planning or applying a configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid resource address {0:?}, expected <type>.<name>")]
    InvalidAddress(String),

    #[error("unknown resource type {0:?}")]
    UnknownResourceType(String),

    #[error("{address}: reference {reference:?} points to undeclared resource {target}")]
    InvalidReference {
        address: String,
        reference: String,
        target: String,
    },

    #[error("dependency cycle between {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("{0} is not in state")]
    NotInState(String),

    #[error("{0} is already managed; remove it from state before importing")]
    AlreadyManaged(String),

    #[error("resource type {0:?} does not support import")]
    ImportNotSupported(String),

    #[error("cannot import non-existent remote object {id:?} as {address}")]
    ImportNotFound { address: String, id: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{address}: {source:#}")]
    Resource {
        address: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_members() {
        let err = EngineError::Cycle(vec!["a.x".into(), "b.y".into()]);
        assert_eq!(err.to_string(), "dependency cycle between a.x, b.y");
    }

    #[test]
    fn test_resource_error_includes_cause_chain() {
        let source = anyhow::anyhow!("server said no").context("writing entity");
        let err = EngineError::Resource {
            address: "vault_identity_entity.a".into(),
            source,
        };
        assert_eq!(
            err.to_string(),
            "vault_identity_entity.a: writing entity: server said no"
        );
    }

    #[test]
    fn test_not_one_of_message() {
        let err = SchemaError::NotOneOf {
            resource: "r.a".into(),
            field: "iam_alias".into(),
            allowed: vec!["role_id".into()],
            value: "bogus".into(),
        };
        assert!(err.to_string().contains("expected iam_alias to be one of"));
    }
}
