//! Error types for resource adapters.

use crate::path::PathError;
use thiserror::Error;

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Failures raised by the CRUD adapters.
///
/// A missing remote object is not an error: reads clear the id instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API call failed (transport or server error).
    #[error("error {op} {kind} {path:?}")]
    Api {
        op: &'static str,
        kind: &'static str,
        path: String,
        #[source]
        source: vaultapi::Error,
    },

    /// Create would collide with an object the provider does not track.
    #[error("{kind} {name:?} already exists{detail} (id={id}), it may be imported")]
    AlreadyExists {
        kind: &'static str,
        name: String,
        /// Extra scope, e.g. ` for mount accessor "auth_github_1234"`
        detail: String,
        id: String,
    },

    /// A stored id does not have the expected shape.
    #[error("invalid path {path:?} for {kind}")]
    InvalidPath {
        path: String,
        kind: &'static str,
        #[source]
        source: PathError,
    },

    /// An import id does not have the expected shape.
    #[error("invalid import id {id:?} for {kind}, expected {expected}")]
    InvalidImportId {
        id: String,
        kind: &'static str,
        expected: &'static str,
    },

    /// The server answered without a field the adapter needs.
    #[error("{kind} response from {path:?} has no {field:?}")]
    MissingField {
        kind: &'static str,
        path: String,
        field: &'static str,
    },
}

impl ProviderError {
    /// Wrap an API error with the operation and path.
    pub fn api(op: &'static str, kind: &'static str, path: &str, source: vaultapi::Error) -> Self {
        Self::Api {
            op,
            kind,
            path: path.to_string(),
            source,
        }
    }

    /// Status of the underlying API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_message() {
        let err = ProviderError::AlreadyExists {
            kind: "IdentityEntityAlias",
            name: "alice".into(),
            detail: " for mount accessor \"auth_github_1\"".into(),
            id: "abc".into(),
        };
        assert_eq!(
            err.to_string(),
            "IdentityEntityAlias \"alice\" already exists for mount accessor \"auth_github_1\" (id=abc), it may be imported"
        );
    }

    #[test]
    fn test_api_error_chain() {
        let err = ProviderError::api(
            "writing",
            "AWS auth identity config",
            "auth/aws/config/identity",
            vaultapi::Error::api(400, ["invalid iam_alias"]),
        );
        assert_eq!(err.status(), Some(400));
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert!(chain.starts_with("error writing AWS auth identity config \"auth/aws/config/identity\": "));
        assert!(chain.contains("invalid iam_alias"));
    }

    #[test]
    fn test_invalid_path_chain() {
        let err = ProviderError::InvalidPath {
            path: "auth/aws".into(),
            kind: "AWS auth identity config",
            source: PathError::NoMatch,
        };
        assert_eq!(
            format!("{:#}", anyhow::Error::from(err)),
            "invalid path \"auth/aws\" for AWS auth identity config: no backend found"
        );
    }
}
