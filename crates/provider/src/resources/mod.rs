//! CRUD adapters, one module per resource kind.
//!
//! Every adapter follows the same shape: build the path, encode fields,
//! call the API, decode the response into [`ResourceData`]. Adapters never
//! retry and never call each other.

pub mod auth_backend;
pub mod aws_auth_backend_config_identity;
pub mod github_team;
pub mod identity_entity;
pub mod identity_entity_alias;

pub use auth_backend::AuthBackend;
pub use aws_auth_backend_config_identity::AwsAuthBackendConfigIdentity;
pub use github_team::GithubTeam;
pub use identity_entity::IdentityEntity;
pub use identity_entity_alias::IdentityEntityAlias;

use crate::error::ProviderError;
use declarative::{ResourceData, Value};
use vaultapi::Secret;

/// State normalizer: no leading or trailing slashes.
pub(crate) fn trim_slashes(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim_matches('/').to_string()),
        other => other.clone(),
    }
}

/// Error mapper for an API call.
pub(crate) fn api_error(
    op: &'static str,
    kind: &'static str,
    path: &str,
) -> impl FnOnce(vaultapi::Error) -> ProviderError {
    let path = path.to_string();
    move |source| ProviderError::api(op, kind, &path, source)
}

/// Id string returned in a create response.
pub(crate) fn response_id(
    resp: Option<&Secret>,
    kind: &'static str,
    path: &str,
) -> Result<String, ProviderError> {
    resp.and_then(|s| s.get_str("id"))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::MissingField {
            kind,
            path: path.to_string(),
            field: "id",
        })
}

/// Log and clear the id of an object that is gone.
pub(crate) fn mark_gone(data: &mut ResourceData, kind: &str) {
    log::warn!("{kind} {:?} not found, removing it from state", data.id());
    data.set_id("");
}
