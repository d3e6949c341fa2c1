//! Vault resources for the declarative engine.
//!
//! The crate is three thin layers over [`vaultapi::Client`]:
//!
//! - [`path`]: templates such as `auth/{backend}/config/identity`, and the
//!   inverse parse from a stored id back to the backend name
//! - [`codec`]: attribute to payload mapping
//! - [`resources`]: one CRUD adapter per resource kind
//!
//! [`provider()`] registers every adapter with a [`declarative::Provider`].
//!
//! # Example
//!
//! ```
//! use declarative::{ConfigDocument, Engine, PlanMode, State};
//! use vaultapi::{Client, MockBackend};
//!
//! let client = Client::with_backend(MockBackend::new());
//! let provider = provider::provider();
//! let engine = Engine::new(&provider, &client);
//!
//! let config = ConfigDocument::parse(r#"
//! [resource.vault_auth_backend.aws]
//! type = "aws"
//!
//! [resource.vault_aws_auth_backend_config_identity.main]
//! backend = "${vault_auth_backend.aws.path}"
//! iam_alias = "full_arn"
//! "#).unwrap();
//!
//! let mut state = State::new("doc");
//! let plan = engine.plan(&config, &state, PlanMode::Normal).unwrap();
//! assert_eq!(plan.summary().additions, 2);
//!
//! let summary = engine
//!     .apply(&config, &plan, &mut state, &mut declarative::NoProgress)
//!     .unwrap();
//! assert_eq!(summary.created, 2);
//! assert_eq!(
//!     state
//!         .get(&"vault_aws_auth_backend_config_identity.main".parse().unwrap())
//!         .unwrap()
//!         .id,
//!     "auth/aws/config/identity"
//! );
//! ```

#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod path;
pub mod resources;

pub use codec::{FieldCodec, FieldMapping, WireFormat};
pub use error::{ProviderError, Result};
pub use path::{PathCodec, PathError};

use declarative::Provider;
use resources::{
    AuthBackend, AwsAuthBackendConfigIdentity, GithubTeam, IdentityEntity, IdentityEntityAlias,
};
use vaultapi::Client;

/// Name used for the `[provider]` table and in logs.
pub const PROVIDER_NAME: &str = "vault";

/// The provider with every resource kind registered.
pub fn provider() -> Provider<Client> {
    Provider::new(PROVIDER_NAME)
        .with_resource(AuthBackend::new())
        .with_resource(AwsAuthBackendConfigIdentity::new())
        .with_resource(GithubTeam::new())
        .with_resource(IdentityEntity::new())
        .with_resource(IdentityEntityAlias::new())
}
