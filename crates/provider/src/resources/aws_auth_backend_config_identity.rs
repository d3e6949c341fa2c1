//! `vault_aws_auth_backend_config_identity`: identity alias settings of an
//! AWS auth backend.
//!
//! This is a singleton config endpoint: there is nothing to delete remotely,
//! so delete only stops tracking it.

use super::{api_error, mark_gone, trim_slashes};
use crate::codec::{FieldCodec, FieldMapping};
use crate::error::ProviderError;
use crate::path::PathCodec;
use declarative::{FieldSchema, Importer, Resource, ResourceData, Schema};
use serde_json::json;
use std::sync::LazyLock;
use vaultapi::Client;

const KIND: &str = "AWS auth identity config";

pub const IAM_ALIASES: &[&str] = &["role_id", "unique_id", "full_arn"];
pub const EC2_ALIASES: &[&str] = &["role_id", "instance_id", "image_id"];

static PATH: LazyLock<PathCodec> = LazyLock::new(|| {
    PathCodec::new("auth/{backend}/config/identity").expect("identity config template is valid")
});

/// Path of the identity config for a backend.
pub fn path_for(backend: &str) -> String {
    PATH.path_for(backend)
}

/// Backend name of an identity config path.
pub fn backend_from_path(path: &str) -> Result<String, crate::path::PathError> {
    PATH.backend_from_path(path)
}

pub struct AwsAuthBackendConfigIdentity {
    schema: Schema,
    codec: FieldCodec,
}

impl AwsAuthBackendConfigIdentity {
    pub fn new() -> Self {
        let schema = Schema::new(vec![
            FieldSchema::string("iam_alias")
                .optional()
                .default_value("role_id")
                .one_of(IAM_ALIASES)
                .description("How to generate the identity alias when using the iam auth method."),
            FieldSchema::set("iam_metadata")
                .optional()
                .description("The metadata to include on the token returned by the login endpoint."),
            FieldSchema::string("ec2_alias")
                .optional()
                .default_value("role_id")
                .one_of(EC2_ALIASES)
                .description("Configures how to generate the identity alias when using the ec2 auth method."),
            FieldSchema::set("ec2_metadata")
                .optional()
                .description("The metadata to include on the token returned by the login endpoint."),
            FieldSchema::string("backend")
                .optional()
                .default_value("aws")
                .force_new()
                .state_func(trim_slashes)
                .description("Unique name of the auth backend to configure."),
        ]);
        let codec = FieldCodec::new(vec![
            FieldMapping::new("iam_alias"),
            FieldMapping::new("iam_metadata").when_absent(json!([])),
            FieldMapping::new("ec2_alias"),
            FieldMapping::new("ec2_metadata").when_absent(json!([])),
        ]);
        Self { schema, codec }
    }

    fn write(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let backend = data.get_str("backend").unwrap_or("aws").to_string();
        let path = path_for(&backend);
        let payload = self.codec.encode(data);

        log::debug!("Writing {KIND} to {path:?}");
        client
            .write(&path, &payload)
            .map_err(api_error("writing", KIND, &path))?;
        data.set_id(&path);
        log::debug!("Wrote {KIND} to {path:?}");

        self.read(data, client)
    }
}

impl Default for AwsAuthBackendConfigIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource<Client> for AwsAuthBackendConfigIdentity {
    fn type_name(&self) -> &'static str {
        "vault_aws_auth_backend_config_identity"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        self.write(data, client)
    }

    fn update(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        self.write(data, client)
    }

    fn read(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let path = data.id().to_string();
        let backend = backend_from_path(&path).map_err(|source| ProviderError::InvalidPath {
            path: path.clone(),
            kind: KIND,
            source,
        })?;

        log::debug!("Reading {KIND} {path:?}");
        let resp = client
            .read(&path)
            .map_err(api_error("reading", KIND, &path))?;
        log::debug!("Read {KIND} {path:?}");

        let Some(resp) = resp else {
            mark_gone(data, KIND);
            return Ok(());
        };
        self.codec.decode(&resp.data, data);
        data.set("backend", backend);
        Ok(())
    }

    fn delete(&self, data: &mut ResourceData, _client: &Client) -> anyhow::Result<()> {
        log::debug!("Deleting {KIND} {:?} from state", data.id());
        Ok(())
    }

    fn exists(&self, data: &ResourceData, client: &Client) -> anyhow::Result<bool> {
        let path = data.id();
        log::debug!("Checking if {KIND} {path:?} exists");
        let resp = client
            .read(path)
            .map_err(api_error("checking for existence of", KIND, path))?;
        Ok(resp.is_some())
    }

    fn importer(&self) -> Option<Importer> {
        Some(Importer::Passthrough)
    }
}
