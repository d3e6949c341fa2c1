//! `vault_auth_backend`: an auth method mount.
//!
//! Every configurable field forces replacement, so update never talks to the
//! server beyond refreshing computed fields.

use super::{api_error, mark_gone, trim_slashes};
use crate::codec::FieldCodec;
use declarative::{FieldSchema, Importer, Resource, ResourceData, Schema};
use vaultapi::Client;

const KIND: &str = "auth backend";
const MOUNTS_PATH: &str = "sys/auth";

/// Path used to enable or disable a mount.
pub fn mount_path(path: &str) -> String {
    format!("{MOUNTS_PATH}/{}", path.trim_matches('/'))
}

pub struct AuthBackend {
    schema: Schema,
    codec: FieldCodec,
}

impl AuthBackend {
    pub fn new() -> Self {
        let schema = Schema::new(vec![
            FieldSchema::string("type")
                .required()
                .force_new()
                .description("Name of the auth backend type."),
            FieldSchema::string("path")
                .optional()
                .computed()
                .force_new()
                .state_func(trim_slashes)
                .description("Path to mount the backend at. Defaults to the type."),
            FieldSchema::string("description")
                .optional()
                .force_new()
                .description("Description of the auth backend."),
            FieldSchema::bool("local")
                .optional()
                .force_new()
                .default_value(false)
                .description("Mark the mount as local, not replicated."),
            FieldSchema::string("accessor")
                .computed()
                .description("Accessor of the mount."),
        ]);
        Self {
            schema,
            codec: FieldCodec::verbatim(&["type", "description", "local"]),
        }
    }
}

impl Default for AuthBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource<Client> for AuthBackend {
    fn type_name(&self) -> &'static str {
        "vault_auth_backend"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let path = data
            .get_str("path")
            .filter(|p| !p.trim_matches('/').is_empty())
            .or_else(|| data.get_str("type"))
            .unwrap_or_default()
            .trim_matches('/')
            .to_string();
        let target = mount_path(&path);

        log::debug!("Enabling {KIND} {path:?}");
        client
            .write(&target, &self.codec.encode(data))
            .map_err(api_error("enabling", KIND, &target))?;
        data.set_id(&path);
        log::debug!("Enabled {KIND} {path:?}");

        self.read(data, client)
    }

    fn read(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let path = data.id().to_string();
        log::debug!("Reading {KIND} {path:?}");
        let mounts = client
            .read(MOUNTS_PATH)
            .map_err(api_error("reading", KIND, MOUNTS_PATH))?;

        let Some(mount) = mounts.and_then(|m| m.data.get(&format!("{path}/")).cloned()) else {
            mark_gone(data, KIND);
            return Ok(());
        };

        data.set("path", path.as_str());
        for key in ["type", "description", "local", "accessor"] {
            match mount.get(key) {
                Some(value) if !value.is_null() => data.set_from_json(key, value),
                _ => {
                    data.remove(key);
                }
            }
        }
        if data.get_str("description") == Some("") {
            data.remove("description");
        }
        Ok(())
    }

    fn update(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        self.read(data, client)
    }

    fn delete(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let target = mount_path(data.id());
        log::debug!("Disabling {KIND} {:?}", data.id());
        client
            .delete(&target)
            .map_err(api_error("disabling", KIND, &target))?;
        Ok(())
    }

    fn exists(&self, data: &ResourceData, client: &Client) -> anyhow::Result<bool> {
        let mounts = client
            .read(MOUNTS_PATH)
            .map_err(api_error("checking for existence of", KIND, MOUNTS_PATH))?;
        Ok(mounts.is_some_and(|m| m.data.contains_key(&format!("{}/", data.id()))))
    }

    fn importer(&self) -> Option<Importer> {
        Some(Importer::Passthrough)
    }
}
