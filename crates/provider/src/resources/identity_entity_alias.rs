//! `vault_identity_entity_alias`: links an entity to a name on one auth
//! mount.
//!
//! The server rejects a second alias with the same name on the same mount
//! accessor. Create checks for that up front so the error can point at the
//! existing alias id for import. Creates on one mount are serialized so the
//! check and the write do not interleave within a process; a concurrent
//! writer elsewhere still gets the server's own rejection.

use super::{api_error, mark_gone, response_id};
use crate::codec::{FieldCodec, FieldMapping};
use crate::error::ProviderError;
use declarative::{FieldSchema, Importer, Resource, ResourceData, Schema};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use vaultapi::Client;

const KIND: &str = "IdentityEntityAlias";
const ALIAS_PATH: &str = "identity/entity-alias";

pub fn id_path(id: &str) -> String {
    format!("{ALIAS_PATH}/id/{id}")
}

fn list_path() -> String {
    format!("{ALIAS_PATH}/id")
}

pub struct IdentityEntityAlias {
    schema: Schema,
    codec: FieldCodec,
    /// Create locks by mount accessor
    creating: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IdentityEntityAlias {
    pub fn new() -> Self {
        let schema = Schema::new(vec![
            FieldSchema::string("name")
                .required()
                .description("Name of the entity alias."),
            FieldSchema::string("mount_accessor")
                .required()
                .description("Mount accessor to which this alias belongs."),
            FieldSchema::string("canonical_id")
                .required()
                .description("ID of the entity to which this is an alias."),
            FieldSchema::map("custom_metadata")
                .optional()
                .description("Custom metadata to be associated with this alias."),
        ]);
        let codec = FieldCodec::new(vec![
            FieldMapping::new("name"),
            FieldMapping::new("mount_accessor"),
            FieldMapping::new("canonical_id"),
            FieldMapping::new("custom_metadata").when_absent(json!({})),
        ]);
        Self {
            schema,
            codec,
            creating: Mutex::default(),
        }
    }

    fn mount_lock(&self, mount_accessor: &str) -> Arc<Mutex<()>> {
        let mut locks = self.creating.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(mount_accessor.to_string()).or_default())
    }

    /// Id of an existing alias with this name on this mount, other than
    /// `own_id`.
    fn find_existing(
        name: &str,
        mount_accessor: &str,
        own_id: &str,
        client: &Client,
    ) -> anyhow::Result<Option<String>> {
        let path = list_path();
        let Some(listing) = client
            .list(&path)
            .map_err(api_error("listing", KIND, &path))?
        else {
            return Ok(None);
        };
        let Some(key_info) = listing.get("key_info").and_then(|v| v.as_object()) else {
            return Ok(None);
        };

        Ok(key_info
            .iter()
            .filter(|(id, _)| id.as_str() != own_id)
            .find(|(_, info)| {
                info.get("name").and_then(|v| v.as_str()) == Some(name)
                    && info.get("mount_accessor").and_then(|v| v.as_str()) == Some(mount_accessor)
            })
            .map(|(id, _)| id.clone()))
    }
}

impl Default for IdentityEntityAlias {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource<Client> for IdentityEntityAlias {
    fn type_name(&self) -> &'static str {
        "vault_identity_entity_alias"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let name = data.get_str("name").unwrap_or_default().to_string();
        let mount_accessor = data.get_str("mount_accessor").unwrap_or_default().to_string();

        let lock = self.mount_lock(&mount_accessor);
        let _creating = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = Self::find_existing(&name, &mount_accessor, "", client)? {
            return Err(ProviderError::AlreadyExists {
                kind: KIND,
                name,
                detail: format!(" for mount accessor {mount_accessor:?}"),
                id,
            }
            .into());
        }

        log::debug!("Creating {KIND} {name:?} on {mount_accessor:?}");
        let resp = client
            .write(ALIAS_PATH, &self.codec.encode(data))
            .map_err(api_error("creating", KIND, ALIAS_PATH))?;
        let id = response_id(resp.as_ref(), KIND, ALIAS_PATH)?;
        data.set_id(&id);
        log::debug!("Created {KIND} {id:?}");

        self.read(data, client)
    }

    fn read(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let path = id_path(data.id());
        log::debug!("Reading {KIND} {:?}", data.id());
        let resp = client
            .read(&path)
            .map_err(api_error("reading", KIND, &path))?;
        match resp {
            Some(resp) => self.codec.decode(&resp.data, data),
            None => mark_gone(data, KIND),
        }
        Ok(())
    }

    fn update(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let path = id_path(data.id());
        log::debug!("Updating {KIND} {:?}", data.id());
        client
            .write(&path, &self.codec.encode(data))
            .map_err(api_error("updating", KIND, &path))?;
        self.read(data, client)
    }

    fn delete(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let path = id_path(data.id());
        log::debug!("Deleting {KIND} {:?}", data.id());
        client
            .delete(&path)
            .map_err(api_error("deleting", KIND, &path))?;
        Ok(())
    }

    fn exists(&self, data: &ResourceData, client: &Client) -> anyhow::Result<bool> {
        let path = id_path(data.id());
        let resp = client
            .read(&path)
            .map_err(api_error("checking for existence of", KIND, &path))?;
        Ok(resp.is_some())
    }

    fn importer(&self) -> Option<Importer> {
        Some(Importer::Passthrough)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::IdentityEntity;
    use crate::resources::testing::{client, mount};
    use std::collections::BTreeMap;
    use vaultapi::MockBackend;

    fn entity(client: &Client, name: &str) -> String {
        let mut data = ResourceData::new();
        data.set("name", name);
        IdentityEntity::new().create(&mut data, client).unwrap();
        data.id().to_string()
    }

    fn alias(name: &str, accessor: &str, canonical_id: &str) -> ResourceData {
        let mut data = ResourceData::new();
        data.set("name", name);
        data.set("mount_accessor", accessor);
        data.set("canonical_id", canonical_id);
        data
    }

    fn setup() -> (Client, MockBackend, String, String) {
        let (client, mock) = client();
        let accessor = mount(&mock, "githubA", "github");
        let entity_id = entity(&client, "entity-a");
        (client, mock, accessor, entity_id)
    }

    #[test]
    fn test_create_and_read() {
        let (client, _mock, accessor, entity_id) = setup();
        let resource = IdentityEntityAlias::new();

        let mut data = alias("alice", &accessor, &entity_id);
        data.set(
            "custom_metadata",
            BTreeMap::from([("version".to_string(), "1".to_string())]),
        );
        resource.create(&mut data, &client).unwrap();

        assert!(data.has_id());
        assert_eq!(data.get_str("canonical_id"), Some(entity_id.as_str()));
        assert_eq!(data.get_string_map("custom_metadata")["version"], "1");
    }

    #[test]
    fn test_duplicate_reports_existing_id() {
        let (client, mock, accessor, entity_id) = setup();
        let resource = IdentityEntityAlias::new();
        let mut first = alias("alice", &accessor, &entity_id);
        resource.create(&mut first, &client).unwrap();

        let mut dupe = alias("alice", &accessor, &entity_id);
        let err = resource.create(&mut dupe, &client).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "IdentityEntityAlias \"alice\" already exists for mount accessor {accessor:?} (id={}), it may be imported",
                first.id()
            )
        );
        assert!(!dupe.has_id());
        assert_eq!(mock.alias_count(), 1);
    }

    #[test]
    fn test_concurrent_duplicates_report_existing_id() {
        let (client, mock, accessor, entity_id) = setup();
        let resource = IdentityEntityAlias::new();

        for round in 0..20 {
            let name = format!("alice-{round}");
            let results: Vec<_> = std::thread::scope(|s| {
                let handles: Vec<_> = (0..4)
                    .map(|_| {
                        s.spawn(|| {
                            let mut data = alias(&name, &accessor, &entity_id);
                            resource.create(&mut data, &client)
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            for err in results.iter().filter_map(|r| r.as_ref().err()) {
                assert!(err.to_string().contains("may be imported"), "{err:#}");
            }
        }
        assert_eq!(mock.alias_count(), 20);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (client, mock, accessor, entity_id) = setup();
        let resource = IdentityEntityAlias::new();
        let mut data = alias("alice", &accessor, &entity_id);
        resource.create(&mut data, &client).unwrap();

        resource.delete(&mut data.clone(), &client).unwrap();
        resource.delete(&mut data.clone(), &client).unwrap();
        assert_eq!(mock.alias_count(), 0);
    }

    #[test]
    fn test_same_name_on_other_mount_is_allowed() {
        let (client, mock, accessor, entity_id) = setup();
        let other = mount(&mock, "githubB", "github");
        let resource = IdentityEntityAlias::new();

        resource
            .create(&mut alias("alice", &accessor, &entity_id), &client)
            .unwrap();
        resource
            .create(&mut alias("alice", &other, &entity_id), &client)
            .unwrap();
        assert_eq!(mock.alias_count(), 2);
    }

    #[test]
    fn test_update_replaces_fields() {
        let (client, mock, accessor, entity_id) = setup();
        let other_accessor = mount(&mock, "githubB", "github");
        let other_entity = entity(&client, "entity-b");
        let resource = IdentityEntityAlias::new();

        let mut data = alias("alice", &accessor, &entity_id);
        data.set(
            "custom_metadata",
            BTreeMap::from([("version".to_string(), "1".to_string())]),
        );
        resource.create(&mut data, &client).unwrap();
        let id = data.id().to_string();

        data.set("mount_accessor", other_accessor.as_str());
        data.set("canonical_id", other_entity.as_str());
        data.remove("custom_metadata");
        resource.update(&mut data, &client).unwrap();

        assert_eq!(data.id(), id);
        assert_eq!(data.get_str("mount_accessor"), Some(other_accessor.as_str()));
        assert_eq!(data.get_str("canonical_id"), Some(other_entity.as_str()));
        assert!(data.get("custom_metadata").is_none());
    }

    #[test]
    fn test_read_after_delete_clears_id() {
        let (client, _mock, accessor, entity_id) = setup();
        let resource = IdentityEntityAlias::new();
        let mut data = alias("alice", &accessor, &entity_id);
        resource.create(&mut data, &client).unwrap();

        resource.delete(&mut data.clone(), &client).unwrap();
        resource.read(&mut data, &client).unwrap();
        assert!(!data.has_id());
    }

    #[test]
    fn test_invalid_accessor_is_an_api_error() {
        let (client, _mock, _accessor, entity_id) = setup();
        let resource = IdentityEntityAlias::new();
        let err = resource
            .create(&mut alias("alice", "auth_nope", &entity_id), &client)
            .unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(provider_err.status(), Some(400));
    }
}
