//! `vault_identity_entity`: an identity entity.

use super::{api_error, mark_gone, response_id};
use crate::codec::{FieldCodec, FieldMapping};
use crate::error::ProviderError;
use declarative::{FieldSchema, Importer, Resource, ResourceData, Schema};
use serde_json::json;
use vaultapi::Client;

const KIND: &str = "IdentityEntity";
const ENTITY_PATH: &str = "identity/entity";

pub fn id_path(id: &str) -> String {
    format!("{ENTITY_PATH}/id/{id}")
}

pub fn name_path(name: &str) -> String {
    format!("{ENTITY_PATH}/name/{name}")
}

pub struct IdentityEntity {
    schema: Schema,
    codec: FieldCodec,
}

impl IdentityEntity {
    pub fn new() -> Self {
        let schema = Schema::new(vec![
            FieldSchema::string("name")
                .optional()
                .computed()
                .description("Name of the entity."),
            FieldSchema::set("policies")
                .optional()
                .description("Policies to be tied to the entity."),
            FieldSchema::map("metadata")
                .optional()
                .description("Metadata to be associated with the entity."),
            FieldSchema::bool("disabled")
                .optional()
                .default_value(false)
                .description("Whether the entity is disabled."),
        ]);
        let codec = FieldCodec::new(vec![
            FieldMapping::new("name"),
            FieldMapping::new("policies").when_absent(json!([])),
            FieldMapping::new("metadata").when_absent(json!({})),
            FieldMapping::new("disabled"),
        ]);
        Self { schema, codec }
    }

    /// Fail when an untracked entity already holds the name.
    fn check_conflict(&self, name: &str, client: &Client) -> anyhow::Result<()> {
        let path = name_path(name);
        let existing = client
            .read(&path)
            .map_err(api_error("looking up", KIND, &path))?;
        if let Some(id) = existing.as_ref().and_then(|e| e.get_str("id")) {
            return Err(ProviderError::AlreadyExists {
                kind: KIND,
                name: name.to_string(),
                detail: String::new(),
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for IdentityEntity {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource<Client> for IdentityEntity {
    fn type_name(&self) -> &'static str {
        "vault_identity_entity"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        if let Some(name) = data.get_str("name").filter(|n| !n.is_empty()) {
            self.check_conflict(name, client)?;
        }

        log::debug!("Creating {KIND} {:?}", data.get_str("name").unwrap_or_default());
        let resp = client
            .write(ENTITY_PATH, &self.codec.encode(data))
            .map_err(api_error("creating", KIND, ENTITY_PATH))?;
        let id = response_id(resp.as_ref(), KIND, ENTITY_PATH)?;
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
    use crate::resources::testing::client;
    use std::collections::BTreeMap;

    fn entity(name: &str) -> ResourceData {
        let mut data = ResourceData::new();
        data.set("name", name);
        data.set("policies", vec!["test"]);
        data.set(
            "metadata",
            BTreeMap::from([("version".to_string(), "1".to_string())]),
        );
        data.set("disabled", false);
        data
    }

    #[test]
    fn test_create_and_read() {
        let (client, _mock) = client();
        let resource = IdentityEntity::new();
        let mut data = entity("alice");
        resource.create(&mut data, &client).unwrap();

        assert!(data.has_id());
        assert_eq!(data.get_str("name"), Some("alice"));
        assert_eq!(data.get_string_list("policies"), vec!["test"]);
        assert_eq!(data.get_string_map("metadata")["version"], "1");
    }

    #[test]
    fn test_create_conflict_names_existing_id() {
        let (client, _mock) = client();
        let resource = IdentityEntity::new();
        let mut first = entity("alice");
        resource.create(&mut first, &client).unwrap();

        let mut second = entity("alice");
        let err = resource.create(&mut second, &client).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("IdentityEntity \"alice\" already exists"));
        assert!(message.contains(first.id()));
        assert!(message.contains("may be imported"));
        assert!(!second.has_id());
    }

    #[test]
    fn test_update_clears_removed_metadata() {
        let (client, _mock) = client();
        let resource = IdentityEntity::new();
        let mut data = entity("alice");
        resource.create(&mut data, &client).unwrap();

        data.remove("metadata");
        data.set("policies", vec!["test", "admin"]);
        resource.update(&mut data, &client).unwrap();

        assert!(data.get_string_map("metadata").is_empty());
        assert_eq!(data.get_string_list("policies"), vec!["test", "admin"]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (client, _mock) = client();
        let resource = IdentityEntity::new();
        let mut data = entity("alice");
        resource.create(&mut data, &client).unwrap();

        resource.delete(&mut data.clone(), &client).unwrap();
        resource.delete(&mut data.clone(), &client).unwrap();
        assert!(!resource.exists(&data, &client).unwrap());
    }

    #[test]
    fn test_conflict_check_with_reserved_characters_in_name() {
        let (client, mock) = client();
        let resource = IdentityEntity::new();
        let mut data = entity("team?ops #1");
        resource.create(&mut data, &client).unwrap();

        let err = resource.create(&mut entity("team?ops #1"), &client).unwrap_err();
        assert!(err.to_string().contains(data.id()));
        assert!(
            mock.requests()
                .iter()
                .any(|r| r.path == "identity/entity/name/team?ops #1")
        );
    }

    #[test]
    fn test_drift_clears_id() {
        let (client, _mock) = client();
        let resource = IdentityEntity::new();
        let mut data = entity("alice");
        resource.create(&mut data, &client).unwrap();

        resource.delete(&mut data.clone(), &client).unwrap();
        assert!(!resource.exists(&data, &client).unwrap());
        resource.read(&mut data, &client).unwrap();
        assert!(!data.has_id());
    }
}
