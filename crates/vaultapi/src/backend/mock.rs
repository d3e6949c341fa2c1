//! In-memory backend for testing without a server.
//!
//! Models the endpoints the provider talks to closely enough for lifecycle
//! tests: auth mounts with accessors, identity entities and entity aliases
//! (including the mount/name uniqueness rule), the AWS auth identity config and
//! GitHub team mappings. Any other path behaves like a plain key/value store.
//!
//! Clones share the same state, so a test can hand one clone to the code under
//! test and inspect the other.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{Operation, Payload, Secret};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

const IAM_ALIASES: &[&str] = &["role_id", "unique_id", "full_arn"];
const EC2_ALIASES: &[&str] = &["role_id", "instance_id", "image_id"];

/// A request as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub operation: Operation,
    pub path: String,
    pub body: Option<Payload>,
}

#[derive(Debug, Clone)]
struct Mount {
    mount_type: String,
    description: String,
    accessor: String,
}

#[derive(Debug, Clone)]
struct Entity {
    id: String,
    name: String,
    policies: Vec<String>,
    metadata: BTreeMap<String, String>,
    disabled: bool,
}

#[derive(Debug, Clone)]
struct Alias {
    id: String,
    name: String,
    mount_accessor: String,
    canonical_id: String,
    custom_metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct Failure {
    operation: Operation,
    path: String,
    status: u16,
    message: String,
}

#[derive(Debug, Default)]
struct MockState {
    mounts: BTreeMap<String, Mount>,
    entities: BTreeMap<String, Entity>,
    aliases: BTreeMap<String, Alias>,
    kv: BTreeMap<String, Payload>,
    requests: Vec<RecordedRequest>,
    failures: Vec<Failure>,
}

/// In-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    /// Make the next `operation` on `path` fail with an API error.
    pub fn fail_next(&self, operation: Operation, path: &str, status: u16, message: &str) {
        self.lock().failures.push(Failure {
            operation,
            path: normalize(path),
            status,
            message: message.to_string(),
        });
    }

    /// Accessor of a mounted auth backend.
    pub fn mount_accessor(&self, path: &str) -> Option<String> {
        self.lock()
            .mounts
            .get(&normalize(path))
            .map(|m| m.accessor.clone())
    }

    /// Number of entity aliases currently stored.
    pub fn alias_count(&self) -> usize {
        self.lock().aliases.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panic in another test thread must not cascade.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, op: Operation, path: &str, body: Option<&Payload>) -> Result<Option<Secret>> {
        let path = normalize(path);
        let mut state = self.lock();
        state.requests.push(RecordedRequest {
            operation: op,
            path: path.clone(),
            body: body.cloned(),
        });

        if let Some(pos) = state
            .failures
            .iter()
            .position(|f| f.operation == op && f.path == path)
        {
            let failure = state.failures.remove(pos);
            return Err(Error::api(failure.status, [failure.message]));
        }

        let empty = Payload::new();
        state.route(op, &path, body.unwrap_or(&empty))
    }
}

impl Backend for MockBackend {
    fn read(&self, path: &str) -> Result<Option<Secret>> {
        self.handle(Operation::Read, path, None)
    }

    fn list(&self, path: &str) -> Result<Option<Secret>> {
        self.handle(Operation::List, path, None)
    }

    fn write(&self, path: &str, data: &Payload) -> Result<Option<Secret>> {
        self.handle(Operation::Write, path, Some(data))
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.handle(Operation::Delete, path, None).map(|_| ())
    }
}

impl MockState {
    fn route(&mut self, op: Operation, path: &str, body: &Payload) -> Result<Option<Secret>> {
        let parts: Vec<&str> = path.split('/').collect();
        match (op, parts.as_slice()) {
            (Operation::Read, ["sys", "auth"]) => Ok(Some(self.list_mounts())),
            (Operation::Write, ["sys", "auth", rest @ ..]) if !rest.is_empty() => {
                self.enable_mount(&rest.join("/"), body)
            }
            (Operation::Delete, ["sys", "auth", rest @ ..]) if !rest.is_empty() => {
                self.disable_mount(&rest.join("/"));
                Ok(None)
            }

            (Operation::Write, ["identity", "entity"]) => self.create_entity(body),
            (Operation::List, ["identity", "entity", "id"]) => Ok(self.list_entities()),
            (Operation::Read, ["identity", "entity", "id", id]) => {
                Ok(self.entities.get(*id).map(|e| self.entity_secret(e)))
            }
            (Operation::Read, ["identity", "entity", "name", name]) => Ok(self
                .entities
                .values()
                .find(|e| e.name == *name)
                .map(|e| self.entity_secret(e))),
            (Operation::Write, ["identity", "entity", "id", id]) => self.update_entity(id, body),
            (Operation::Delete, ["identity", "entity", "id", id]) => {
                self.entities.remove(*id);
                self.aliases.retain(|_, a| a.canonical_id != *id);
                Ok(None)
            }

            (Operation::Write, ["identity", "entity-alias"]) => self.create_alias(body),
            (Operation::List, ["identity", "entity-alias", "id"]) => Ok(self.list_aliases()),
            (Operation::Read, ["identity", "entity-alias", "id", id]) => {
                Ok(self.aliases.get(*id).map(|a| self.alias_secret(a)))
            }
            (Operation::Write, ["identity", "entity-alias", "id", id]) => {
                self.update_alias(id, body)
            }
            (Operation::Delete, ["identity", "entity-alias", "id", id]) => {
                self.aliases.remove(*id);
                Ok(None)
            }

            (_, ["auth", ..]) => self.route_auth(op, path, body),
            _ => Ok(self.route_kv(op, path, body)),
        }
    }

    // ------------------------------------------------------------------------
    // sys/auth
    // ------------------------------------------------------------------------

    fn list_mounts(&self) -> Secret {
        let mut data = Payload::new();
        for (path, mount) in &self.mounts {
            data.insert(
                format!("{path}/"),
                json!({
                    "type": mount.mount_type,
                    "description": mount.description,
                    "accessor": mount.accessor,
                    "local": false,
                    "seal_wrap": false,
                }),
            );
        }
        Secret::with_data(data)
    }

    fn enable_mount(&mut self, path: &str, body: &Payload) -> Result<Option<Secret>> {
        let mount_type = str_field(body, "type")
            .ok_or_else(|| Error::api(400, ["backend type must be specified"]))?;
        if self.mounts.contains_key(path) {
            return Err(Error::api(
                400,
                [format!("path is already in use at {path}/")],
            ));
        }
        let accessor = format!("auth_{}_{}", mount_type, short_id());
        self.mounts.insert(
            path.to_string(),
            Mount {
                mount_type,
                description: str_field(body, "description").unwrap_or_default(),
                accessor,
            },
        );
        Ok(None)
    }

    fn disable_mount(&mut self, path: &str) {
        if let Some(mount) = self.mounts.remove(path) {
            self.aliases.retain(|_, a| a.mount_accessor != mount.accessor);
            let prefix = format!("auth/{path}/");
            self.kv.retain(|k, _| !k.starts_with(&prefix));
        }
    }

    fn mount_by_accessor(&self, accessor: &str) -> Option<(&String, &Mount)> {
        self.mounts.iter().find(|(_, m)| m.accessor == accessor)
    }

    // ------------------------------------------------------------------------
    // identity/entity
    // ------------------------------------------------------------------------

    fn create_entity(&mut self, body: &Payload) -> Result<Option<Secret>> {
        let id = uuid::Uuid::new_v4().to_string();
        let name = str_field(body, "name").unwrap_or_else(|| format!("entity_{}", short_id()));
        if self.entities.values().any(|e| e.name == name) {
            return Err(Error::api(400, ["entity name is already in use"]));
        }
        let entity = Entity {
            id: id.clone(),
            name: name.clone(),
            policies: body.get("policies").map(string_list).unwrap_or_default(),
            metadata: body.get("metadata").map(string_map).unwrap_or_default(),
            disabled: body.get("disabled").and_then(Value::as_bool).unwrap_or(false),
        };
        self.entities.insert(id.clone(), entity);
        Ok(Some(secret(json!({"id": id, "name": name, "aliases": null}))))
    }

    fn update_entity(&mut self, id: &str, body: &Payload) -> Result<Option<Secret>> {
        if let Some(name) = str_field(body, "name")
            && self.entities.values().any(|e| e.name == name && e.id != id)
        {
            return Err(Error::api(400, ["entity name is already in use"]));
        }
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| Error::api(400, ["entity not found"]))?;
        if let Some(name) = str_field(body, "name") {
            entity.name = name;
        }
        if let Some(policies) = body.get("policies") {
            entity.policies = string_list(policies);
        }
        if let Some(metadata) = body.get("metadata") {
            entity.metadata = string_map(metadata);
        }
        if let Some(disabled) = body.get("disabled").and_then(Value::as_bool) {
            entity.disabled = disabled;
        }
        Ok(None)
    }

    fn list_entities(&self) -> Option<Secret> {
        if self.entities.is_empty() {
            return None;
        }
        let keys: Vec<&String> = self.entities.keys().collect();
        let key_info: Payload = self
            .entities
            .values()
            .map(|e| (e.id.clone(), json!({"name": e.name})))
            .collect();
        Some(secret(json!({"keys": keys, "key_info": key_info})))
    }

    fn entity_secret(&self, entity: &Entity) -> Secret {
        let aliases: Vec<Value> = self
            .aliases
            .values()
            .filter(|a| a.canonical_id == entity.id)
            .map(|a| self.alias_json(a))
            .collect();
        let metadata = if entity.metadata.is_empty() {
            Value::Null
        } else {
            json!(entity.metadata)
        };
        secret(json!({
            "id": entity.id,
            "name": entity.name,
            "policies": entity.policies,
            "metadata": metadata,
            "disabled": entity.disabled,
            "aliases": aliases,
            "namespace_id": "root",
        }))
    }

    // ------------------------------------------------------------------------
    // identity/entity-alias
    // ------------------------------------------------------------------------

    fn create_alias(&mut self, body: &Payload) -> Result<Option<Secret>> {
        let name = str_field(body, "name").ok_or_else(|| Error::api(400, ["missing alias name"]))?;
        let mount_accessor = str_field(body, "mount_accessor")
            .ok_or_else(|| Error::api(400, ["missing mount_accessor"]))?;
        let canonical_id = str_field(body, "canonical_id")
            .ok_or_else(|| Error::api(400, ["missing canonical_id"]))?;
        self.check_alias_target(None, &name, &mount_accessor, &canonical_id)?;

        let id = uuid::Uuid::new_v4().to_string();
        self.aliases.insert(
            id.clone(),
            Alias {
                id: id.clone(),
                name,
                mount_accessor,
                canonical_id: canonical_id.clone(),
                custom_metadata: body.get("custom_metadata").map(string_map).unwrap_or_default(),
            },
        );
        Ok(Some(secret(json!({"id": id, "canonical_id": canonical_id}))))
    }

    fn update_alias(&mut self, id: &str, body: &Payload) -> Result<Option<Secret>> {
        let current = self
            .aliases
            .get(id)
            .cloned()
            .ok_or_else(|| Error::api(400, ["entity alias not found"]))?;
        let name = str_field(body, "name").unwrap_or(current.name);
        let mount_accessor = str_field(body, "mount_accessor").unwrap_or(current.mount_accessor);
        let canonical_id = str_field(body, "canonical_id").unwrap_or(current.canonical_id);
        self.check_alias_target(Some(id), &name, &mount_accessor, &canonical_id)?;

        let custom_metadata = body
            .get("custom_metadata")
            .map(string_map)
            .unwrap_or(current.custom_metadata);
        self.aliases.insert(
            id.to_string(),
            Alias {
                id: id.to_string(),
                name,
                mount_accessor,
                canonical_id: canonical_id.clone(),
                custom_metadata,
            },
        );
        Ok(Some(secret(json!({"id": id, "canonical_id": canonical_id}))))
    }

    fn check_alias_target(
        &self,
        own_id: Option<&str>,
        name: &str,
        mount_accessor: &str,
        canonical_id: &str,
    ) -> Result<()> {
        if self.mount_by_accessor(mount_accessor).is_none() {
            return Err(Error::api(
                400,
                [format!("invalid mount accessor {mount_accessor:?}")],
            ));
        }
        if !self.entities.contains_key(canonical_id) {
            return Err(Error::api(400, ["invalid canonical ID"]));
        }
        let in_use = self.aliases.values().any(|a| {
            a.name == name && a.mount_accessor == mount_accessor && Some(a.id.as_str()) != own_id
        });
        if in_use {
            return Err(Error::api(
                400,
                ["combination of mount and alias name is already in use"],
            ));
        }
        Ok(())
    }

    fn list_aliases(&self) -> Option<Secret> {
        if self.aliases.is_empty() {
            return None;
        }
        let keys: Vec<&String> = self.aliases.keys().collect();
        let key_info: Payload = self
            .aliases
            .values()
            .map(|a| (a.id.clone(), self.alias_json(a)))
            .collect();
        Some(secret(json!({"keys": keys, "key_info": key_info})))
    }

    fn alias_json(&self, alias: &Alias) -> Value {
        let (mount_path, mount_type) = self
            .mount_by_accessor(&alias.mount_accessor)
            .map(|(path, m)| (format!("auth/{path}/"), m.mount_type.clone()))
            .unwrap_or_default();
        let custom_metadata = if alias.custom_metadata.is_empty() {
            Value::Null
        } else {
            json!(alias.custom_metadata)
        };
        json!({
            "id": alias.id,
            "name": alias.name,
            "mount_accessor": alias.mount_accessor,
            "canonical_id": alias.canonical_id,
            "custom_metadata": custom_metadata,
            "mount_path": mount_path,
            "mount_type": mount_type,
        })
    }

    fn alias_secret(&self, alias: &Alias) -> Secret {
        match self.alias_json(alias) {
            Value::Object(data) => Secret::with_data(data),
            _ => Secret::default(),
        }
    }

    // ------------------------------------------------------------------------
    // auth/<mount>/...
    // ------------------------------------------------------------------------

    fn route_auth(&mut self, op: Operation, path: &str, body: &Payload) -> Result<Option<Secret>> {
        let rest = &path["auth/".len()..];
        let mount = self
            .mounts
            .iter()
            .filter(|(p, _)| rest.starts_with(&format!("{p}/")))
            .max_by_key(|(p, _)| p.len())
            .map(|(p, m)| (p.clone(), m.mount_type.clone()));

        let Some((mount_path, mount_type)) = mount else {
            return unsupported(op, path);
        };
        let sub = &rest[mount_path.len() + 1..];
        let sub_parts: Vec<&str> = sub.split('/').collect();

        match (mount_type.as_str(), op, sub_parts.as_slice()) {
            ("aws", Operation::Read, ["config", "identity"]) => {
                Ok(Some(Secret::with_data(self.aws_identity_config(path))))
            }
            ("aws", Operation::Write, ["config", "identity"]) => {
                let merged = merge_aws_identity(self.aws_identity_config(path), body)?;
                self.kv.insert(path.to_string(), merged);
                Ok(None)
            }
            ("github", Operation::List, ["map", "teams"]) => {
                Ok(self.route_kv(Operation::List, path, body))
            }
            ("github", Operation::Write, ["map", "teams", team]) => {
                let value = match body.get("value") {
                    Some(Value::String(s)) => s.clone(),
                    Some(list @ Value::Array(_)) => string_list(list).join(","),
                    _ => String::new(),
                };
                let mut data = Payload::new();
                data.insert("key".to_string(), json!(team));
                data.insert("value".to_string(), json!(value));
                self.kv.insert(path.to_string(), data);
                Ok(None)
            }
            ("github", Operation::Read | Operation::Delete, ["map", "teams", _]) => {
                Ok(self.route_kv(op, path, body))
            }
            _ => unsupported(op, path),
        }
    }

    fn aws_identity_config(&self, path: &str) -> Payload {
        self.kv.get(path).cloned().unwrap_or_else(|| {
            let mut data = Payload::new();
            data.insert("iam_alias".to_string(), json!("role_id"));
            data.insert("iam_metadata".to_string(), json!([]));
            data.insert("ec2_alias".to_string(), json!("role_id"));
            data.insert("ec2_metadata".to_string(), json!([]));
            data
        })
    }

    // ------------------------------------------------------------------------
    // generic key/value
    // ------------------------------------------------------------------------

    fn route_kv(&mut self, op: Operation, path: &str, body: &Payload) -> Option<Secret> {
        match op {
            Operation::Read => self.kv.get(path).cloned().map(Secret::with_data),
            Operation::Write => {
                self.kv.insert(path.to_string(), body.clone());
                None
            }
            Operation::Delete => {
                self.kv.remove(path);
                None
            }
            Operation::List => {
                let prefix = format!("{path}/");
                let mut keys: Vec<String> = self
                    .kv
                    .keys()
                    .filter_map(|k| k.strip_prefix(&prefix))
                    .map(|rest| match rest.split_once('/') {
                        Some((dir, _)) => format!("{dir}/"),
                        None => rest.to_string(),
                    })
                    .collect();
                keys.dedup();
                if keys.is_empty() {
                    None
                } else {
                    Some(secret(json!({ "keys": keys })))
                }
            }
        }
    }
}

fn merge_aws_identity(mut config: Payload, body: &Payload) -> Result<Payload> {
    for (key, allowed) in [("iam_alias", IAM_ALIASES), ("ec2_alias", EC2_ALIASES)] {
        if let Some(value) = body.get(key) {
            let value = value.as_str().unwrap_or_default();
            if !allowed.contains(&value) {
                return Err(Error::api(
                    400,
                    [format!("invalid {key} value, must be one of: {}", allowed.join(", "))],
                ));
            }
            config.insert(key.to_string(), json!(value));
        }
    }
    for key in ["iam_metadata", "ec2_metadata"] {
        if let Some(value) = body.get(key) {
            config.insert(key.to_string(), json!(string_list(value)));
        }
    }
    Ok(config)
}

fn unsupported(op: Operation, path: &str) -> Result<Option<Secret>> {
    match op {
        Operation::Read | Operation::List | Operation::Delete => Ok(None),
        Operation::Write => Err(Error::api(404, [format!("no handler for route {path:?}")])),
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn secret(data: Value) -> Secret {
    match data {
        Value::Object(map) => Secret::with_data(map),
        _ => Secret::default(),
    }
}

fn str_field(body: &Payload, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts a JSON array of strings or a comma-separated string.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn mount(mock: &MockBackend, path: &str, mount_type: &str) -> String {
        mock.write(&format!("sys/auth/{path}"), &payload(json!({"type": mount_type})))
            .unwrap();
        mock.mount_accessor(path).unwrap()
    }

    fn entity(mock: &MockBackend, name: &str) -> String {
        let resp = mock
            .write("identity/entity", &payload(json!({"name": name})))
            .unwrap()
            .unwrap();
        resp.get_str("id").unwrap().to_string()
    }

    #[test]
    fn test_mount_lifecycle() {
        let mock = MockBackend::new();
        let accessor = mount(&mock, "github", "github");
        assert!(accessor.starts_with("auth_github_"));

        let mounts = mock.read("sys/auth").unwrap().unwrap();
        assert_eq!(mounts.data["github/"]["accessor"], json!(accessor));

        let dup = mock.write("sys/auth/github", &payload(json!({"type": "github"})));
        assert_eq!(dup.unwrap_err().status(), Some(400));

        mock.delete("sys/auth/github").unwrap();
        assert!(mock.mount_accessor("github").is_none());
    }

    #[test]
    fn test_entity_crud() {
        let mock = MockBackend::new();
        let id = entity(&mock, "alice");

        let read = mock.read(&format!("identity/entity/id/{id}")).unwrap().unwrap();
        assert_eq!(read.get_str("name"), Some("alice"));
        assert!(mock.read("identity/entity/name/alice").unwrap().is_some());

        mock.write(
            &format!("identity/entity/id/{id}"),
            &payload(json!({"policies": ["dev"]})),
        )
        .unwrap();
        let read = mock.read(&format!("identity/entity/id/{id}")).unwrap().unwrap();
        assert_eq!(read.data["policies"], json!(["dev"]));

        mock.delete(&format!("identity/entity/id/{id}")).unwrap();
        assert!(mock.read(&format!("identity/entity/id/{id}")).unwrap().is_none());
    }

    #[test]
    fn test_entity_name_conflict() {
        let mock = MockBackend::new();
        entity(&mock, "alice");
        let err = mock
            .write("identity/entity", &payload(json!({"name": "alice"})))
            .unwrap_err();
        assert!(err.to_string().contains("already in use"));
    }

    #[test]
    fn test_alias_uniqueness_per_mount() {
        let mock = MockBackend::new();
        let accessor = mount(&mock, "github", "github");
        let id = entity(&mock, "alice");
        let body = payload(json!({"name": "alice", "mount_accessor": accessor, "canonical_id": id}));

        let created = mock.write("identity/entity-alias", &body).unwrap().unwrap();
        assert!(created.get_str("id").is_some());

        let err = mock.write("identity/entity-alias", &body).unwrap_err();
        assert!(err.to_string().contains("already in use"));

        let listed = mock.list("identity/entity-alias/id").unwrap().unwrap();
        assert_eq!(listed.list_keys().len(), 1);
    }

    #[test]
    fn test_alias_requires_known_accessor() {
        let mock = MockBackend::new();
        let id = entity(&mock, "alice");
        let body = payload(json!({"name": "a", "mount_accessor": "auth_x_1", "canonical_id": id}));
        let err = mock.write("identity/entity-alias", &body).unwrap_err();
        assert!(err.to_string().contains("invalid mount accessor"));
    }

    #[test]
    fn test_disable_mount_removes_aliases() {
        let mock = MockBackend::new();
        let accessor = mount(&mock, "github", "github");
        let id = entity(&mock, "alice");
        mock.write(
            "identity/entity-alias",
            &payload(json!({"name": "alice", "mount_accessor": accessor, "canonical_id": id})),
        )
        .unwrap();
        assert_eq!(mock.alias_count(), 1);

        mock.delete("sys/auth/github").unwrap();
        assert_eq!(mock.alias_count(), 0);
        assert!(mock.list("identity/entity-alias/id").unwrap().is_none());
    }

    #[test]
    fn test_aws_identity_config_defaults_and_validation() {
        let mock = MockBackend::new();
        assert!(mock.read("auth/aws/config/identity").unwrap().is_none());

        mount(&mock, "aws", "aws");
        let read = mock.read("auth/aws/config/identity").unwrap().unwrap();
        assert_eq!(read.get_str("iam_alias"), Some("role_id"));
        assert_eq!(read.data["ec2_metadata"], json!([]));

        mock.write(
            "auth/aws/config/identity",
            &payload(json!({"iam_alias": "full_arn", "iam_metadata": ["account_id"]})),
        )
        .unwrap();
        let read = mock.read("auth/aws/config/identity").unwrap().unwrap();
        assert_eq!(read.get_str("iam_alias"), Some("full_arn"));
        assert_eq!(read.data["iam_metadata"], json!(["account_id"]));

        let err = mock
            .write("auth/aws/config/identity", &payload(json!({"ec2_alias": "full_arn"})))
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_write_to_unmounted_auth_path_fails() {
        let mock = MockBackend::new();
        let err = mock
            .write("auth/aws/config/identity", &payload(json!({"iam_alias": "role_id"})))
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_github_team_mapping() {
        let mock = MockBackend::new();
        mount(&mock, "github", "github");
        mock.write(
            "auth/github/map/teams/dev",
            &payload(json!({"value": "default,dev"})),
        )
        .unwrap();
        let read = mock.read("auth/github/map/teams/dev").unwrap().unwrap();
        assert_eq!(read.get_str("key"), Some("dev"));
        assert_eq!(read.get_str("value"), Some("default,dev"));
        assert_eq!(
            mock.list("auth/github/map/teams").unwrap().unwrap().list_keys(),
            vec!["dev".to_string()]
        );
        mock.delete("auth/github/map/teams/dev").unwrap();
        assert!(mock.read("auth/github/map/teams/dev").unwrap().is_none());
    }

    #[test]
    fn test_fail_next_is_one_shot() {
        let mock = MockBackend::new();
        mock.fail_next(Operation::Read, "/secret/foo", 503, "Vault is sealed");
        let err = mock.read("secret/foo").unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(mock.read("secret/foo").unwrap().is_none());
    }

    #[test]
    fn test_requests_are_recorded() {
        let mock = MockBackend::new();
        mock.write("secret/foo", &payload(json!({"a": "b"}))).unwrap();
        mock.read("secret/foo").unwrap();
        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].operation, Operation::Write);
        assert_eq!(requests[1].body, None);
        mock.clear_requests();
        assert!(mock.requests().is_empty());
    }
}
