//! `vault_github_team`: maps a GitHub team to policies on a github auth
//! backend.

use super::{api_error, mark_gone, trim_slashes};
use crate::codec::{FieldCodec, FieldMapping};
use crate::error::ProviderError;
use crate::path::PathCodec;
use declarative::{FieldSchema, Importer, Resource, ResourceData, Schema};
use std::sync::LazyLock;
use vaultapi::Client;

const KIND: &str = "GitHub team mapping";

static PATH: LazyLock<PathCodec> = LazyLock::new(|| {
    PathCodec::new("auth/{backend}/map/teams/{team}").expect("team map template is valid")
});

pub fn path_for(backend: &str, team: &str) -> String {
    PATH.path_for_params(&[backend, team])
}

/// Import ids look like `<backend>/teams/<team>`.
fn parse_import_id(import_id: &str, data: &mut ResourceData) -> anyhow::Result<()> {
    let invalid = || ProviderError::InvalidImportId {
        id: import_id.to_string(),
        kind: KIND,
        expected: "<backend>/teams/<team>",
    };
    let (backend, team) = import_id
        .trim_matches('/')
        .rsplit_once("/teams/")
        .ok_or_else(invalid)?;
    if backend.is_empty() || team.is_empty() || team.contains('/') {
        return Err(invalid().into());
    }
    data.set_id(path_for(backend, team));
    Ok(())
}

pub struct GithubTeam {
    schema: Schema,
    codec: FieldCodec,
}

impl GithubTeam {
    pub fn new() -> Self {
        let schema = Schema::new(vec![
            FieldSchema::string("backend")
                .optional()
                .default_value("github")
                .force_new()
                .state_func(trim_slashes)
                .description("Auth backend to which the team mapping belongs."),
            FieldSchema::string("team")
                .required()
                .force_new()
                .description("GitHub team name in \"slugified\" format."),
            FieldSchema::list("policies")
                .optional()
                .description("Policies to be assigned to this team."),
        ]);
        let codec = FieldCodec::new(vec![
            FieldMapping::new("policies").wire_key("value").comma_joined(),
        ]);
        Self { schema, codec }
    }

    fn write(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let backend = data.get_str("backend").unwrap_or("github").to_string();
        let team = data.get_str("team").unwrap_or_default().to_string();
        let path = path_for(&backend, &team);

        let mut payload = self.codec.encode(data);
        payload
            .entry("value")
            .or_insert_with(|| serde_json::Value::String(String::new()));

        log::debug!("Writing {KIND} to {path:?}");
        client
            .write(&path, &payload)
            .map_err(api_error("writing", KIND, &path))?;
        data.set_id(&path);

        self.read(data, client)
    }
}

impl Default for GithubTeam {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource<Client> for GithubTeam {
    fn type_name(&self) -> &'static str {
        "vault_github_team"
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
        let params = PATH
            .params_from_path(&path)
            .map_err(|source| ProviderError::InvalidPath {
                path: path.clone(),
                kind: KIND,
                source,
            })?;

        log::debug!("Reading {KIND} {path:?}");
        let resp = client
            .read(&path)
            .map_err(api_error("reading", KIND, &path))?;
        let Some(resp) = resp else {
            mark_gone(data, KIND);
            return Ok(());
        };

        self.codec.decode(&resp.data, data);
        if let [backend, team] = params.as_slice() {
            data.set("backend", backend.as_str());
            data.set("team", team.as_str());
        }
        Ok(())
    }

    fn delete(&self, data: &mut ResourceData, client: &Client) -> anyhow::Result<()> {
        let path = data.id().to_string();
        log::debug!("Deleting {KIND} {path:?}");
        client
            .delete(&path)
            .map_err(api_error("deleting", KIND, &path))?;
        Ok(())
    }

    fn exists(&self, data: &ResourceData, client: &Client) -> anyhow::Result<bool> {
        let path = data.id();
        let resp = client
            .read(path)
            .map_err(api_error("checking for existence of", KIND, path))?;
        Ok(resp.is_some())
    }

    fn importer(&self) -> Option<Importer> {
        Some(Importer::Custom(parse_import_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::{client, mount};
    use vaultapi::Operation;

    fn team(name: &str, policies: Vec<&str>) -> ResourceData {
        let mut data = ResourceData::new();
        data.set("backend", "github");
        data.set("team", name);
        data.set("policies", policies);
        data
    }

    #[test]
    fn test_policies_travel_comma_joined() {
        let (client, mock) = client();
        mount(&mock, "github", "github");
        mock.clear_requests();
        let resource = GithubTeam::new();

        let mut data = team("dev", vec!["admin", "security"]);
        resource.create(&mut data, &client).unwrap();

        assert_eq!(data.id(), "auth/github/map/teams/dev");
        assert_eq!(data.get_string_list("policies"), vec!["admin", "security"]);
        let write = mock
            .requests()
            .into_iter()
            .find(|r| r.operation == Operation::Write)
            .unwrap();
        assert_eq!(write.body.unwrap()["value"], "admin,security");
    }

    #[test]
    fn test_empty_policies_read_back_absent_or_empty() {
        let (client, mock) = client();
        mount(&mock, "github", "github");
        let resource = GithubTeam::new();

        let mut data = team("dev", vec![]);
        resource.create(&mut data, &client).unwrap();
        assert!(data.get_string_list("policies").is_empty());
    }

    #[test]
    fn test_unmounted_backend_fails() {
        let (client, _mock) = client();
        let resource = GithubTeam::new();
        let mut data = team("dev", vec!["admin"]);
        let err = resource.create(&mut data, &client).unwrap_err();
        assert!(format!("{err:#}").contains("no handler for route"));
        assert!(!data.has_id());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (client, mock) = client();
        mount(&mock, "github", "github");
        let resource = GithubTeam::new();
        let mut data = team("dev", vec!["admin"]);
        resource.create(&mut data, &client).unwrap();

        resource.delete(&mut data.clone(), &client).unwrap();
        resource.delete(&mut data.clone(), &client).unwrap();
        assert!(!resource.exists(&data, &client).unwrap());
    }

    #[test]
    fn test_import_id_parsing() {
        let mut data = ResourceData::new();
        parse_import_id("github/teams/dev", &mut data).unwrap();
        assert_eq!(data.id(), "auth/github/map/teams/dev");

        let mut data = ResourceData::new();
        parse_import_id("org/github/teams/dev", &mut data).unwrap();
        assert_eq!(data.id(), "auth/org/github/map/teams/dev");

        for bad in ["github/dev", "/teams/dev", "github/teams/", "github/teams/a/b"] {
            let err = parse_import_id(bad, &mut ResourceData::new()).unwrap_err();
            assert!(err.to_string().contains("<backend>/teams/<team>"), "{bad}");
        }
    }

    #[test]
    fn test_import_then_read() {
        let (client, mock) = client();
        mount(&mock, "github", "github");
        let resource = GithubTeam::new();
        resource
            .create(&mut team("dev", vec!["admin"]), &client)
            .unwrap();

        let mut imported = resource.importer().unwrap().prepare("github/teams/dev").unwrap();
        resource.read(&mut imported, &client).unwrap();
        assert_eq!(imported.get_str("backend"), Some("github"));
        assert_eq!(imported.get_str("team"), Some("dev"));
        assert_eq!(imported.get_string_list("policies"), vec!["admin"]);
    }
}
