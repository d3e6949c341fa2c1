//! Command implementations
//!
//! Every command that talks to the server goes through [`Session::open`],
//! which reads the configuration document, layers provider settings, builds
//! the client and loads the state file.

pub mod apply;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod state;
pub mod validate;

use anyhow::{Context as AnyhowContext, Result};
use declarative::{ConfigDocument, Provider};
use std::fs;
use std::path::Path;
use vaultapi::Client;

use crate::Context;
use crate::config::ProviderSettings;
use crate::paths;
use crate::state::StateFile;

/// Read and parse the configuration document.
pub fn load_document(path: &Path) -> Result<ConfigDocument> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
    let doc = ConfigDocument::parse(&content)
        .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
    log::debug!(
        "Loaded {} resource declaration(s) from {}",
        doc.len(),
        path.display()
    );
    Ok(doc)
}

/// Everything a command needs to plan and apply.
pub struct Session {
    pub config: ConfigDocument,
    pub provider: Provider<Client>,
    pub client: Client,
    pub state: StateFile,
}

impl Session {
    /// Open a session. With `allow_missing`, an absent configuration file
    /// is treated as empty (destroy works from state alone).
    pub fn open(ctx: &Context, allow_missing: bool) -> Result<Self> {
        let config = if allow_missing && !ctx.file.exists() {
            log::debug!("{} not found, using an empty configuration", ctx.file.display());
            ConfigDocument::default()
        } else {
            load_document(&ctx.file)?
        };

        let settings = ProviderSettings::load(&paths::settings_file()?)?
            .merge(ProviderSettings::from_table(&config.provider)?);
        let client_config = settings.client_config(&ctx.overrides);
        client_config
            .validate()
            .context("Invalid provider configuration")?;
        log::info!("Using server {}", client_config.base_url());
        let client = Client::new(client_config).context("Failed to create API client")?;

        Ok(Self {
            config,
            provider: provider::provider(),
            client,
            state: StateFile::load(&ctx.state)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_document_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.toml");
        fs::write(&path, "[resource.vault_auth_backend]\nbad = 1\n").unwrap();
        let err = load_document(&path).unwrap_err();
        assert!(format!("{err:#}").contains("main.toml"));

        let missing = load_document(&dir.path().join("nope.toml")).unwrap_err();
        assert!(missing.to_string().contains("Failed to read configuration"));
    }

    #[test]
    fn test_load_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.toml");
        fs::write(
            &path,
            "[provider]\naddress = \"https://vault:8200\"\n\n[resource.vault_identity_entity.alice]\nname = \"alice\"\n",
        )
        .unwrap();
        let doc = load_document(&path).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(
            doc.provider.get("address").and_then(|v| v.as_str()),
            Some("https://vault:8200")
        );
    }
}
