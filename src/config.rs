//! Provider settings: where the server is and how to talk to it.
//!
//! Sources, lowest priority first:
//! 1. `config.toml` in the config dir (`[provider]` table)
//! 2. `[provider]` table of the configuration document
//! 3. `VAULT_ADDR` / `VAULT_TOKEN` / `VAULT_NAMESPACE`
//! 4. Command-line flags

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use vaultapi::{ClientConfig, RetryConfig};

/// `[provider]` table, as found in either file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    pub address: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
    /// Whole-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Attempts per request, including the first
    pub max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    provider: ProviderSettings,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub address: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
}

impl ProviderSettings {
    /// Load the `[provider]` table of a settings file; a missing file is empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Settings file {} does not exist", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let file: SettingsFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(file.provider)
    }

    /// Parse the `[provider]` table of a configuration document.
    pub fn from_table(table: &toml::Table) -> Result<Self> {
        toml::Value::Table(table.clone())
            .try_into()
            .context("Invalid [provider] table in configuration")
    }

    /// Values in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            address: other.address.or(self.address),
            token: other.token.or(self.token),
            namespace: other.namespace.or(self.namespace),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            max_retries: other.max_retries.or(self.max_retries),
        }
    }

    /// Final client config: these settings, then the environment, then flags.
    pub fn client_config(&self, overrides: &Overrides) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(address) = &self.address {
            config.address = address.clone();
        }
        config.token = self.token.clone();
        config.namespace = self.namespace.clone();
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = self.max_retries {
            config.retry = RetryConfig {
                max_attempts: attempts.max(1),
                ..RetryConfig::default()
            };
        }

        config.apply_env();

        if let Some(address) = &overrides.address {
            config.address = address.clone();
        }
        if let Some(token) = &overrides.token {
            config.token = Some(token.clone());
        }
        if let Some(namespace) = &overrides.namespace {
            config.namespace = Some(namespace.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ProviderSettings::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, ProviderSettings::default());
    }

    #[test]
    fn test_load_provider_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[provider]\naddress = \"https://vault.internal:8200\"\nnamespace = \"team\"\ntimeout_secs = 5"
        )
        .unwrap();

        let settings = ProviderSettings::load(file.path()).unwrap();
        assert_eq!(settings.address.as_deref(), Some("https://vault.internal:8200"));
        assert_eq!(settings.namespace.as_deref(), Some("team"));
        assert_eq!(settings.timeout_secs, Some(5));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[provider]\nadress = \"typo\"").unwrap();
        let err = ProviderSettings::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("adress"));
    }

    #[test]
    fn test_merge_prefers_later_source() {
        let user = ProviderSettings {
            address: Some("https://user:8200".into()),
            token: Some("user-token".into()),
            ..Default::default()
        };
        let document = ProviderSettings {
            address: Some("https://doc:8200".into()),
            ..Default::default()
        };
        let merged = user.merge(document);
        assert_eq!(merged.address.as_deref(), Some("https://doc:8200"));
        assert_eq!(merged.token.as_deref(), Some("user-token"));
    }

    #[test]
    fn test_from_table() {
        let table: toml::Table = toml::from_str("address = \"https://doc:8200\"\nmax_retries = 0").unwrap();
        let settings = ProviderSettings::from_table(&table).unwrap();
        assert_eq!(settings.address.as_deref(), Some("https://doc:8200"));

        let config = settings.client_config(&Overrides {
            address: Some("https://flag:8200".into()),
            ..Default::default()
        });
        assert_eq!(config.address, "https://flag:8200");
        assert_eq!(config.retry.max_attempts, 1);
    }
}
