//! Client configuration.

use crate::error::{Error, Result};
use crate::retry::RetryConfig;
use std::time::Duration;

/// Environment variable holding the server address.
pub const ENV_ADDR: &str = "VAULT_ADDR";

/// Environment variable holding the client token.
pub const ENV_TOKEN: &str = "VAULT_TOKEN";

/// Environment variable holding the namespace.
pub const ENV_NAMESPACE: &str = "VAULT_NAMESPACE";

/// Address used when nothing else is configured.
pub const DEFAULT_ADDRESS: &str = "https://127.0.0.1:8200";

/// Connection settings for the HTTP backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Server address, e.g. `https://vault.example.com:8200`
    pub address: String,
    /// Token sent as `X-Vault-Token`
    pub token: Option<String>,
    /// Namespace sent as `X-Vault-Namespace`
    pub namespace: Option<String>,
    /// Timeout for a whole request
    pub timeout: Duration,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            namespace: None,
            timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a config for an address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Set the token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build a config from `VAULT_ADDR`, `VAULT_TOKEN` and `VAULT_NAMESPACE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay values from the environment onto this config.
    pub fn apply_env(&mut self) {
        if let Some(addr) = non_empty_env(ENV_ADDR) {
            self.address = addr;
        }
        if let Some(token) = non_empty_env(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Some(namespace) = non_empty_env(ENV_NAMESPACE) {
            self.namespace = Some(namespace);
        }
    }

    /// Check that the config can be used to build a backend.
    pub fn validate(&self) -> Result<()> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(Error::Config("address cannot be empty".to_string()));
        }
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(Error::Config(format!(
                "address {address:?} must start with http:// or https://"
            )));
        }
        if self.token.as_deref().is_some_and(str::is_empty) {
            return Err(Error::Config("token cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Address without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.address.trim().trim_end_matches('/')
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.base_url(), DEFAULT_ADDRESS);
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("http://localhost:8200/")
            .token("root")
            .namespace("team-a")
            .timeout(Duration::from_secs(5));
        assert_eq!(config.base_url(), "http://localhost:8200");
        assert_eq!(config.token.as_deref(), Some("root"));
        assert_eq!(config.namespace.as_deref(), Some("team-a"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("localhost:8200").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let config = ClientConfig::new("http://localhost:8200").token("");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
