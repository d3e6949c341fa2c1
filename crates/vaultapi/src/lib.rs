//! # vaultapi
//!
//! Blocking client for the Vault logical HTTP API.
//!
//! The client exposes the four logical operations (read, list, write,
//! delete) over a pluggable [`backend::Backend`]. The HTTP backend talks to a
//! real server; [`MockBackend`] keeps an in-memory model for tests.
//!
//! ## Example
//!
//! ```no_run
//! use vaultapi::{Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::from_env()).expect("invalid config");
//! if let Some(mounts) = client.read("sys/auth").unwrap() {
//!     for path in mounts.data.keys() {
//!         println!("{path}");
//!     }
//! }
//! ```
//!
//! ## Testing
//!
//! ```
//! use vaultapi::{Client, MockBackend};
//!
//! let mock = MockBackend::new();
//! let client = Client::with_backend(mock.clone());
//! assert!(client.read("auth/aws/config/identity").unwrap().is_none());
//! assert_eq!(mock.requests().len(), 1);
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use backend::MockBackend;
pub use config::ClientConfig;
pub use error::{Error, ErrorCategory, Result};
pub use retry::RetryConfig;
pub use types::{Operation, Payload, Secret};

use backend::{Backend, HttpBackend};

/// High-level client for logical operations.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client talking HTTP to the configured server.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_backend(HttpBackend::new(config)?))
    }

    /// Create a client with a custom backend (for testing).
    pub fn with_backend<B: Backend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Read the payload at a path. `None` when nothing is there.
    pub fn read(&self, path: &str) -> Result<Option<Secret>> {
        log::debug!("read {path}");
        self.backend.read(path)
    }

    /// List keys under a path. `None` when the path has no children.
    pub fn list(&self, path: &str) -> Result<Option<Secret>> {
        log::debug!("list {path}");
        self.backend.list(path)
    }

    /// Write a payload to a path.
    pub fn write(&self, path: &str, data: &Payload) -> Result<Option<Secret>> {
        log::debug!("write {path}");
        self.backend.write(path, data)
    }

    /// Delete the payload at a path.
    pub fn delete(&self, path: &str) -> Result<()> {
        log::debug!("delete {path}");
        self.backend.delete(path)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_delegates_to_backend() {
        let mock = MockBackend::new();
        let client = Client::with_backend(mock.clone());

        let data = json!({"value": "x"}).as_object().cloned().unwrap();
        client.write("secret/a", &data).unwrap();
        assert_eq!(
            client.read("secret/a").unwrap().unwrap().get_str("value"),
            Some("x")
        );
        assert_eq!(client.list("secret").unwrap().unwrap().list_keys(), vec!["a"]);
        client.delete("secret/a").unwrap();
        assert!(client.read("secret/a").unwrap().is_none());

        let ops: Vec<Operation> = mock.requests().iter().map(|r| r.operation).collect();
        assert_eq!(
            ops,
            vec![
                Operation::Write,
                Operation::Read,
                Operation::List,
                Operation::Delete,
                Operation::Read
            ]
        );
    }

    #[test]
    fn test_new_validates_config() {
        assert!(Client::new(ClientConfig::new("not-a-url")).is_err());
        assert!(Client::new(ClientConfig::new("http://127.0.0.1:8200").token("t")).is_ok());
    }
}
