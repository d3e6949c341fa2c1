//! Backend trait and implementations for talking to the logical API.
//!
//! The [`Backend`] trait abstracts the transport so adapters can be exercised
//! without a server. [`http::HttpBackend`] talks to a real server over HTTP;
//! [`mock::MockBackend`] keeps an in-memory model of the endpoints the
//! provider uses.
//!
//! # Testing
//!
//! ```
//! use vaultapi::backend::{Backend, MockBackend};
//! use serde_json::json;
//!
//! let mock = MockBackend::new();
//! let data = json!({"type": "github"}).as_object().unwrap().clone();
//! mock.write("sys/auth/github", &data).unwrap();
//!
//! let mounts = mock.read("sys/auth").unwrap().unwrap();
//! assert!(mounts.data.contains_key("github/"));
//! ```

pub mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::{MockBackend, RecordedRequest};

use crate::error::Result;
use crate::types::{Payload, Secret};

/// Transport for logical API calls.
///
/// Paths are relative to `/v1/` and carry no leading slash. A `None` result
/// from `read` or `list` means the server reported nothing at that path.
pub trait Backend: Send + Sync {
    /// Read the payload at a path.
    fn read(&self, path: &str) -> Result<Option<Secret>>;

    /// List keys under a path.
    fn list(&self, path: &str) -> Result<Option<Secret>>;

    /// Write a payload to a path. Returns the response body if the server sent one.
    fn write(&self, path: &str, data: &Payload) -> Result<Option<Secret>>;

    /// Delete the payload at a path. Deleting an absent path succeeds.
    fn delete(&self, path: &str) -> Result<()>;
}
