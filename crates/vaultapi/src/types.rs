//! Core types for the Vault API client.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Flat request/response payload: string keys to heterogeneous values.
pub type Payload = Map<String, Value>;

/// A response envelope from the logical API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lease_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lease_duration: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub renewable: bool,
    /// Response data; `null` on the wire becomes an empty map
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Payload,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
}

impl Secret {
    /// Create a secret carrying only data.
    pub fn with_data(data: Payload) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// Get a raw value from the data map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a string value from the data map.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Keys of a LIST response (`data.keys`).
    pub fn list_keys(&self) -> Vec<String> {
        self.data
            .get("keys")
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Logical operation performed against a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    Delete,
    List,
}

impl Operation {
    /// HTTP method used for this operation.
    pub fn http_method(&self) -> &'static str {
        match self {
            Self::Read | Self::List => "GET",
            Self::Write => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Delete => write!(f, "delete"),
            Self::List => write!(f, "list"),
        }
    }
}
