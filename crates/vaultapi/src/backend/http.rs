//! HTTP backend for a real server.
//!
//! Requests go to `<address>/v1/<path>` with the token in `X-Vault-Token`.
//! LIST is sent as `GET ?list=true`, which every server version accepts.

use crate::backend::Backend;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::types::{Operation, Payload, Secret};
use serde::Deserialize;

/// Blocking HTTP backend.
///
/// # Example
///
/// ```no_run
/// use vaultapi::backend::{Backend, HttpBackend};
/// use vaultapi::ClientConfig;
///
/// let backend = HttpBackend::new(ClientConfig::from_env()).unwrap();
/// let mounts = backend.read("sys/auth").unwrap();
/// ```
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    config: ClientConfig,
}

impl HttpBackend {
    /// Create a backend from a validated config.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Ok(Self { agent, config })
    }

    /// The configuration this backend was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, op: Operation, path: &str) -> String {
        let base = format!("{}/v1/{}", self.config.base_url(), escape_path(path));
        if op == Operation::List {
            format!("{base}?list=true")
        } else {
            base
        }
    }

    fn with_headers<B>(&self, mut request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        if let Some(token) = &self.config.token {
            request = request.header("X-Vault-Token", token);
        }
        if let Some(namespace) = &self.config.namespace {
            request = request.header("X-Vault-Namespace", namespace);
        }
        request.header("X-Vault-Request", "true")
    }

    fn send(&self, op: Operation, path: &str, body: &Payload) -> Result<Option<Secret>> {
        let what = format!("{op} {path}");
        with_retry(&self.config.retry, &what, || self.send_once(op, path, body))
    }

    fn send_once(&self, op: Operation, path: &str, body: &Payload) -> Result<Option<Secret>> {
        let url = self.url(op, path);
        log::trace!("{} {}", op.http_method(), url);

        let mut response = match op {
            Operation::Read | Operation::List => self.with_headers(self.agent.get(&url)).call()?,
            Operation::Delete => self.with_headers(self.agent.delete(&url)).call()?,
            Operation::Write => self.with_headers(self.agent.put(&url)).send_json(body)?,
        };

        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        decode_response(op, status, &text)
    }
}

impl Backend for HttpBackend {
    fn read(&self, path: &str) -> Result<Option<Secret>> {
        self.send(Operation::Read, path, &Payload::new())
    }

    fn list(&self, path: &str) -> Result<Option<Secret>> {
        self.send(Operation::List, path, &Payload::new())
    }

    fn write(&self, path: &str, data: &Payload) -> Result<Option<Secret>> {
        self.send(Operation::Write, path, data)
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.send(Operation::Delete, path, &Payload::new()).map(|_| ())
    }
}

/// Percent-encode each segment of a logical path, keeping `/` separators.
fn escape_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Option<Vec<String>>,
}

/// Map a status and body to the logical result of an operation.
///
/// A 404 on anything but a write means "nothing there", unless the body still
/// carries data or warnings.
pub(crate) fn decode_response(op: Operation, status: u16, body: &str) -> Result<Option<Secret>> {
    match status {
        200..=299 => {
            if body.trim().is_empty() {
                return Ok(None);
            }
            let secret: Secret = serde_json::from_str(body)?;
            Ok(Some(secret))
        }
        404 if op != Operation::Write => Ok(serde_json::from_str::<Secret>(body)
            .ok()
            .filter(|s| !s.data.is_empty() || !s.warnings.is_empty())),
        _ => {
            let errors = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.errors)
                .unwrap_or_default();
            Err(Error::Api { status, errors })
        }
    }
}
