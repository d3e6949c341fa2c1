//! Error types for Vault API operations.
//!
//! Errors are categorized so the retry layer can decide which failures are
//! transient and callers can give appropriate feedback.

use std::fmt;

/// Result type alias for Vault API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, DNS or TLS failure (transient, retryable).
    Network,
    /// Server-side failure or rate limiting (transient, retryable).
    Server,
    /// The request was rejected as malformed or conflicting.
    InvalidRequest,
    /// Missing or insufficient token.
    Permission,
    /// The path has no handler on the server.
    NotFound,
    /// The response body could not be decoded.
    Format,
    /// Client-side configuration problem.
    Config,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Server)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Server => "Server unavailable",
            Self::InvalidRequest => "Request rejected",
            Self::Permission => "Permission denied",
            Self::NotFound => "No handler for path",
            Self::Format => "Invalid response format",
            Self::Config => "Invalid client configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check VAULT_ADDR and that the server is reachable",
            Self::Server => "The server may be sealed or overloaded, try again",
            Self::InvalidRequest => "Check the resource arguments against the server's rules",
            Self::Permission => "Check VAULT_TOKEN and the policies attached to it",
            Self::NotFound => "Check that the backend is mounted at the expected path",
            Self::Format => "The server returned an unexpected payload",
            Self::Config => "Check the provider configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the Vault API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced an HTTP response.
    #[error("HTTP request failed: {message}")]
    Transport {
        /// Error message.
        message: String,
    },

    /// The server answered with an error status.
    #[error("{}", format_api_error(*status, errors))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Messages from the `errors` array of the response body.
        errors: Vec<String>,
    },

    /// Invalid response body.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Invalid client configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

fn format_api_error(status: u16, errors: &[String]) -> String {
    if errors.is_empty() {
        format!("Error making API request.\n\nCode: {status}")
    } else {
        let lines: Vec<String> = errors.iter().map(|e| format!("\t* {e}")).collect();
        format!(
            "Error making API request.\n\nCode: {status}. Errors:\n\n{}",
            lines.join("\n")
        )
    }
}

impl Error {
    /// Create an API error from a status and messages.
    pub fn api(status: u16, errors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Api {
            status,
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// HTTP status code, if the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Network,
            Error::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Permission,
                404 | 405 => ErrorCategory::NotFound,
                429 | 500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::InvalidRequest,
            },
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Api {
                status: code,
                errors: Vec::new(),
            },
            other => Self::Transport {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
