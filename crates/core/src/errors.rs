//! Error types for the SSH key importer.
//!
//! Each stage has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed cause carried by transport and attribute-store errors.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Key fetch errors
// ---------------------------------------------------------------------------

/// A request never produced an HTTP response (connect, TLS, timeout, body
/// read).
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct TransportError {
    context: String,
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let context = if err.is_timeout() {
            "request timed out"
        } else if err.is_connect() {
            "connection failed"
        } else if err.is_body() || err.is_decode() {
            "failed to read response body"
        } else {
            "request failed"
        };
        Self::new(context, err)
    }
}

/// The provider answered, but not with a JSON array of key objects.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The body is not JSON at all.
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The top-level value is not an array.
    #[error("expected a JSON array of keys, found {found}")]
    NotAnArray {
        found: &'static str,
    },

    /// An array element is not an object.
    #[error("key entry {index} is not a JSON object (found {found})")]
    ElementNotObject {
        index: usize,
        found: &'static str,
    },

    /// An array element has no `key` field.
    #[error("key entry {index} has no `key` field")]
    MissingKey {
        index: usize,
    },

    /// The `key` field is present but not a string.
    #[error("key entry {index} has a non-string `key` field (found {found})")]
    KeyNotString {
        index: usize,
        found: &'static str,
    },
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Rejected before any request was made.
    Input,
    /// The request did not complete.
    Transport,
    /// The provider responded with something other than a key list.
    Protocol,
}

/// Errors from fetching a user's public keys.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The username cannot be placed into the endpoint path.
    #[error("invalid provider username '{0}'")]
    InvalidUsername(String),

    /// The configured API base URL cannot be extended with a path.
    #[error("invalid key endpoint base URL '{url}': {detail}")]
    InvalidEndpoint {
        url: String,
        detail: String,
    },

    /// Network-level failure.
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The provider returned a non-success status code.
    #[error("key endpoint {url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body violated the expected shape.
    #[error("malformed response from {url}: {source}")]
    Protocol {
        url: String,
        #[source]
        source: ProtocolError,
    },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::InvalidUsername(_) | Self::InvalidEndpoint { .. } => FetchErrorKind::Input,
            Self::Transport { .. } => FetchErrorKind::Transport,
            Self::Status { .. } | Self::Protocol { .. } => FetchErrorKind::Protocol,
        }
    }
}

// ---------------------------------------------------------------------------
// Broker errors
// ---------------------------------------------------------------------------

/// Failure reported by the host's attribute store.
#[derive(Debug, Error)]
#[error("failed to write user attribute '{attribute}': {source}")]
pub struct AttributeWriteError {
    pub attribute: String,
    #[source]
    pub source: BoxError,
}

impl AttributeWriteError {
    pub fn new(attribute: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            attribute: attribute.into(),
            source: source.into(),
        }
    }
}

/// Errors surfaced to the identity broker from a mapper hook. Any of these
/// should fail the federation flow.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Keys could not be fetched; nothing was written.
    #[error("could not obtain user public keys from github: {0}")]
    KeyFetch(#[from] FetchError),

    /// The host rejected the attribute write.
    #[error(transparent)]
    AttributeWrite(#[from] AttributeWriteError),
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ProtocolError::MissingKey { index: 3 };
        assert_eq!(err.to_string(), "key entry 3 has no `key` field");

        let err = FetchError::Status {
            url: "https://api.github.com/users/ghost/keys".into(),
            status: 404,
            body: "Not Found".into(),
        };
        assert!(err.to_string().contains("HTTP 404"));

        let err = ConfigError::InvalidValue {
            field: "github.api_url".into(),
            detail: "empty".into(),
        };
        assert!(err.to_string().contains("github.api_url"));
    }

    #[test]
    fn test_fetch_error_kind() {
        assert_eq!(
            FetchError::InvalidUsername(String::new()).kind(),
            FetchErrorKind::Input
        );
        let transport = FetchError::Transport {
            url: "u".into(),
            source: TransportError::new("connection failed", "refused"),
        };
        assert_eq!(transport.kind(), FetchErrorKind::Transport);
        let status = FetchError::Status {
            url: "u".into(),
            status: 500,
            body: String::new(),
        };
        assert_eq!(status.kind(), FetchErrorKind::Protocol);
    }

    #[test]
    fn test_broker_error_keeps_cause() {
        let fetch = FetchError::Protocol {
            url: "u".into(),
            source: ProtocolError::NotAnArray { found: "object" },
        };
        let err: BrokerError = fetch.into();
        assert!(err.to_string().starts_with("could not obtain user public keys"));
        let source = err.source().expect("fetch cause");
        assert!(source.to_string().contains("found object"));
    }

    #[test]
    fn test_attribute_write_is_transparent() {
        let err: BrokerError = AttributeWriteError::new("sshKeys", "read-only user").into();
        assert_eq!(
            err.to_string(),
            "failed to write user attribute 'sshKeys': read-only user"
        );
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let err: CoreError = FetchError::InvalidUsername("..".into()).into();
        assert!(matches!(err, CoreError::Fetch(_)));
    }
}
