//! Fetching a user's public SSH keys from `GET /users/{username}/keys`.

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::http::{HttpCapability, ReqwestHttp};
use crate::config::GitHubConfig;
use crate::errors::{ConfigError, FetchError, ProtocolError};

/// Longest response excerpt kept in a [`FetchError::Status`].
const MAX_ERROR_BODY: usize = 256;

/// Public keys in the order the provider listed them. Neither deduplicated
/// nor validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshKeyList(Vec<String>);

impl SshKeyList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for SshKeyList {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

/// Fetches public keys through an [`HttpCapability`].
#[derive(Debug, Clone)]
pub struct KeyFetcher<H = ReqwestHttp> {
    http: H,
    api_url: Url,
}

impl KeyFetcher<ReqwestHttp> {
    /// Build a fetcher with a `reqwest` client configured from `config`.
    pub fn from_config(config: &GitHubConfig) -> Result<Self, ConfigError> {
        let http = ReqwestHttp::new(config)?;
        Self::new(http, &config.api_url)
    }
}

impl<H: HttpCapability> KeyFetcher<H> {
    pub fn new(http: H, api_url: &str) -> Result<Self, ConfigError> {
        let api_url = Url::parse(api_url).map_err(|e| ConfigError::InvalidValue {
            field: "github.api_url".into(),
            detail: e.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url".into(),
                detail: format!("'{}' cannot carry a path", api_url),
            });
        }
        Ok(Self { http, api_url })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The key endpoint for `username`, which becomes exactly one
    /// percent-encoded path segment.
    pub fn keys_url(&self, username: &str) -> Result<Url, FetchError> {
        // Dot segments would be dropped by the URL serializer.
        if username.is_empty() || username == "." || username == ".." {
            return Err(FetchError::InvalidUsername(username.to_string()));
        }

        let mut url = self.api_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidEndpoint {
                url: self.api_url.to_string(),
                detail: "URL cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(["users", username, "keys"]);
        Ok(url)
    }

    /// Fetch and parse the public keys of `username`. Issues exactly one
    /// request; any failure is returned, never skipped over.
    #[instrument(skip(self))]
    pub async fn fetch(&self, username: &str) -> Result<SshKeyList, FetchError> {
        let url = self.keys_url(username)?;
        debug!(url = %url, "fetching public keys");

        let resp = self
            .http
            .get(&url)
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !resp.is_success() {
            warn!(url = %url, status = resp.status, "key endpoint returned an error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status,
                body: body_excerpt(&resp.body),
            });
        }

        let keys = parse_keys(&resp.body).map_err(|source| FetchError::Protocol {
            url: url.to_string(),
            source,
        })?;
        debug!(count = keys.len(), "parsed public keys");
        Ok(keys)
    }
}

/// Parse a `/users/{username}/keys` body: a JSON array of objects, each
/// with a string `key`. Other fields are ignored.
///
/// A top-level object is rejected like any other non-array value.
pub fn parse_keys(body: &[u8]) -> Result<SshKeyList, ProtocolError> {
    let value: Value = serde_json::from_slice(body)?;
    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(ProtocolError::NotAnArray {
                found: json_type(&other),
            })
        }
    };

    let mut keys = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let object = entry.as_object().ok_or(ProtocolError::ElementNotObject {
            index,
            found: json_type(entry),
        })?;
        match object.get("key") {
            Some(Value::String(key)) => keys.push(key.clone()),
            Some(other) => {
                return Err(ProtocolError::KeyNotString {
                    index,
                    found: json_type(other),
                })
            }
            None => return Err(ProtocolError::MissingKey { index }),
        }
    }
    Ok(SshKeyList(keys))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
