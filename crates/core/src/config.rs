//! Configuration for the SSH key importer.
//!
//! Two layers:
//! - [`AppConfig`]: operator TOML file describing how to reach the GitHub
//!   API (base URL, headers, timeout).
//! - [`MapperConfig`]: per-mapper settings handed over by the identity
//!   broker as an untyped string map.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use reqwest::header::HeaderValue;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;

/// Config map key holding the target user attribute name.
pub const CONF_KEY_ATTRIBUTE: &str = "keyAttribute";

/// Public GitHub REST API root.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level operator configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// How the key fetcher talks to the GitHub REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API root, e.g. `https://api.github.com` or
    /// `https://ghe.example.com/api/v3`.
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// `User-Agent` header; GitHub rejects requests without one.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Value of the `X-GitHub-Api-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Whole-request timeout in seconds. `0` disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_github_api_url() -> String {
    DEFAULT_GITHUB_API_URL.into()
}
fn default_user_agent() -> String {
    concat!("ghsshkeys/", env!("CARGO_PKG_VERSION")).into()
}
fn default_api_version() -> String {
    "2022-11-28".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            user_agent: default_user_agent(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GitHubConfig {
    /// Validate the API URL and header values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidValue {
            field: "github.api_url".into(),
            detail: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url".into(),
                detail: format!("'{}' is not an http(s) base URL", self.api_url),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "github.user_agent".into(),
                detail: "must not be empty".into(),
            });
        }
        check_header_value("github.user_agent", &self.user_agent)?;
        check_header_value("github.api_version", &self.api_version)?;

        Ok(())
    }
}

fn check_header_value(field: &str, value: &str) -> Result<(), ConfigError> {
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidValue {
            field: field.into(),
            detail: e.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a TOML file on disk.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        debug!(api_url = %config.github.api_url, "configuration parsed");
        Ok(config)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.github.validate()
    }
}

// ---------------------------------------------------------------------------
// Mapper config
// ---------------------------------------------------------------------------

/// Settings of one configured mapper instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapperConfig {
    /// Instance name chosen by the operator; used in diagnostics.
    pub name: String,

    /// Raw attribute name as configured, untrimmed.
    pub key_attribute: Option<String>,
}

impl MapperConfig {
    pub fn new(name: impl Into<String>, key_attribute: Option<String>) -> Self {
        Self {
            name: name.into(),
            key_attribute,
        }
    }

    /// Build from the broker's untyped config map.
    pub fn from_map(name: impl Into<String>, config: &HashMap<String, String>) -> Self {
        Self::new(name, config.get(CONF_KEY_ATTRIBUTE).cloned())
    }

    /// The trimmed attribute name, or `None` when absent or blank.
    pub fn key_attribute(&self) -> Option<&str> {
        self.key_attribute
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// How a mapper treats users that are already linked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncMode {
    /// Behave as the mapper did before sync modes existed.
    #[default]
    Legacy,
    /// Import on first login only.
    Import,
    /// Re-import on every login, overwriting previous values.
    Force,
    /// Use the identity provider's default mode.
    Inherit,
}

impl SyncMode {
    pub fn is_force(self) -> bool {
        self == Self::Force
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "LEGACY"),
            Self::Import => write!(f, "IMPORT"),
            Self::Force => write!(f, "FORCE"),
            Self::Inherit => write!(f, "INHERIT"),
        }
    }
}

impl FromStr for SyncMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LEGACY" => Ok(Self::Legacy),
            "IMPORT" => Ok(Self::Import),
            "FORCE" => Ok(Self::Force),
            "INHERIT" => Ok(Self::Inherit),
            _ => Err(ConfigError::InvalidValue {
                field: "syncMode".into(),
                detail: format!("unknown sync mode '{}'", s),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
[github]
api_url = "https://ghe.example.com/api/v3"
user_agent = "acme-broker/2.1"
api_version = "2022-11-28"
timeout_secs = 5
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_toml_str(sample_toml()).unwrap();
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.user_agent, "acme-broker/2.1");
        assert_eq!(config.github.timeout_secs, 5);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.github.api_url, DEFAULT_GITHUB_API_URL);
        assert!(config.github.user_agent.starts_with("ghsshkeys/"));
        assert_eq!(config.github.api_version, "2022-11-28");
        assert_eq!(config.github.timeout_secs, 30);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghsshkeys.toml");
        std::fs::write(&path, sample_toml()).unwrap();
        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.github.user_agent, "acme-broker/2.1");
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/ghsshkeys.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = AppConfig::from_toml_str("[github\napi_url = 1");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_api_url() {
        for api_url in ["not a url", "ftp://files.example.com", "mailto:keys@example.com"] {
            let config = GitHubConfig {
                api_url: api_url.into(),
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidValue { ref field, .. }) if field == "github.api_url"),
                "{api_url} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_empty_user_agent() {
        let config = GitHubConfig {
            user_agent: "   ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mapper_config_from_map_trims() {
        let mut map = HashMap::new();
        map.insert(CONF_KEY_ATTRIBUTE.to_string(), "  sshPublicKeys \n".to_string());
        let config = MapperConfig::from_map("github keys", &map);
        assert_eq!(config.name, "github keys");
        assert_eq!(config.key_attribute(), Some("sshPublicKeys"));
    }

    #[test]
    fn test_mapper_config_blank_is_none() {
        let empty = HashMap::new();
        assert_eq!(MapperConfig::from_map("m", &empty).key_attribute(), None);

        for blank in ["", "   ", "\t\n"] {
            let config = MapperConfig::new("m", Some(blank.to_string()));
            assert_eq!(config.key_attribute(), None);
        }
    }

    #[test]
    fn test_sync_mode_parse() {
        assert_eq!("FORCE".parse::<SyncMode>().unwrap(), SyncMode::Force);
        assert_eq!(" import ".parse::<SyncMode>().unwrap(), SyncMode::Import);
        assert_eq!(SyncMode::default(), SyncMode::Legacy);
        assert!("sometimes".parse::<SyncMode>().is_err());
        assert_eq!(SyncMode::Inherit.to_string(), "INHERIT");
        assert!(SyncMode::Force.is_force());
        assert!(!SyncMode::Import.is_force());
    }
}
