//! The HTTP capability the key fetcher issues requests through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Url;
use tracing::{debug, info, instrument};

use crate::config::GitHubConfig;
use crate::errors::{ConfigError, TransportError};

const GITHUB_API_VERSION_HEADER: &str = "x-github-api-version";

/// Status and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a GET and reports either a response (any status) or a transport
/// failure. Implementations must be safe to share between concurrent
/// mapper invocations.
#[async_trait]
pub trait HttpCapability: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

/// [`HttpCapability`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestHttp {
    http: reqwest::Client,
}

impl ReqwestHttp {
    /// Build a client carrying the GitHub headers and timeout from `config`.
    pub fn new(config: &GitHubConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, header_value("github.user_agent", &config.user_agent)?);
        headers.insert(
            HeaderName::from_static(GITHUB_API_VERSION_HEADER),
            header_value("github.api_version", &config.api_version)?,
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder.build().map_err(|e| ConfigError::InvalidValue {
            field: "github".into(),
            detail: format!("failed to build HTTP client: {}", e),
        })?;

        info!(
            user_agent = %config.user_agent,
            timeout_secs = config.timeout_secs,
            "created GitHub HTTP client"
        );
        Ok(Self { http })
    }

    /// Wrap an already configured client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
        field: field.into(),
        detail: e.to_string(),
    })
}

#[async_trait]
impl HttpCapability for ReqwestHttp {
    #[instrument(skip_all, fields(url = %url))]
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        debug!(status, bytes = body.len(), "received response");
        Ok(HttpResponse { status, body })
    }
}
