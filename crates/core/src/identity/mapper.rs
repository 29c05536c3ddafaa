//! The SSH key mapper: fetch a user's GitHub keys and store them on the
//! brokered identity.
//!
//! Every invocation runs config check, fetch, then write. A missing
//! attribute name ends the invocation quietly; a failed fetch fails it
//! without writing anything.

use tracing::{debug, info, instrument, warn};

use super::target::{AttributeValue, IdentityTarget};
use crate::config::{GitHubConfig, MapperConfig, SyncMode};
use crate::errors::{BrokerError, ConfigError};
use crate::github::{HttpCapability, KeyFetcher, ReqwestHttp};

/// Imports public SSH keys from GitHub into a user attribute.
#[derive(Debug, Clone)]
pub struct GitHubSshKeyMapper<H = ReqwestHttp> {
    fetcher: KeyFetcher<H>,
}

impl GitHubSshKeyMapper<ReqwestHttp> {
    /// Create a mapper talking to the API described by `config`.
    pub fn from_config(config: &GitHubConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(KeyFetcher::from_config(config)?))
    }
}

impl<H: HttpCapability> GitHubSshKeyMapper<H> {
    pub fn new(fetcher: KeyFetcher<H>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &KeyFetcher<H> {
        &self.fetcher
    }

    /// Fetch the keys of `target.username()` and store them under the
    /// configured attribute. An empty key list is still written.
    #[instrument(skip_all, fields(mapper = %config.name, username = %target.username()))]
    pub async fn apply(
        &self,
        config: &MapperConfig,
        target: &mut dyn IdentityTarget,
    ) -> Result<(), BrokerError> {
        let attribute = match config.key_attribute() {
            Some(attribute) => attribute,
            None => {
                warn!("attribute is not configured for mapper {}", config.name);
                return Ok(());
            }
        };

        let username = target.username().to_owned();
        let keys = self.fetcher.fetch(&username).await.map_err(|err| {
            warn!(error = %err, "failed to fetch public keys");
            BrokerError::KeyFetch(err)
        })?;

        let count = keys.len();
        AttributeValue::from(keys).write_to(attribute, target)?;
        info!(attribute, count, "imported public keys");
        Ok(())
    }

    /// Hook for a freshly brokered identity: always imports.
    pub async fn preprocess(
        &self,
        config: &MapperConfig,
        context: &mut dyn IdentityTarget,
    ) -> Result<(), BrokerError> {
        self.apply(config, context).await
    }

    /// Hook for an already linked user: imports only on a forced re-sync.
    pub async fn update(
        &self,
        config: &MapperConfig,
        user: &mut dyn IdentityTarget,
        sync_mode: SyncMode,
    ) -> Result<(), BrokerError> {
        if !sync_mode.is_force() {
            debug!(mapper = %config.name, %sync_mode, "skipping key import for linked user");
            return Ok(());
        }
        self.apply(config, user).await
    }
}
