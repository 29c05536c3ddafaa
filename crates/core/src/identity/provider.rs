//! Registration contract between identity-provider mappers and the broker.

use async_trait::async_trait;
use serde::Serialize;

use super::mapper::GitHubSshKeyMapper;
use super::target::IdentityTarget;
use crate::config::{MapperConfig, SyncMode, CONF_KEY_ATTRIBUTE};
use crate::errors::BrokerError;
use crate::github::HttpCapability;

/// Mapper type identifier registered with the broker.
pub const MAPPER_ID: &str = "github-ssh-key-mapper";

/// Identity provider types the mapper can be attached to.
pub const COMPATIBLE_PROVIDERS: &[&str] = &["github"];

/// Labels the broker's admin console shows for a mapper type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMetadata {
    pub display_type: &'static str,
    pub display_category: &'static str,
    pub help_text: &'static str,
}

/// Input widget type of a config property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyType {
    String,
}

/// One operator-editable setting of a mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigProperty {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

/// A pluggable unit the broker runs while federating an external identity.
#[async_trait]
pub trait IdentityProviderMapper: Send + Sync {
    fn id(&self) -> &'static str;

    fn display_metadata(&self) -> DisplayMetadata;

    fn config_schema(&self) -> Vec<ConfigProperty>;

    fn compatible_providers(&self) -> &'static [&'static str];

    fn is_compatible_with(&self, provider_id: &str) -> bool {
        self.compatible_providers()
            .iter()
            .any(|provider| *provider == provider_id)
    }

    /// Called for an identity that has no local user yet.
    async fn on_preprocess(
        &self,
        config: &MapperConfig,
        context: &mut dyn IdentityTarget,
    ) -> Result<(), BrokerError>;

    /// Called for an identity already linked to a local user.
    async fn on_update(
        &self,
        config: &MapperConfig,
        user: &mut dyn IdentityTarget,
        sync_mode: SyncMode,
    ) -> Result<(), BrokerError>;
}

#[async_trait]
impl<H: HttpCapability> IdentityProviderMapper for GitHubSshKeyMapper<H> {
    fn id(&self) -> &'static str {
        MAPPER_ID
    }

    fn display_metadata(&self) -> DisplayMetadata {
        DisplayMetadata {
            display_type: "SSH Keys Importer",
            display_category: "SSH Keys Importer",
            help_text: "Import user SSH keys into the specified user attribute.",
        }
    }

    fn config_schema(&self) -> Vec<ConfigProperty> {
        vec![ConfigProperty {
            name: CONF_KEY_ATTRIBUTE,
            label: "User Attribute Name",
            help_text: "User attribute name to store the SSH public keys into.",
            property_type: PropertyType::String,
        }]
    }

    fn compatible_providers(&self) -> &'static [&'static str] {
        COMPATIBLE_PROVIDERS
    }

    async fn on_preprocess(
        &self,
        config: &MapperConfig,
        context: &mut dyn IdentityTarget,
    ) -> Result<(), BrokerError> {
        self.preprocess(config, context).await
    }

    async fn on_update(
        &self,
        config: &MapperConfig,
        user: &mut dyn IdentityTarget,
        sync_mode: SyncMode,
    ) -> Result<(), BrokerError> {
        self.update(config, user, sync_mode).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::github::KeyFetcher;
    use crate::testutil::{InMemoryIdentity, StubHttp};

    fn registered(http: StubHttp) -> Arc<dyn IdentityProviderMapper> {
        let fetcher = KeyFetcher::new(http, "https://api.github.com").unwrap();
        Arc::new(GitHubSshKeyMapper::new(fetcher))
    }

    #[test]
    fn test_registration_metadata() {
        let mapper = registered(StubHttp::ok("[]"));
        assert_eq!(mapper.id(), "github-ssh-key-mapper");

        let display = mapper.display_metadata();
        assert_eq!(display.display_type, "SSH Keys Importer");
        assert_eq!(display.display_category, "SSH Keys Importer");
        assert_eq!(
            display.help_text,
            "Import user SSH keys into the specified user attribute."
        );

        let schema = mapper.config_schema();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].name, "keyAttribute");
        assert_eq!(schema[0].label, "User Attribute Name");
    }

    #[test]
    fn test_compatibility() {
        let mapper = registered(StubHttp::ok("[]"));
        assert!(mapper.is_compatible_with("github"));
        assert!(!mapper.is_compatible_with("gitlab"));
        assert!(!mapper.is_compatible_with("oidc"));
    }

    #[test]
    fn test_schema_serializes_for_console() {
        let mapper = registered(StubHttp::ok("[]"));
        let json = serde_json::to_value(mapper.config_schema()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "name": "keyAttribute",
                "label": "User Attribute Name",
                "helpText": "User attribute name to store the SSH public keys into.",
                "type": "String"
            }])
        );
    }

    #[tokio::test]
    async fn test_hooks_through_trait_object() {
        let http = StubHttp::ok(r#"[{"key":"ssh-ed25519 AAA"}]"#);
        let mapper = registered(http.clone());

        let mut host_config = HashMap::new();
        host_config.insert("keyAttribute".to_string(), "sshKeys".to_string());
        let config = MapperConfig::from_map("github keys", &host_config);

        let mut context = InMemoryIdentity::new("octocat");
        mapper.on_preprocess(&config, &mut context).await.unwrap();
        assert_eq!(context.attribute("sshKeys").unwrap(), ["ssh-ed25519 AAA"]);

        let mut user = InMemoryIdentity::new("octocat");
        mapper
            .on_update(&config, &mut user, SyncMode::Import)
            .await
            .unwrap();
        assert!(user.attribute("sshKeys").is_none());
        assert_eq!(http.calls(), 1);
    }
}
