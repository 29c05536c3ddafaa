//! Mapping GitHub SSH keys onto brokered identities.
//!
//! - [`target`]: the host-owned identity the keys are written onto.
//! - [`mapper`]: the fetch-and-write routine and its two lifecycle hooks.
//! - [`provider`]: the registration contract the broker discovers mappers by.

pub mod mapper;
pub mod provider;
pub mod target;

pub use mapper::GitHubSshKeyMapper;
pub use provider::{ConfigProperty, DisplayMetadata, IdentityProviderMapper, PropertyType};
pub use target::{AttributeValue, IdentityTarget};
