//! GitHub SSH key importer for identity brokering.
//!
//! When a user federates through GitHub, the broker runs
//! [`GitHubSshKeyMapper`], which fetches the user's public SSH keys from
//! `GET /users/{username}/keys` and stores them in a configured user
//! attribute.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the [`testutil`] module with an in-memory
//!   identity and a scripted HTTP capability.

pub mod config;
pub mod errors;
pub mod github;
pub mod identity;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

// Re-exports for convenience.
pub use config::{AppConfig, GitHubConfig, MapperConfig, SyncMode};
pub use errors::{BrokerError, CoreError, FetchError};
pub use github::{HttpCapability, KeyFetcher, ReqwestHttp, SshKeyList};
pub use identity::{GitHubSshKeyMapper, IdentityProviderMapper, IdentityTarget};
