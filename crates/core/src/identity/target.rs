//! The host-owned identity a mapper writes attributes onto.

use crate::errors::AttributeWriteError;
use crate::github::SshKeyList;

/// A brokered identity context (before linking) or a local user record
/// (after linking). Owned by the identity broker; mappers only set
/// attributes on it. Setting an attribute replaces any previous value under
/// that name.
pub trait IdentityTarget: Send + Sync {
    /// Username at the external identity provider.
    fn username(&self) -> &str;

    fn set_attribute_list(
        &mut self,
        name: &str,
        values: Vec<String>,
    ) -> Result<(), AttributeWriteError>;

    fn set_attribute_single(&mut self, name: &str, value: String)
        -> Result<(), AttributeWriteError>;
}

/// Value written under the configured attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Multi-valued attribute, order preserved.
    List(Vec<String>),
    /// Single-valued attribute.
    Single(String),
}

impl AttributeValue {
    /// Write through the setter matching this value's shape.
    pub fn write_to(
        self,
        name: &str,
        target: &mut dyn IdentityTarget,
    ) -> Result<(), AttributeWriteError> {
        match self {
            Self::List(values) => target.set_attribute_list(name, values),
            Self::Single(value) => target.set_attribute_single(name, value),
        }
    }
}

impl From<SshKeyList> for AttributeValue {
    fn from(keys: SshKeyList) -> Self {
        Self::List(keys.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{InMemoryIdentity, WriteKind};

    #[test]
    fn test_list_value_uses_list_setter() {
        let mut user = InMemoryIdentity::new("octocat");
        AttributeValue::List(vec!["a".into(), "b".into()])
            .write_to("sshKeys", &mut user)
            .unwrap();
        assert_eq!(user.attribute("sshKeys"), Some(&["a".to_string(), "b".to_string()][..]));
        assert_eq!(user.writes()[0].kind, WriteKind::List);
    }

    #[test]
    fn test_single_value_uses_single_setter() {
        let mut user = InMemoryIdentity::new("octocat");
        AttributeValue::Single("ssh-ed25519 AAA".into())
            .write_to("sshKey", &mut user)
            .unwrap();
        assert_eq!(user.single_attribute("sshKey"), Some("ssh-ed25519 AAA"));
        assert_eq!(user.writes()[0].kind, WriteKind::Single);
    }

    #[test]
    fn test_key_list_converts_to_list() {
        let keys = SshKeyList::from(vec!["k1".to_string()]);
        assert_eq!(
            AttributeValue::from(keys),
            AttributeValue::List(vec!["k1".to_string()])
        );
    }
}
