//! Addresses of provider configurations within a module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The address of a provider configuration, relative to its module.
///
/// This is the identity used to match provider blocks with requirements and
/// with the provider references of resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderAddr {
    /// The provider type name, e.g. `aws`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// The configuration alias; empty for the default configuration.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
}

impl ProviderAddr {
    /// Create an address.
    pub fn new(type_name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            alias: alias.into(),
        }
    }

    /// The address of the default (unaliased) configuration of a type.
    pub fn default_for(type_name: impl Into<String>) -> Self {
        Self::new(type_name, "")
    }

    /// Whether this is the default configuration of its type.
    pub fn is_default(&self) -> bool {
        self.alias.is_empty()
    }

    /// The key identifying this configuration within its module's provider
    /// table: `type` for the default configuration, `type.alias` otherwise.
    pub fn module_unique_key(&self) -> String {
        if self.alias.is_empty() {
            self.type_name.clone()
        } else {
            format!("{}.{}", self.type_name, self.alias)
        }
    }
}

impl fmt::Display for ProviderAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider.{}", self.module_unique_key())
    }
}

/// A reference to a provider configuration, as written in the `provider`
/// argument of a resource or the `providers` map of a module call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderRef {
    /// The provider type name.
    pub name: String,
    /// The alias; empty when the default configuration is referenced.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
}

impl From<ProviderAddr> for ProviderRef {
    fn from(addr: ProviderAddr) -> Self {
        Self {
            name: addr.type_name,
            alias: addr.alias,
        }
    }
}

impl From<ProviderRef> for ProviderAddr {
    fn from(r: ProviderRef) -> Self {
        Self {
            type_name: r.name,
            alias: r.alias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_module_unique_key() {
        assert_eq!(ProviderAddr::default_for("aws").module_unique_key(), "aws");
        assert_eq!(ProviderAddr::new("aws", "west").module_unique_key(), "aws.west");
    }

    #[test]
    fn test_module_unique_key_is_distinct() {
        let addrs = [
            ProviderAddr::default_for("aws"),
            ProviderAddr::new("aws", "west"),
            ProviderAddr::new("aws", "east"),
            ProviderAddr::default_for("google"),
            ProviderAddr::new("google", "west"),
            ProviderAddr::new("aws", "aws"),
        ];
        let keys: HashSet<_> = addrs.iter().map(ProviderAddr::module_unique_key).collect();
        assert_eq!(keys.len(), addrs.len());

        let same = ProviderAddr::new("aws", "west");
        assert_eq!(same.module_unique_key(), addrs[1].module_unique_key());
    }

    #[test]
    fn test_display() {
        assert_eq!(ProviderAddr::default_for("aws").to_string(), "provider.aws");
        assert_eq!(ProviderAddr::new("aws", "west").to_string(), "provider.aws.west");
    }

    #[test]
    fn test_provider_ref_json() {
        let unaliased = ProviderRef::from(ProviderAddr::default_for("aws"));
        assert_eq!(serde_json::to_value(&unaliased).unwrap(), json!({"name": "aws"}));

        let aliased = ProviderRef::from(ProviderAddr::new("aws", "west"));
        assert_eq!(
            serde_json::to_value(&aliased).unwrap(),
            json!({"name": "aws", "alias": "west"})
        );

        let back: ProviderRef = serde_json::from_value(json!({"name": "aws"})).unwrap();
        assert_eq!(ProviderAddr::from(back), ProviderAddr::default_for("aws"));
    }

    #[test]
    fn test_addr_json() {
        let addr = ProviderAddr::new("aws", "west");
        assert_eq!(
            serde_json::to_value(&addr).unwrap(),
            json!({"type": "aws", "alias": "west"})
        );
        assert!(ProviderAddr::default_for("aws").is_default());
    }
}
