use std::fmt;
use std::str::FromStr;

use crate::models::Node;

/// Default identity fields, in priority order
pub const DEFAULT_IDENTITY_KEYS: &[&str] = &["name", "index", "sequence-id", "group-name", "peer-address"];

/// Ordered list of field names used to match records across two sequences.
///
/// The first key (in registry order) present on the override sequence's first
/// element is used for the whole sequence. The registry is plain data and is
/// handed to the engine explicitly, so different callers can carry different
/// registries side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKeys {
    keys: Vec<String>,
}

impl Default for IdentityKeys {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_KEYS.iter().copied())
    }
}

impl IdentityKeys {
    /// Build a registry. Blank and repeated names are dropped.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self { keys: Vec::new() };
        for key in keys {
            registry = registry.with_key(key);
        }
        registry
    }

    /// Append a candidate at the lowest priority
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into().trim().to_string();
        if !key.is_empty() && !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pick the identity key for a sequence from its first element.
    /// Returns None when the element is not a mapping or carries none of the candidates.
    pub fn select(&self, first: &Node) -> Option<&str> {
        let mapping = first.as_mapping()?;
        self.keys
            .iter()
            .find(|k| mapping.contains_key(k))
            .map(String::as_str)
    }
}

impl FromStr for IdentityKeys {
    type Err = std::convert::Infallible;

    /// Parse a comma-separated list, e.g. "name,index,peer-address"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.split(',')))
    }
}

impl fmt::Display for IdentityKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys.join(","))
    }
}
