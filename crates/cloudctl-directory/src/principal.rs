use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A concrete identity, normalized to trimmed lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(identity: impl AsRef<str>) -> Self {
        Self(identity.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Principal {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_normalization() {
        assert_eq!(Principal::new("  Alice@Example.COM "), Principal::new("alice@example.com"));
        assert_eq!(Principal::from("Bob@x.io").as_str(), "bob@x.io");
    }

    #[test]
    fn test_principal_deserialize_normalizes() {
        let p: Principal = serde_json::from_str("\"CAROL@example.com\"").unwrap();
        assert_eq!(p.to_string(), "carol@example.com");
    }
}
