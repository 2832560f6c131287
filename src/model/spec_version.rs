//! `CycloneDX` specification versions and the fields each one allows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported `CycloneDX` specification version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "VersionRepr", into = "String")]
pub enum SpecVersion {
    V1_4,
    V1_5,
    #[default]
    V1_6,
    V1_7,
}

impl SpecVersion {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1_4 => "1.4",
            Self::V1_5 => "1.5",
            Self::V1_6 => "1.6",
            Self::V1_7 => "1.7",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::V1_4, Self::V1_5, Self::V1_6, Self::V1_7]
    }

    /// `provides` edges and component `tags` need 1.6.
    #[must_use]
    pub fn supports_provides(self) -> bool {
        self >= Self::V1_6
    }

    #[must_use]
    pub fn supports_tags(self) -> bool {
        self >= Self::V1_6
    }

    #[must_use]
    pub fn supports_pedigree(self) -> bool {
        self >= Self::V1_5
    }

    /// Filter-generated compositions and metadata lifecycles need 1.5.
    #[must_use]
    pub fn supports_compositions(self) -> bool {
        self >= Self::V1_5
    }

    #[must_use]
    pub fn supports_lifecycles(self) -> bool {
        self >= Self::V1_5
    }

    /// Cryptographic assets are only emitted for 1.6 and later.
    #[must_use]
    pub fn supports_crypto(self) -> bool {
        self >= Self::V1_6
    }

    /// `evidence.identity` is an array from 1.6.
    #[must_use]
    pub fn identity_is_list(self) -> bool {
        self >= Self::V1_6
    }

    /// 1.4 documents carry the legacy tools array.
    #[must_use]
    pub fn uses_legacy_tools(self) -> bool {
        self == Self::V1_4
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unsupported specification version string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported CycloneDX spec version '{0}' (supported: 1.4, 1.5, 1.6, 1.7)")]
pub struct UnsupportedSpecVersion(pub String);

impl FromStr for SpecVersion {
    type Err = UnsupportedSpecVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.4" => Ok(Self::V1_4),
            "1.5" => Ok(Self::V1_5),
            "1.6" => Ok(Self::V1_6),
            "1.7" => Ok(Self::V1_7),
            other => Err(UnsupportedSpecVersion(other.to_string())),
        }
    }
}

impl From<SpecVersion> for String {
    fn from(value: SpecVersion) -> Self {
        value.as_str().to_string()
    }
}

/// Versions arrive as strings in documents and often as numbers in YAML.
#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Text(String),
    Number(f64),
}

impl TryFrom<VersionRepr> for SpecVersion {
    type Error = UnsupportedSpecVersion;

    fn try_from(value: VersionRepr) -> Result<Self, Self::Error> {
        match value {
            VersionRepr::Text(text) => text.parse(),
            VersionRepr::Number(number) => format!("{number:.1}").parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_order() {
        assert_eq!("1.5".parse::<SpecVersion>(), Ok(SpecVersion::V1_5));
        assert!("2.0".parse::<SpecVersion>().is_err());
        assert!(SpecVersion::V1_4 < SpecVersion::V1_7);
    }

    #[test]
    fn test_feature_gates() {
        assert!(!SpecVersion::V1_5.supports_provides());
        assert!(SpecVersion::V1_6.supports_provides());
        assert!(SpecVersion::V1_5.supports_pedigree());
        assert!(!SpecVersion::V1_4.supports_compositions());
        assert!(SpecVersion::V1_4.uses_legacy_tools());
        assert!(SpecVersion::V1_7.identity_is_list());
    }

    #[test]
    fn test_deserialize_string_or_number() {
        let from_text: SpecVersion = serde_json::from_str("\"1.6\"").expect("string version");
        assert_eq!(from_text, SpecVersion::V1_6);
        let from_number: SpecVersion = serde_json::from_str("1.5").expect("numeric version");
        assert_eq!(from_number, SpecVersion::V1_5);
        assert_eq!(serde_json::to_string(&SpecVersion::V1_7).expect("serializes"), "\"1.7\"");
    }
}
