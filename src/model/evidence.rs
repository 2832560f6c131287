//! Identity evidence attached to components.
//!
//! `evidence.identity` is a single object in `CycloneDX` 1.5 and an array
//! from 1.6 onwards. Internally it is always a list; the original shape is
//! remembered so that it can be restored when the document is written.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Evidence block of a component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "EvidenceRepr", into = "EvidenceRepr")]
pub struct Evidence {
    /// Identity evidence entries
    pub identity: Vec<Identity>,
    /// Shape `identity` had on input, or should have on output
    pub identity_shape: IdentityShape,
    /// Other evidence (occurrences, callstack, licenses, ...)
    pub extra: IndexMap<String, Value>,
}

/// Serialized shape of `evidence.identity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityShape {
    /// Field absent
    #[default]
    Absent,
    /// A single object (`CycloneDX` 1.5)
    Single,
    /// An array (`CycloneDX` 1.6+)
    List,
}

impl Evidence {
    /// Evidence holding the given identity entries in list form.
    #[must_use]
    pub fn with_identities(identity: Vec<Identity>) -> Self {
        Self {
            identity,
            identity_shape: IdentityShape::List,
            extra: IndexMap::new(),
        }
    }

    /// Highest confidence among `purl` identity entries.
    ///
    /// `None` when the component carries no purl identity at all; an entry
    /// without a confidence counts as zero.
    #[must_use]
    pub fn purl_confidence(&self) -> Option<f64> {
        self.identity
            .iter()
            .filter(|ident| ident.field.as_deref() == Some("purl"))
            .map(|ident| ident.confidence.unwrap_or(0.0))
            .reduce(f64::max)
    }

    /// Techniques used by `purl` identity methods.
    pub fn purl_techniques(&self) -> impl Iterator<Item = &Technique> {
        self.identity
            .iter()
            .filter(|ident| ident.field.as_deref() == Some("purl"))
            .flat_map(|ident| ident.methods.iter().flatten())
            .map(|method| &method.technique)
    }
}

/// One identity evidence entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Vec<IdentityMethod>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concluded_value: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Identity {
    /// An identity entry for `field` with a confidence and methods.
    #[must_use]
    pub fn new(field: impl Into<String>, confidence: f64, methods: Vec<IdentityMethod>) -> Self {
        Self {
            field: Some(field.into()),
            confidence: Some(confidence),
            methods: Some(methods),
            ..Self::default()
        }
    }
}

/// Method used to establish an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityMethod {
    pub technique: Technique,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl IdentityMethod {
    #[must_use]
    pub fn new(technique: Technique, confidence: f64, value: impl Into<String>) -> Self {
        Self {
            technique,
            confidence: Some(confidence),
            value: Some(value.into()),
        }
    }
}

/// Identity evidence technique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Technique {
    SourceCodeAnalysis,
    BinaryAnalysis,
    ManifestAnalysis,
    AstFingerprint,
    HashComparison,
    Instrumentation,
    DynamicAnalysis,
    Filename,
    Attestation,
    Other(String),
}

impl Technique {
    /// Wire name of the technique
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SourceCodeAnalysis => "source-code-analysis",
            Self::BinaryAnalysis => "binary-analysis",
            Self::ManifestAnalysis => "manifest-analysis",
            Self::AstFingerprint => "ast-fingerprint",
            Self::HashComparison => "hash-comparison",
            Self::Instrumentation => "instrumentation",
            Self::DynamicAnalysis => "dynamic-analysis",
            Self::Filename => "filename",
            Self::Attestation => "attestation",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Technique {
    fn from(value: String) -> Self {
        match value.as_str() {
            "source-code-analysis" => Self::SourceCodeAnalysis,
            "binary-analysis" => Self::BinaryAnalysis,
            "manifest-analysis" => Self::ManifestAnalysis,
            "ast-fingerprint" => Self::AstFingerprint,
            "hash-comparison" => Self::HashComparison,
            "instrumentation" => Self::Instrumentation,
            "dynamic-analysis" => Self::DynamicAnalysis,
            "filename" => Self::Filename,
            "attestation" => Self::Attestation,
            _ => Self::Other(value),
        }
    }
}

impl From<Technique> for String {
    fn from(value: Technique) -> Self {
        match value {
            Technique::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Wire representation
// ============================================================================

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Identity>),
    One(Box<Identity>),
}

#[derive(Serialize, Deserialize)]
struct EvidenceRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<OneOrMany>,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

impl From<EvidenceRepr> for Evidence {
    fn from(repr: EvidenceRepr) -> Self {
        let (identity, identity_shape) = match repr.identity {
            None => (Vec::new(), IdentityShape::Absent),
            Some(OneOrMany::One(ident)) => (vec![*ident], IdentityShape::Single),
            Some(OneOrMany::Many(idents)) => (idents, IdentityShape::List),
        };
        Self {
            identity,
            identity_shape,
            extra: repr.extra,
        }
    }
}

impl From<Evidence> for EvidenceRepr {
    fn from(evidence: Evidence) -> Self {
        let Evidence {
            mut identity,
            identity_shape,
            extra,
        } = evidence;
        let identity = match identity_shape {
            IdentityShape::Absent if identity.is_empty() => None,
            IdentityShape::Single if identity.len() == 1 => identity.pop().map(|i| OneOrMany::One(Box::new(i))),
            _ => Some(OneOrMany::Many(identity)),
        };
        Self { identity, extra }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_object_shape_roundtrips() {
        let raw = json!({
            "identity": {
                "field": "purl",
                "confidence": 0.8,
                "methods": [{"technique": "manifest-analysis", "confidence": 0.8, "value": "package.json"}]
            }
        });
        let evidence: Evidence = serde_json::from_value(raw.clone()).expect("evidence parses");
        assert_eq!(evidence.identity.len(), 1);
        assert_eq!(evidence.identity_shape, IdentityShape::Single);
        assert_eq!(serde_json::to_value(&evidence).expect("serializes"), raw);
    }

    #[test]
    fn test_identity_array_shape_roundtrips() {
        let raw = json!({
            "identity": [{"field": "purl", "confidence": 1.0}],
            "occurrences": [{"location": "a.js"}]
        });
        let evidence: Evidence = serde_json::from_value(raw.clone()).expect("evidence parses");
        assert_eq!(evidence.identity_shape, IdentityShape::List);
        assert!(evidence.extra.contains_key("occurrences"));
        assert_eq!(serde_json::to_value(&evidence).expect("serializes"), raw);
    }

    #[test]
    fn test_single_shape_with_many_entries_writes_array() {
        let mut evidence = Evidence::with_identities(vec![
            Identity::new("purl", 0.5, vec![]),
            Identity::new("name", 0.3, vec![]),
        ]);
        evidence.identity_shape = IdentityShape::Single;
        let value = serde_json::to_value(&evidence).expect("serializes");
        assert!(value["identity"].is_array());
    }

    #[test]
    fn test_purl_confidence_and_techniques() {
        let evidence = Evidence::with_identities(vec![
            Identity::new(
                "purl",
                0.4,
                vec![IdentityMethod::new(Technique::ManifestAnalysis, 0.4, "pom.xml")],
            ),
            Identity::new(
                "purl",
                0.9,
                vec![IdentityMethod::new(Technique::BinaryAnalysis, 0.9, "app.jar")],
            ),
            Identity::new("name", 1.0, vec![]),
        ]);
        assert_eq!(evidence.purl_confidence(), Some(0.9));
        let techniques: Vec<_> = evidence.purl_techniques().map(Technique::as_str).collect();
        assert_eq!(techniques, vec!["manifest-analysis", "binary-analysis"]);

        assert_eq!(Evidence::default().purl_confidence(), None);
    }

    #[test]
    fn test_unknown_technique_is_preserved() {
        let technique: Technique = "custom-scan".to_string().into();
        assert_eq!(technique, Technique::Other("custom-scan".to_string()));
        assert_eq!(String::from(technique), "custom-scan");
    }
}
