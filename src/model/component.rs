//! Component records as they appear in `CycloneDX` documents.

use super::evidence::Evidence;
use super::identifiers::{bom_ref_from_purl, purl_type_and_namespace, IdentityKey};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One identifiable package or artifact.
///
/// Fields this engine does not interpret (`externalReferences`,
/// `supplier`, `cryptoProperties`, ...) are carried in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(rename = "bom-ref", alias = "bomRef", default, skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<Hash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pedigree: Option<Value>,
    /// Nested sub-components (modules of a multi-module parent)
    #[serde(
        default,
        deserialize_with = "deserialize_lenient",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub components: Vec<Component>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Component {
    /// Create a component with only a type and a name.
    #[must_use]
    pub fn new(component_type: ComponentType, name: impl Into<String>) -> Self {
        Self {
            component_type,
            bom_ref: None,
            group: None,
            name: name.into(),
            version: None,
            purl: None,
            scope: None,
            hashes: Vec::new(),
            licenses: Vec::new(),
            properties: Vec::new(),
            evidence: None,
            tags: Vec::new(),
            pedigree: None,
            components: Vec::new(),
            extra: IndexMap::new(),
        }
    }

    /// A library component identified by `purl`, with the bom-ref derived from it.
    #[must_use]
    pub fn library(name: impl Into<String>, purl: impl Into<String>) -> Self {
        Self::new(ComponentType::Library, name).with_purl(purl)
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the purl and the matching decoded bom-ref.
    #[must_use]
    pub fn with_purl(mut self, purl: impl Into<String>) -> Self {
        let purl = purl.into();
        self.bom_ref = Some(bom_ref_from_purl(&purl));
        self.purl = Some(purl);
        self
    }

    #[must_use]
    pub fn with_bom_ref(mut self, bom_ref: impl Into<String>) -> Self {
        self.bom_ref = Some(bom_ref.into());
        self
    }

    #[must_use]
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    #[must_use]
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }

    /// Merge key used to deduplicate records.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::derive(
            self.purl.as_deref(),
            self.bom_ref.as_deref(),
            &self.name,
            self.version.as_deref(),
        )
    }

    /// Graph node key: the bom-ref, else the decoded purl.
    #[must_use]
    pub fn reference(&self) -> Option<String> {
        self.bom_ref
            .clone()
            .or_else(|| self.purl.as_deref().map(bom_ref_from_purl))
    }

    /// `group/name@version`, omitting empty parts.
    #[must_use]
    pub fn simple_full_name(&self) -> String {
        let mut full_name = match self.group.as_deref().filter(|g| !g.is_empty()) {
            Some(group) => format!("{group}/{}", self.name),
            None => self.name.clone(),
        };
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            full_name.push('@');
            full_name.push_str(version);
        }
        full_name
    }

    /// The purl type (`npm`, `maven`, `container`, ...), if the purl parses.
    #[must_use]
    pub fn purl_type(&self) -> Option<String> {
        self.purl
            .as_deref()
            .and_then(purl_type_and_namespace)
            .map(|(ty, _)| ty)
    }

    /// Whether the component is a container image wrapper.
    #[must_use]
    pub fn is_container_purl(&self) -> bool {
        self.purl
            .as_deref()
            .is_some_and(|purl| purl.starts_with("pkg:container"))
    }

    /// Values of all properties named `name`.
    pub fn property_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// Deserialize a component list, dropping records that do not parse.
///
/// A component without `name` or `type` is malformed input from a
/// best-effort extractor and is skipped rather than failing the document.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Vec<Component>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(components_from_values(raw.unwrap_or_default()))
}

/// Convert raw JSON records into components, skipping malformed ones.
#[must_use]
pub fn components_from_values(values: Vec<Value>) -> Vec<Component> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Component>(value) {
            Ok(component) => Some(component),
            Err(e) => {
                tracing::debug!("Dropping malformed component record: {e}");
                None
            }
        })
        .collect()
}

/// `CycloneDX` component classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentType {
    Application,
    Library,
    Framework,
    Container,
    OperatingSystem,
    Device,
    DeviceDriver,
    Firmware,
    File,
    Data,
    Platform,
    MachineLearningModel,
    CryptographicAsset,
    Other(String),
}

impl ComponentType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Application => "application",
            Self::Library => "library",
            Self::Framework => "framework",
            Self::Container => "container",
            Self::OperatingSystem => "operating-system",
            Self::Device => "device",
            Self::DeviceDriver => "device-driver",
            Self::Firmware => "firmware",
            Self::File => "file",
            Self::Data => "data",
            Self::Platform => "platform",
            Self::MachineLearningModel => "machine-learning-model",
            Self::CryptographicAsset => "cryptographic-asset",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ComponentType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "application" => Self::Application,
            "library" => Self::Library,
            "framework" => Self::Framework,
            "container" => Self::Container,
            "operating-system" => Self::OperatingSystem,
            "device" => Self::Device,
            "device-driver" => Self::DeviceDriver,
            "firmware" => Self::Firmware,
            "file" => Self::File,
            "data" => Self::Data,
            "platform" => Self::Platform,
            "machine-learning-model" => Self::MachineLearningModel,
            "cryptographic-asset" => Self::CryptographicAsset,
            _ => Self::Other(value),
        }
    }
}

impl From<ComponentType> for String {
    fn from(value: ComponentType) -> Self {
        match value {
            ComponentType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relevance of a component to the final build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Required,
    Optional,
    Excluded,
}

/// Component hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hash {
    pub alg: String,
    pub content: String,
}

/// Name/value pair used for provenance such as `SrcFile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Property {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
