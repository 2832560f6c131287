//! The BOM document: root component, component set and dependency graph.

use super::component::{deserialize_lenient, Component, Property};
use super::dependency::DependencyEdge;
use super::evidence::IdentityShape;
use super::spec_version::SpecVersion;
use crate::utils::content_hash;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// `bomFormat` value for every document this crate writes
pub const BOM_FORMAT: &str = "CycloneDX";

/// A `CycloneDX` BOM document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    pub bom_format: String,
    pub spec_version: SpecVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default = "first_version")]
    pub version: u32,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub components: Vec<Component>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compositions: Vec<Composition>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

const fn first_version() -> u32 {
    1
}

impl Bom {
    /// An empty document with a fresh serial number.
    #[must_use]
    pub fn new(spec_version: SpecVersion) -> Self {
        Self {
            bom_format: BOM_FORMAT.to_string(),
            spec_version,
            serial_number: Some(new_serial_number()),
            version: 1,
            metadata: Metadata::default(),
            components: Vec::new(),
            dependencies: Vec::new(),
            services: Vec::new(),
            compositions: Vec::new(),
            extra: IndexMap::new(),
        }
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Serialize the document to JSON text.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// The root component (`metadata.component`)
    #[must_use]
    pub const fn root(&self) -> Option<&Component> {
        self.metadata.component.as_ref()
    }

    /// Graph key of the root component
    #[must_use]
    pub fn root_ref(&self) -> Option<String> {
        self.root().and_then(Component::reference)
    }

    /// Every ref defined by the document: components, the root and the
    /// root's nested sub-components.
    #[must_use]
    pub fn defined_refs(&self) -> HashSet<String> {
        let mut refs: HashSet<String> = self
            .components
            .iter()
            .filter_map(Component::reference)
            .collect();
        if let Some(root) = self.root() {
            refs.extend(root.reference());
            refs.extend(root.components.iter().filter_map(Component::reference));
        }
        refs
    }

    /// Stable hash of the serialized document, ignoring serial number and timestamp.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut normalized = self.clone();
        normalized.serial_number = None;
        normalized.metadata.timestamp = None;
        let bytes = serde_json::to_vec(&normalized).unwrap_or_default();
        content_hash(&bytes)
    }

    /// Re-shape the document for `version`.
    ///
    /// Fields the target version cannot express are removed and
    /// `evidence.identity` takes the array or object form that version
    /// expects. A single identity is written as an object up to 1.5;
    /// more than one entry always stays an array.
    pub fn project_to(&mut self, version: SpecVersion) {
        self.spec_version = version;
        if let Some(root) = self.metadata.component.as_mut() {
            project_component(root, version);
        }
        for component in &mut self.components {
            project_component(component, version);
        }
        if !version.supports_provides() {
            for edge in &mut self.dependencies {
                edge.provides = None;
            }
        }
    }
}

fn project_component(component: &mut Component, version: SpecVersion) {
    if !version.supports_tags() {
        component.tags.clear();
    }
    if !version.supports_pedigree() {
        component.pedigree = None;
    }
    if let Some(evidence) = component.evidence.as_mut() {
        if !evidence.identity.is_empty() {
            evidence.identity_shape = if version.identity_is_list() || evidence.identity.len() > 1 {
                IdentityShape::List
            } else {
                IdentityShape::Single
            };
        }
    }
    for nested in &mut component.components {
        project_component(nested, version);
    }
}

/// A new `urn:uuid:` serial number.
#[must_use]
pub fn new_serial_number() -> String {
    format!("urn:uuid:{}", uuid::Uuid::new_v4())
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Tools>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lifecycles: Vec<Lifecycle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// `metadata.tools`: an array up to 1.4, an object from 1.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tools {
    Legacy(Vec<LegacyTool>),
    Modern(ToolsObject),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LegacyTool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolsObject {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Value>,
}

/// Lifecycle phase entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    pub phase: String,
}

/// Completeness statement about part of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(rename = "bom-ref", default, skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    pub aggregate: Aggregate,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Composition {
    #[must_use]
    pub fn new(bom_ref: Option<String>, aggregate: Aggregate) -> Self {
        Self {
            bom_ref,
            aggregate,
            extra: IndexMap::new(),
        }
    }
}

/// Composition aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Aggregate {
    Complete,
    Incomplete,
    IncompleteFirstPartyOnly,
    Unknown,
    NotSpecified,
    Other(String),
}

impl Aggregate {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
            Self::IncompleteFirstPartyOnly => "incomplete_first_party_only",
            Self::Unknown => "unknown",
            Self::NotSpecified => "not_specified",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for Aggregate {
    fn from(value: String) -> Self {
        match value.as_str() {
            "complete" => Self::Complete,
            "incomplete" => Self::Incomplete,
            "incomplete_first_party_only" => Self::IncompleteFirstPartyOnly,
            "unknown" => Self::Unknown,
            "not_specified" => Self::NotSpecified,
            _ => Self::Other(value),
        }
    }
}

impl From<Aggregate> for String {
    fn from(value: Aggregate) -> Self {
        match value {
            Aggregate::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
