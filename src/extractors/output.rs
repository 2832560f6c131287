//! What an extractor hands back to the aggregator.

use crate::error::ExtractorErrorKind;
use crate::model::{components_from_values, deserialize_lenient, Bom, Component, DependencyEdge, BOM_FORMAT};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Result of one extractor run for one path.
///
/// Every field is optional on the wire; a missing field is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorOutput {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub pkg_list: Vec<Component>,
    #[serde(default, deserialize_with = "lenient_edges")]
    pub dependencies_list: Vec<DependencyEdge>,
    #[serde(default, deserialize_with = "lenient_parent", skip_serializing_if = "Option::is_none")]
    pub parent_component: Option<Component>,
    /// Additional roots discovered alongside the parent
    #[serde(default, deserialize_with = "deserialize_lenient", skip_serializing_if = "Vec::is_empty")]
    pub root_list: Vec<Component>,
}

impl ExtractorOutput {
    /// Whether the extractor found any packages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pkg_list.is_empty()
    }

    /// Reinterpret a finished document as extractor output.
    #[must_use]
    pub fn from_bom(bom: Bom) -> Self {
        Self {
            pkg_list: bom.components,
            dependencies_list: bom.dependencies,
            parent_component: bom.metadata.component,
            root_list: Vec::new(),
        }
    }

    /// Parse extractor JSON or a `CycloneDX` document.
    pub fn from_json(content: &str) -> Result<Self, ExtractorErrorKind> {
        let value: Value = serde_json::from_str(content.trim())
            .map_err(|e| ExtractorErrorKind::Unparsable(e.to_string()))?;
        if value.get("bomFormat").and_then(Value::as_str) == Some(BOM_FORMAT) {
            let bom: Bom = serde_json::from_value(value)
                .map_err(|e| ExtractorErrorKind::Unparsable(e.to_string()))?;
            return Ok(Self::from_bom(bom));
        }
        if !value.is_object() {
            return Err(ExtractorErrorKind::Unparsable(
                "expected a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| ExtractorErrorKind::Unparsable(e.to_string()))
    }

    /// Append another result for the same ecosystem and path.
    ///
    /// The first parent found is kept; later parents become extra roots.
    pub fn absorb(&mut self, other: Self) {
        self.pkg_list.extend(other.pkg_list);
        self.dependencies_list.extend(other.dependencies_list);
        match (&self.parent_component, other.parent_component) {
            (None, parent) => self.parent_component = parent,
            (Some(_), Some(parent)) => self.root_list.push(parent),
            (Some(_), None) => {}
        }
        self.root_list.extend(other.root_list);
    }
}

fn lenient_parent<'de, D>(deserializer: D) -> Result<Option<Component>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
        .and_then(|v| components_from_values(vec![v]).pop()))
}

fn lenient_edges<'de, D>(deserializer: D) -> Result<Vec<DependencyEdge>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<DependencyEdge>(value) {
            Ok(edge) => Some(edge),
            Err(e) => {
                tracing::debug!("Dropping malformed dependency edge: {e}");
                None
            }
        })
        .collect())
}
