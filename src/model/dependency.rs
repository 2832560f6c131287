//! Dependency graph edges.

use serde::{Deserialize, Serialize};

/// `{ ref, dependsOn, provides? }` entry of the `dependencies` array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// `None` when the edge never carried a provides list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provides: Option<Vec<String>>,
}

impl DependencyEdge {
    /// An edge with no targets.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            depends_on: Vec::new(),
            provides: None,
        }
    }

    /// An edge from `reference` to each of `depends_on`.
    #[must_use]
    pub fn depends(reference: impl Into<String>, depends_on: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            reference: reference.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
            provides: None,
        }
    }

    #[must_use]
    pub fn with_provides(mut self, provides: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.provides = Some(provides.into_iter().map(Into::into).collect());
        self
    }

    /// Every ref this edge points at.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.depends_on
            .iter()
            .chain(self.provides.iter().flatten())
            .map(String::as_str)
    }

    /// Whether the edge lists its own ref as a target.
    #[must_use]
    pub fn is_self_referential(&self) -> bool {
        self.targets().any(|t| t == self.reference)
    }
}
