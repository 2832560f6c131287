//! Edge merge: combine partial dependency lists into one edge per ref.

use crate::model::{Component, DependencyEdge};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Merge `incoming` edges into `existing`.
///
/// Targets are unioned per `ref`, sorted and de-duplicated. A target equal
/// to the edge's own ref is dropped, as is any target equal to the parent's
/// bom-ref (compared case-insensitively). `provides` is only emitted when
/// some input edge carried it.
///
/// Without a parent the exclusion step is skipped and a diagnostic logged.
#[must_use]
pub fn merge_dependencies(
    existing: Vec<DependencyEdge>,
    incoming: Vec<DependencyEdge>,
    parent: Option<&Component>,
) -> Vec<DependencyEdge> {
    let parent_ref = parent.and_then(Component::reference).map(|r| r.to_lowercase());
    if parent_ref.is_none() {
        tracing::debug!(
            "No parent component while merging {} dependency edges; parent exclusion skipped",
            existing.len() + incoming.len()
        );
    }
    let keep = |owner: &str, target: &str| {
        target != owner
            && parent_ref
                .as_deref()
                .map_or(true, |parent| target.to_lowercase() != parent)
    };

    let mut depends_on: IndexMap<String, BTreeSet<String>> = IndexMap::new();
    let mut provides: IndexMap<String, BTreeSet<String>> = IndexMap::new();
    let mut any_provides = false;

    for edge in existing.into_iter().chain(incoming) {
        let targets = depends_on.entry(edge.reference.clone()).or_default();
        for target in edge.depends_on {
            if keep(&edge.reference, &target) {
                targets.insert(target);
            }
        }
        if let Some(provided) = edge.provides {
            any_provides = true;
            let targets = provides.entry(edge.reference.clone()).or_default();
            for target in provided {
                if keep(&edge.reference, &target) {
                    targets.insert(target);
                }
            }
        }
    }

    depends_on
        .into_iter()
        .map(|(reference, targets)| {
            let provided = any_provides.then(|| {
                provides
                    .swap_remove(&reference)
                    .map(|set| set.into_iter().collect())
                    .unwrap_or_default()
            });
            DependencyEdge {
                reference,
                depends_on: targets.into_iter().collect(),
                provides: provided,
            }
        })
        .collect()
}
