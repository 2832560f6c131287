//! Identity merge: collapse duplicate component records into one.
//!
//! Records sharing an [`IdentityKey`](crate::model::IdentityKey) are folded
//! into the first-seen record. The fold is additive over `properties` and
//! `evidence.identity`, and a `required` scope is never downgraded.

use crate::model::{Component, Evidence, Identity, IdentityShape, KeySource, Property, Scope};
use indexmap::map::Entry;
use indexmap::IndexMap;

/// Deduplicate components by identity key.
///
/// Output order is the order in which each key was first seen. Running this
/// on its own output returns the same list.
pub fn trim_components(components: impl IntoIterator<Item = Component>) -> Vec<Component> {
    let mut merged: IndexMap<_, Component> = IndexMap::new();
    let mut duplicates = 0usize;
    let mut bare = 0usize;
    for component in components {
        match merged.entry(component.identity_key()) {
            Entry::Vacant(slot) => {
                slot.insert(component);
            }
            Entry::Occupied(mut slot) => {
                duplicates += 1;
                if slot.key().source() == KeySource::NameVersion {
                    bare += 1;
                    tracing::trace!(
                        "Merging bare record '{}' by name and version",
                        slot.key().value()
                    );
                }
                merge_component(slot.get_mut(), component);
            }
        }
    }
    if duplicates > 0 {
        tracing::debug!(
            "Merged {} duplicate component records ({} by name and version) into {} components",
            duplicates,
            bare,
            merged.len()
        );
    }
    merged.into_values().collect()
}

/// Fold `incoming` into `existing`, which keeps its own field values.
pub fn merge_component(existing: &mut Component, incoming: Component) {
    merge_properties(&mut existing.properties, incoming.properties);
    if let Some(evidence) = incoming.evidence {
        match existing.evidence.as_mut() {
            Some(current) => merge_evidence(current, evidence),
            None => existing.evidence = Some(evidence),
        }
    }
    existing.scope = merge_scope(existing.scope, incoming.scope);
}

/// `required` wins from either side; otherwise an unset scope is filled in.
#[must_use]
pub fn merge_scope(existing: Option<Scope>, incoming: Option<Scope>) -> Option<Scope> {
    match (existing, incoming) {
        (Some(Scope::Required), _) | (_, Some(Scope::Required)) => Some(Scope::Required),
        (None, incoming) => incoming,
        (existing, _) => existing,
    }
}

fn merge_properties(existing: &mut Vec<Property>, incoming: Vec<Property>) {
    for property in incoming {
        if !existing.contains(&property) {
            existing.push(property);
        }
    }
}

fn merge_evidence(existing: &mut Evidence, incoming: Evidence) {
    let requested_shape = match existing.identity_shape {
        IdentityShape::Absent => incoming.identity_shape,
        shape => shape,
    };
    for identity in incoming.identity {
        merge_identity(&mut existing.identity, identity);
    }
    for (key, value) in incoming.extra {
        existing.extra.entry(key).or_insert(value);
    }
    existing.identity_shape = match (requested_shape, existing.identity.len()) {
        (_, 0) => IdentityShape::Absent,
        (IdentityShape::Single, 1) => IdentityShape::Single,
        _ => IdentityShape::List,
    };
}

/// Merge one identity entry into the list.
///
/// Methods of an entry are merged into every existing entry for the same
/// `field`, deduplicated by method `value`. An entry that could not be
/// merged that way is appended unless an identical entry already exists.
fn merge_identity(existing: &mut Vec<Identity>, incoming: Identity) {
    let mut merged_by_method = false;
    if let Some(methods) = incoming.methods.as_ref().filter(|m| !m.is_empty()) {
        for current in existing.iter_mut().filter(|e| e.field == incoming.field) {
            let current_methods = current.methods.get_or_insert_with(Vec::new);
            for method in methods {
                if !current_methods.iter().any(|m| m.value == method.value) {
                    current_methods.push(method.clone());
                }
            }
            if current.concluded_value.is_none() {
                current.concluded_value.clone_from(&incoming.concluded_value);
            }
            merged_by_method = true;
        }
    }
    if !merged_by_method && !existing.contains(&incoming) {
        existing.push(incoming);
    }
}
