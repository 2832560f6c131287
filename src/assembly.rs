//! Document assembly: turn a root, a component list and an edge list into
//! a `CycloneDX` document.

use crate::extractors::ExtractorOutput;
use crate::merge::trim_components;
use crate::model::{
    purl_from_bom_ref, Bom, Component, ComponentType, DependencyEdge, LegacyTool, Lifecycle,
    Metadata, SpecVersion, Tools, ToolsObject,
};
use std::collections::HashSet;

/// Name recorded in `metadata.tools`.
pub const TOOL_NAME: &str = env!("CARGO_PKG_NAME");
/// Version recorded in `metadata.tools`.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Lifecycle phase of a generated document.
const LIFECYCLE_PHASE: &str = "build";

/// Assemble a fresh document.
///
/// Components are deduplicated once more and edges are written as given,
/// except that the root's edge loses sub-components dropped for repeating
/// the root's name. Every call gets a new serial number and `version` 1.
#[must_use]
pub fn dedupe_bom(
    spec_version: SpecVersion,
    parent: Option<Component>,
    components: Vec<Component>,
    dependencies: Vec<DependencyEdge>,
) -> Bom {
    let components = trim_components(components);
    tracing::debug!(
        "Obtained {} components and {} dependencies after dedupe",
        components.len(),
        dependencies.len()
    );
    let shadowed = parent.as_ref().map(shadowed_sub_refs).unwrap_or_default();
    let mut bom = Bom::new(spec_version);
    bom.metadata = add_metadata(parent, spec_version);
    bom.components = components;
    bom.dependencies = dependencies;
    if !shadowed.is_empty() {
        prune_root_edge(&mut bom, &shadowed);
    }
    bom.project_to(spec_version);
    bom
}

/// Refs of the sub-components [`normalize_parent`] drops for sharing the
/// parent's full name.
fn shadowed_sub_refs(parent: &Component) -> Vec<String> {
    let full_name = parent.simple_full_name();
    parent
        .components
        .iter()
        .filter(|sub| sub.simple_full_name() == full_name)
        .filter_map(Component::reference)
        .collect()
}

/// Drop `shadowed` targets from the root's edge unless something else
/// still defines them.
fn prune_root_edge(bom: &mut Bom, shadowed: &[String]) {
    let Some(root_ref) = bom.root_ref() else {
        return;
    };
    let defined = bom.defined_refs();
    for edge in bom.dependencies.iter_mut().filter(|e| e.reference == root_ref) {
        edge.depends_on.retain(|t| defined.contains(t) || !shadowed.contains(t));
    }
}

/// Assemble a document from a single extractor result.
///
/// Returns `None` when the extractor found neither packages nor a parent.
#[must_use]
pub fn build_bom_ns_data(spec_version: SpecVersion, output: ExtractorOutput) -> Option<Bom> {
    let ExtractorOutput {
        pkg_list,
        dependencies_list,
        parent_component,
        root_list,
    } = output;
    if pkg_list.is_empty() && parent_component.is_none() {
        return None;
    }
    let parent = parent_component.map(|mut parent| {
        parent.components.extend(root_list);
        parent
    });
    Some(dedupe_bom(spec_version, parent, pkg_list, dependencies_list))
}

/// Build the metadata block for a generated document.
#[must_use]
pub fn add_metadata(parent: Option<Component>, spec_version: SpecVersion) -> Metadata {
    Metadata {
        timestamp: Some(timestamp()),
        tools: Some(tools_section(spec_version)),
        lifecycles: if spec_version.supports_lifecycles() {
            vec![Lifecycle {
                phase: LIFECYCLE_PHASE.to_string(),
            }]
        } else {
            Vec::new()
        },
        component: parent.map(normalize_parent),
        ..Metadata::default()
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn tools_section(spec_version: SpecVersion) -> Tools {
    if spec_version.uses_legacy_tools() {
        return Tools::Legacy(vec![LegacyTool {
            vendor: Some(TOOL_NAME.to_string()),
            name: TOOL_NAME.to_string(),
            version: Some(TOOL_VERSION.to_string()),
        }]);
    }
    let tool = Component::new(ComponentType::Application, TOOL_NAME)
        .with_version(TOOL_VERSION)
        .with_purl(format!("pkg:cargo/{TOOL_NAME}@{TOOL_VERSION}"));
    Tools::Modern(ToolsObject {
        components: vec![tool],
        services: Vec::new(),
    })
}

/// Clean the root and its nested sub-components.
///
/// Evidence is removed, a purl is recovered from a purl-shaped bom-ref,
/// sub-components need a name, may not repeat the root, get a synthetic
/// bom-ref when they lack one, and are deduplicated by bom-ref.
fn normalize_parent(mut parent: Component) -> Component {
    parent.evidence = None;
    if parent.purl.is_none() {
        parent.purl = parent.bom_ref.as_deref().and_then(purl_from_bom_ref);
    }
    let parent_full_name = parent.simple_full_name();
    let mut seen = HashSet::new();
    parent.components = std::mem::take(&mut parent.components)
        .into_iter()
        .filter_map(|mut sub| {
            sub.evidence = None;
            if sub.name.is_empty() {
                return None;
            }
            let full_name = sub.simple_full_name();
            if full_name == parent_full_name {
                return None;
            }
            let bom_ref = sub
                .bom_ref
                .get_or_insert_with(|| format!("pkg:{}/{full_name}", sub.component_type.as_str()))
                .clone();
            seen.insert(bom_ref).then_some(sub)
        })
        .collect();
    parent
}
