//! Post-generation filter: prune components and keep the graph closed.

use crate::config::FilterConfig;
use crate::model::{Aggregate, Bom, Component, Composition, DependencyEdge, Scope};
use std::collections::HashSet;

/// Why a component was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    LowConfidence,
    Technique,
    Scope,
    NotOnly,
    Excluded,
}

/// Apply `options` to `bom`.
///
/// Root and its nested sub-components always survive. When nothing is
/// removed the input document is returned untouched. Otherwise the
/// surviving components are sorted by bom-ref, every edge is restricted
/// to surviving refs, and an incomplete composition is recorded for the
/// root when the spec version and `auto_compositions` allow it.
#[must_use]
pub fn filter_bom(bom: Bom, options: &FilterConfig) -> Bom {
    if bom.components.is_empty() {
        return bom;
    }
    let verdicts: Vec<Option<Removal>> = bom
        .components
        .iter()
        .map(|component| removal_reason(component, options))
        .collect();
    let removed = verdicts.iter().filter(|v| v.is_some()).count();
    if removed == 0 {
        return bom;
    }
    log_removals(&verdicts);

    let mut bom = bom;
    let mut kept_refs: HashSet<String> = HashSet::new();
    if let Some(root) = bom.root() {
        kept_refs.extend(root.reference());
        kept_refs.extend(root.components.iter().filter_map(Component::reference));
    }
    let mut survivors: Vec<Component> = std::mem::take(&mut bom.components)
        .into_iter()
        .zip(verdicts)
        .filter_map(|(component, verdict)| verdict.is_none().then_some(component))
        .collect();
    survivors.sort_by_cached_key(|c| c.reference().unwrap_or_default());
    kept_refs.extend(survivors.iter().filter_map(Component::reference));

    let dependencies: Vec<DependencyEdge> = std::mem::take(&mut bom.dependencies)
        .into_iter()
        .filter(|edge| kept_refs.contains(&edge.reference))
        .map(|edge| DependencyEdge {
            depends_on: edge
                .depends_on
                .into_iter()
                .filter(|d| kept_refs.contains(d))
                .collect(),
            provides: edge.provides.map(|provided| {
                provided.into_iter().filter(|p| kept_refs.contains(p)).collect()
            }),
            reference: edge.reference,
        })
        .collect();

    if options.auto_compositions && bom.spec_version.supports_compositions() {
        if let Some(root) = bom.root() {
            let aggregate = if options.only.iter().any(|s| !s.is_empty()) {
                Aggregate::IncompleteFirstPartyOnly
            } else {
                Aggregate::Incomplete
            };
            let composition = Composition::new(root.reference(), aggregate);
            bom.compositions.push(composition);
        }
    }

    tracing::info!(
        "Filter removed {} of {} components",
        removed,
        removed + survivors.len()
    );
    bom.components = survivors;
    bom.dependencies = dependencies;
    bom
}

fn removal_reason(component: &Component, options: &FilterConfig) -> Option<Removal> {
    if options.min_confidence > 0.0 {
        let threshold = options.min_confidence.min(1.0);
        let confidence = component.evidence.as_ref().and_then(|e| e.purl_confidence());
        if confidence.is_some_and(|c| c < threshold) {
            return Some(Removal::LowConfidence);
        }
    }
    if options.technique_filter_active() {
        if let Some(evidence) = component.evidence.as_ref() {
            let used: Vec<&str> = evidence.purl_techniques().map(|t| t.as_str()).collect();
            let allowed = |t: &&str| options.technique.iter().any(|a| a.eq_ignore_ascii_case(t));
            if !used.is_empty() && !used.iter().any(allowed) {
                return Some(Removal::Technique);
            }
        }
    }
    if options.required_only && matches!(component.scope, Some(Scope::Optional | Scope::Excluded)) {
        return Some(Removal::Scope);
    }

    let purl = component.purl.as_deref().unwrap_or_default().to_lowercase();
    let only: Vec<String> = non_empty_lowercase(&options.only);
    if !only.is_empty() {
        return (!only.iter().all(|s| purl.contains(s.as_str()))).then_some(Removal::NotOnly);
    }
    let deny: Vec<String> = non_empty_lowercase(&options.filter);
    let denied = deny.iter().any(|s| {
        purl.contains(s.as_str())
            || component
                .properties
                .iter()
                .any(|p| p.value.to_lowercase().contains(s.as_str()))
    });
    denied.then_some(Removal::Excluded)
}

fn non_empty_lowercase(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn log_removals(verdicts: &[Option<Removal>]) {
    let count = |reason: Removal| verdicts.iter().filter(|v| **v == Some(reason)).count();
    tracing::debug!(
        "Removed by confidence: {}, technique: {}, scope: {}, only: {}, filter: {}",
        count(Removal::LowConfidence),
        count(Removal::Technique),
        count(Removal::Scope),
        count(Removal::NotOnly),
        count(Removal::Excluded)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentType, Evidence, Identity, IdentityMethod, SpecVersion, Technique};

    fn document(components: Vec<Component>, edges: Vec<DependencyEdge>) -> Bom {
        let mut bom = Bom::new(SpecVersion::V1_6);
        bom.metadata.component =
            Some(Component::new(ComponentType::Application, "root").with_bom_ref("root"));
        bom.components = components;
        bom.dependencies = edges;
        bom
    }

    fn lib(name: &str) -> Component {
        Component::library(name, format!("pkg:npm/{name}@1"))
    }

    fn with_confidence(component: Component, confidence: f64, technique: Technique) -> Component {
        component.with_evidence(Evidence::with_identities(vec![Identity::new(
            "purl",
            confidence,
            vec![IdentityMethod::new(technique, confidence, "package-lock.json")],
        )]))
    }

    #[test]
    fn test_nothing_filtered_returns_input() {
        let bom = document(vec![lib("b"), lib("a")], vec![]);
        let options = FilterConfig {
            filter: vec!["nomatch".to_string()],
            ..FilterConfig::default()
        };
        let out = filter_bom(bom.clone(), &options);
        assert_eq!(out, bom);
        assert_eq!(out.to_json(true).unwrap(), bom.to_json(true).unwrap());
    }

    #[test]
    fn test_empty_document_is_unchanged() {
        let bom = document(vec![], vec![]);
        let options = FilterConfig {
            required_only: true,
            ..FilterConfig::default()
        };
        assert_eq!(filter_bom(bom.clone(), &options), bom);
    }

    #[test]
    fn test_required_only_keeps_unknown_scope() {
        let bom = document(
            vec![
                lib("a").with_scope(Scope::Required),
                lib("b").with_scope(Scope::Optional),
                lib("c"),
                lib("d").with_scope(Scope::Excluded),
            ],
            vec![],
        );
        let options = FilterConfig {
            required_only: true,
            ..FilterConfig::default()
        };
        let out = filter_bom(bom, &options);
        let names: Vec<_> = out.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(out.compositions.len(), 1);
        assert_eq!(out.compositions[0].aggregate, Aggregate::Incomplete);
        assert_eq!(out.compositions[0].bom_ref.as_deref(), Some("root"));
    }

    #[test]
    fn test_edges_restricted_to_survivors() {
        let bom = document(
            vec![lib("a"), lib("b").with_scope(Scope::Optional)],
            vec![
                DependencyEdge::depends("root", ["pkg:npm/a@1", "pkg:npm/b@1"]),
                DependencyEdge::depends("pkg:npm/a@1", ["pkg:npm/b@1"]),
                DependencyEdge::depends("pkg:npm/b@1", ["pkg:npm/a@1"]),
            ],
        );
        let options = FilterConfig {
            required_only: true,
            ..FilterConfig::default()
        };
        let out = filter_bom(bom, &options);
        assert_eq!(
            out.dependencies,
            vec![
                DependencyEdge::depends("root", ["pkg:npm/a@1"]),
                DependencyEdge::new("pkg:npm/a@1"),
            ]
        );
    }

    #[test]
    fn test_min_confidence() {
        let bom = document(
            vec![
                with_confidence(lib("low"), 0.3, Technique::ManifestAnalysis),
                with_confidence(lib("high"), 0.9, Technique::ManifestAnalysis),
                lib("none"),
            ],
            vec![],
        );
        let options = FilterConfig {
            min_confidence: 0.5,
            ..FilterConfig::default()
        };
        let names: Vec<_> = filter_bom(bom, &options)
            .components
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["high", "none"]);
    }

    #[test]
    fn test_technique_allowlist() {
        let bom = document(
            vec![
                with_confidence(lib("manifest"), 1.0, Technique::ManifestAnalysis),
                with_confidence(lib("binary"), 1.0, Technique::BinaryAnalysis),
                lib("plain"),
            ],
            vec![],
        );
        let options = FilterConfig {
            technique: vec!["manifest-analysis".to_string()],
            ..FilterConfig::default()
        };
        let names: Vec<_> = filter_bom(bom, &options)
            .components
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["manifest", "plain"]);
    }

    #[test]
    fn test_only_requires_every_string() {
        let bom = document(
            vec![
                Component::library("core", "pkg:maven/com.acme/core@1"),
                Component::library("util", "pkg:maven/org.other/util@1"),
                Component::library("web", "pkg:npm/%40acme/web@1"),
            ],
            vec![],
        );
        let options = FilterConfig {
            only: vec!["maven".to_string(), "ACME".to_string(), String::new()],
            ..FilterConfig::default()
        };
        let out = filter_bom(bom, &options);
        assert_eq!(out.components.len(), 1);
        assert_eq!(out.components[0].name, "core");
        assert_eq!(out.compositions[0].aggregate, Aggregate::IncompleteFirstPartyOnly);
    }

    #[test]
    fn test_filter_matches_purl_and_properties() {
        let bom = document(
            vec![
                lib("jest"),
                lib("lodash").with_property("SrcFile", "/src/test/package.json"),
                lib("react"),
            ],
            vec![],
        );
        let options = FilterConfig {
            filter: vec!["JEST".to_string(), "/test/".to_string()],
            ..FilterConfig::default()
        };
        let out = filter_bom(bom, &options);
        assert_eq!(out.components.len(), 1);
        assert_eq!(out.components[0].name, "react");
    }

    #[test]
    fn test_composition_gated_by_version_and_flag() {
        let mut bom = document(vec![lib("a").with_scope(Scope::Optional), lib("b")], vec![]);
        bom.spec_version = SpecVersion::V1_4;
        let options = FilterConfig {
            required_only: true,
            ..FilterConfig::default()
        };
        assert!(filter_bom(bom.clone(), &options).compositions.is_empty());

        bom.spec_version = SpecVersion::V1_5;
        let no_auto = FilterConfig {
            auto_compositions: false,
            ..options.clone()
        };
        assert!(filter_bom(bom.clone(), &no_auto).compositions.is_empty());
        assert_eq!(filter_bom(bom, &options).compositions.len(), 1);
    }

    #[test]
    fn test_root_sub_components_keep_their_edges() {
        let mut bom = document(
            vec![lib("a").with_scope(Scope::Optional)],
            vec![DependencyEdge::depends("root", ["module-x", "pkg:npm/a@1"])],
        );
        if let Some(root) = bom.metadata.component.as_mut() {
            root.components = vec![Component::new(ComponentType::Library, "x").with_bom_ref("module-x")];
        }
        let options = FilterConfig {
            required_only: true,
            ..FilterConfig::default()
        };
        let out = filter_bom(bom, &options);
        assert!(out.components.is_empty());
        assert_eq!(out.dependencies[0].depends_on, vec!["module-x"]);
    }
}
