//! Property-based tests for the merge and filter invariants.
//!
//! Inputs are drawn from a small pool of names so that duplicates,
//! self-references and dangling targets show up often.

use proptest::prelude::*;
use sbom_graph::config::FilterConfig;
use sbom_graph::merge::{merge_dependencies, trim_components};
use sbom_graph::model::{Bom, Component, ComponentType, DependencyEdge, Scope, SpecVersion};
use sbom_graph::postgen::filter_bom;
use std::collections::HashSet;

const ROOT: &str = "pkg:generic/root@1";

fn purl(index: u8) -> String {
    format!("pkg:npm/p{index}@1.0.0")
}

fn arb_scope() -> impl Strategy<Value = Option<Scope>> {
    prop_oneof![
        Just(None),
        Just(Some(Scope::Required)),
        Just(Some(Scope::Optional)),
        Just(Some(Scope::Excluded)),
    ]
}

fn arb_component() -> impl Strategy<Value = Component> {
    (0u8..12, arb_scope(), proptest::option::of("[a-c]/package\\.json")).prop_map(
        |(index, scope, src)| {
            let mut component = Component::library(format!("p{index}"), purl(index));
            component.scope = scope;
            if let Some(src) = src {
                component = component.with_property("SrcFile", src);
            }
            component
        },
    )
}

fn arb_edge() -> impl Strategy<Value = DependencyEdge> {
    (
        0u8..12,
        proptest::collection::vec(0u8..13, 0..6),
        proptest::option::of(proptest::collection::vec(0u8..13, 0..4)),
    )
        .prop_map(|(from, targets, provides)| {
            // index 12 stands for the root
            let name = |i: u8| if i == 12 { ROOT.to_string() } else { purl(i) };
            let edge = DependencyEdge::depends(purl(from), targets.into_iter().map(name));
            match provides {
                Some(provided) => edge.with_provides(provided.into_iter().map(name)),
                None => edge,
            }
        })
}

fn root() -> Component {
    Component::new(ComponentType::Application, "root").with_purl(ROOT)
}

fn document(components: Vec<Component>, edges: Vec<DependencyEdge>) -> Bom {
    let mut bom = Bom::new(SpecVersion::V1_6);
    bom.metadata.component = Some(root());
    bom.components = trim_components(components);
    bom.dependencies = merge_dependencies(edges, vec![], Some(&root()));
    bom
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn trim_is_idempotent(components in proptest::collection::vec(arb_component(), 0..40)) {
        let once = trim_components(components);
        let twice = trim_components(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn trim_leaves_one_record_per_key(components in proptest::collection::vec(arb_component(), 0..40)) {
        let merged = trim_components(components);
        let keys: HashSet<_> = merged.iter().map(Component::identity_key).collect();
        prop_assert_eq!(keys.len(), merged.len());
    }

    #[test]
    fn required_scope_survives_merge(components in proptest::collection::vec(arb_component(), 1..40)) {
        let required: HashSet<String> = components
            .iter()
            .filter(|c| c.scope == Some(Scope::Required))
            .filter_map(|c| c.purl.clone())
            .collect();
        for component in trim_components(components) {
            if component.purl.as_ref().is_some_and(|p| required.contains(p)) {
                prop_assert_eq!(component.scope, Some(Scope::Required));
            }
        }
    }

    #[test]
    fn merged_edges_have_no_self_or_parent_targets(
        first in proptest::collection::vec(arb_edge(), 0..20),
        second in proptest::collection::vec(arb_edge(), 0..20),
    ) {
        let merged = merge_dependencies(first, second, Some(&root()));
        let mut refs = HashSet::new();
        for edge in &merged {
            prop_assert!(refs.insert(edge.reference.clone()), "duplicate ref {}", edge.reference);
            prop_assert!(!edge.is_self_referential());
            prop_assert!(!edge.depends_on.iter().any(|d| d == ROOT));
            prop_assert!(edge.depends_on.windows(2).all(|w| w[0] < w[1]));
            if let Some(provided) = &edge.provides {
                prop_assert!(!provided.iter().any(|p| *p == edge.reference || p == ROOT));
            }
        }
    }

    #[test]
    fn provides_is_emitted_only_when_an_input_carried_it(
        first in proptest::collection::vec(arb_edge(), 0..20),
        second in proptest::collection::vec(arb_edge(), 0..20),
    ) {
        let carried = first.iter().chain(&second).any(|e| e.provides.is_some());
        let merged = merge_dependencies(first, second, Some(&root()));
        for edge in &merged {
            prop_assert_eq!(edge.provides.is_some(), carried);
        }
    }

    #[test]
    fn filter_keeps_the_graph_closed(
        components in proptest::collection::vec(arb_component(), 1..40),
        edges in proptest::collection::vec(arb_edge(), 0..20),
        required_only in any::<bool>(),
        deny in proptest::option::of("p[0-9]"),
    ) {
        let options = FilterConfig {
            required_only,
            filter: deny.into_iter().collect(),
            ..FilterConfig::default()
        };
        let bom = document(components, edges);
        let before = bom.components.len();
        let out = filter_bom(bom, &options);
        // untouched documents may carry dangling input edges
        if out.components.len() == before {
            return Ok(());
        }
        let kept = out.defined_refs();
        for edge in &out.dependencies {
            prop_assert!(kept.contains(&edge.reference));
            for target in &edge.depends_on {
                prop_assert!(kept.contains(target), "{} dangles", target);
            }
            for provided in edge.provides.iter().flatten() {
                prop_assert!(kept.contains(provided), "{} provided but removed", provided);
            }
        }
    }

    #[test]
    fn inactive_filter_is_a_no_op(
        components in proptest::collection::vec(arb_component(), 0..40),
        edges in proptest::collection::vec(arb_edge(), 0..20),
    ) {
        let bom = document(components, edges);
        prop_assert_eq!(filter_bom(bom.clone(), &FilterConfig::default()), bom);
    }
}
