//! Multi-ecosystem aggregation.
//!
//! Every path is scanned by every allowed ecosystem in [`Ecosystem::ORDER`].
//! Paths may be scanned in parallel; ecosystems within a path always run
//! one after another. Results are folded on the calling thread in path
//! order, so the output does not depend on scheduling.

use crate::assembly::dedupe_bom;
use crate::config::AppConfig;
use crate::context::ScanContext;
use crate::error::{AssemblyErrorKind, Result, SbomGraphError};
use crate::extractors::{Ecosystem, Extractor, ExtractorOutput, ExtractorRegistry};
use crate::hierarchy::{default_parent_component, determine_parent_component, ParentHierarchy};
use crate::merge::merge_dependencies;
use crate::model::{Bom, Component, DependencyEdge};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// purl type of a directory-named root when no ecosystem contributed.
const FALLBACK_PURL_TYPE: &str = "generic";

/// What one extractor produced for one path.
#[derive(Debug)]
struct Contribution {
    ecosystem: Ecosystem,
    output: ExtractorOutput,
}

/// Scan `paths` and assemble one document.
///
/// Extractor failures are recorded as warnings in `ctx` and contribute
/// nothing, unless `assembly.fail_on_error` is set, in which case the first
/// failure aborts the run.
pub fn create_multi_x_bom(
    paths: &[PathBuf],
    registry: &ExtractorRegistry,
    config: &AppConfig,
    ctx: &ScanContext,
) -> Result<Bom> {
    let spec_version = config.assembly.spec_version;
    let type_filter = config.project.type_filter();
    let mut hierarchy = ParentHierarchy::new(determine_parent_component(&config.project));
    let mut components: Vec<Component> = Vec::new();
    let mut edges: Vec<DependencyEdge> = Vec::new();

    if type_filter.wants_os_packages() {
        let mut os_refs = Vec::new();
        for path in paths {
            for contribution in scan_ecosystem(Ecosystem::Os, path, registry, config, ctx)? {
                let output = contribution.output;
                os_refs.extend(output.pkg_list.iter().filter_map(Component::reference));
                components.extend(output.pkg_list);
                edges = merge_dependencies(edges, output.dependencies_list, hierarchy.root());
            }
        }
        let root_ref = hierarchy.root().and_then(Component::reference);
        if let Some(root_ref) = root_ref.filter(|_| !os_refs.is_empty()) {
            tracing::debug!("Linking {} OS packages to {}", os_refs.len(), root_ref);
            let root_edge = DependencyEdge::depends(root_ref, os_refs);
            edges = merge_dependencies(vec![root_edge], edges, hierarchy.root());
        }
    }

    let ecosystems: Vec<Ecosystem> = Ecosystem::ORDER
        .iter()
        .copied()
        .filter(|eco| match eco {
            Ecosystem::Crypto => spec_version.supports_crypto() && config.assembly.include_crypto,
            _ => type_filter.allows(*eco),
        })
        .collect();

    let scan_path = |path: &PathBuf| -> Result<Vec<Contribution>> {
        let mut contributions = Vec::new();
        for ecosystem in &ecosystems {
            contributions.extend(scan_ecosystem(*ecosystem, path, registry, config, ctx)?);
        }
        Ok(contributions)
    };
    let per_path: Vec<Vec<Contribution>> = if config.assembly.parallel_paths && paths.len() > 1 {
        paths.par_iter().map(scan_path).collect::<Result<_>>()?
    } else {
        paths.iter().map(scan_path).collect::<Result<_>>()?
    };

    let mut first_ecosystem = None;
    for contribution in per_path.into_iter().flatten() {
        let Contribution { ecosystem, output } = contribution;
        first_ecosystem.get_or_insert(ecosystem);
        components.extend(output.pkg_list);
        if ecosystem == Ecosystem::Crypto {
            continue;
        }
        let parent = output.parent_component;
        edges = merge_dependencies(
            edges,
            output.dependencies_list,
            parent.as_ref().or(hierarchy.root()),
        );
        if let Some(parent) = parent {
            hierarchy.absorb(parent);
        }
        for root in output.root_list {
            hierarchy.absorb(root);
        }
    }

    if hierarchy.root().is_none() && hierarchy.sub_parents().is_empty() {
        if let Some(path) = paths.first() {
            let purl_type = first_ecosystem.map_or(FALLBACK_PURL_TYPE, |eco| eco.purl_type());
            hierarchy = ParentHierarchy::new(Some(default_parent_component(
                path,
                purl_type,
                &config.project,
            )));
        }
    }

    let (root, edges) = hierarchy.finish(edges);
    tracing::info!(
        "Aggregated {} components and {} dependency edges from {} path(s)",
        components.len(),
        edges.len(),
        paths.len()
    );
    Ok(dedupe_bom(spec_version, root, components, edges))
}

/// Run every registered extractor of `ecosystem` against `path`.
///
/// Outputs without packages are dropped.
fn scan_ecosystem(
    ecosystem: Ecosystem,
    path: &Path,
    registry: &ExtractorRegistry,
    config: &AppConfig,
    ctx: &ScanContext,
) -> Result<Vec<Contribution>> {
    let mut contributions = Vec::new();
    for extractor in registry.for_ecosystem(ecosystem) {
        if let Some(output) = run_extractor(extractor, path, config, ctx)? {
            contributions.push(Contribution { ecosystem, output });
        }
    }
    Ok(contributions)
}

fn run_extractor(
    extractor: &Arc<dyn Extractor>,
    path: &Path,
    config: &AppConfig,
    ctx: &ScanContext,
) -> Result<Option<ExtractorOutput>> {
    match extractor.extract(path, ctx) {
        Ok(output) if output.is_empty() => Ok(None),
        Ok(output) => {
            tracing::debug!(
                "{} found {} components in {}",
                extractor.name(),
                output.pkg_list.len(),
                path.display()
            );
            Ok(Some(output))
        }
        Err(kind) => {
            let err = SbomGraphError::extractor(
                format!("{} at {}", extractor.name(), path.display()),
                kind,
            );
            ctx.warn(err.to_string());
            if config.assembly.fail_on_error {
                return Err(SbomGraphError::assembly(
                    format!("extractor {}", extractor.name()),
                    AssemblyErrorKind::ExtractorAborted {
                        ecosystem: extractor.ecosystem().to_string(),
                        path: path.display().to_string(),
                        reason: err.to_string(),
                    },
                ));
            }
            Ok(None)
        }
    }
}
