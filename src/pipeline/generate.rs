//! Generation stages: scan, aggregate, post-process.

use super::{parse_bom_with_context, PipelineError};
use crate::aggregate::create_multi_x_bom;
use crate::config::AppConfig;
use crate::context::{ScanContext, ScanReport};
use crate::extractors::{CycloneDxFileExtractor, ExtractorRegistry};
use crate::model::Bom;
use crate::postgen::post_process;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// A finished document and what it took to produce it.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// The post-processed document
    pub bom: Bom,
    /// Commands, warnings and circuit-breaker state of the scan
    pub report: ScanReport,
    /// Components the filter removed
    pub removed: usize,
}

impl GenerateOutcome {
    /// Whether the filter removed anything.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.removed > 0
    }
}

/// Scan `paths` with every configured extractor and post-process the result.
pub fn generate(paths: &[PathBuf], config: &AppConfig) -> Result<GenerateOutcome> {
    let registry = ExtractorRegistry::from_config(config)
        .map_err(|e| PipelineError::GenerationFailed { source: e.into() })?;
    tracing::debug!("Registered extractors: {:?}", registry);
    run(paths, &registry, config)
}

/// Aggregate existing `CycloneDX` documents into one.
pub fn merge_documents(paths: &[PathBuf], config: &AppConfig) -> Result<GenerateOutcome> {
    let mut registry = ExtractorRegistry::new();
    registry.register(CycloneDxFileExtractor::new());
    run(paths, &registry, config)
}

/// Post-process an existing document.
///
/// The output takes the configured spec version: composition gating sees
/// it and fields that version cannot express are projected away.
pub fn filter_document(path: &Path, config: &AppConfig) -> Result<GenerateOutcome> {
    let mut bom = parse_bom_with_context(path, false).map_err(|source| PipelineError::ParseFailed {
        path: path.display().to_string(),
        source,
    })?;
    let base_dir = config
        .assembly
        .base_dir
        .clone()
        .or_else(|| path.parent().map(Path::to_path_buf));
    let requested = config.assembly.spec_version;
    if bom.spec_version != requested {
        tracing::debug!("Projecting {} document to {}", bom.spec_version, requested);
    }
    bom.spec_version = requested;
    let mut outcome = finish(bom, ScanReport::default(), config, base_dir.as_deref());
    outcome.bom.project_to(requested);
    Ok(outcome)
}

fn run(paths: &[PathBuf], registry: &ExtractorRegistry, config: &AppConfig) -> Result<GenerateOutcome> {
    let ctx = ScanContext::new(config.execution.clone());
    let bom = create_multi_x_bom(paths, registry, config, &ctx)
        .map_err(|e| PipelineError::GenerationFailed { source: e.into() })?;
    let report = ctx.finish();
    let base_dir = config
        .assembly
        .base_dir
        .clone()
        .or_else(|| paths.first().filter(|p| p.is_dir()).cloned());
    Ok(finish(bom, report, config, base_dir.as_deref()))
}

fn finish(bom: Bom, report: ScanReport, config: &AppConfig, base_dir: Option<&Path>) -> GenerateOutcome {
    let before = bom.components.len();
    let bom = post_process(bom, &config.filter, base_dir);
    let removed = before.saturating_sub(bom.components.len());
    if !report.warnings.is_empty() {
        tracing::info!("Scan finished with {} warning(s)", report.warnings.len());
    }
    GenerateOutcome { bom, report, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpecVersion;
    use tempfile::TempDir;

    const DOCUMENT: &str = r#"{
        "bomFormat": "CycloneDX",
        "specVersion": "1.6",
        "metadata": {"component": {"type": "application", "name": "app", "bom-ref": "app"}},
        "components": [
            {"type": "library", "name": "a", "purl": "pkg:npm/a@1", "scope": "required"},
            {"type": "library", "name": "b", "purl": "pkg:npm/b@1", "scope": "optional"}
        ],
        "dependencies": [{"ref": "app", "dependsOn": ["pkg:npm/a@1", "pkg:npm/b@1"]}]
    }"#;

    #[test]
    fn test_filter_document_marks_partial() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bom.json");
        std::fs::write(&path, DOCUMENT).unwrap();
        let config = AppConfig::builder().required_only(true).build();
        let outcome = filter_document(&path, &config).unwrap();
        assert!(outcome.is_partial());
        assert_eq!(outcome.bom.components.len(), 1);
        assert_eq!(outcome.bom.dependencies[0].depends_on, vec!["pkg:npm/a@1"]);
    }

    #[test]
    fn test_filter_document_projects_to_requested_version() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bom.json");
        let document = DOCUMENT
            .replace(r#""scope": "required"}"#, r#""scope": "required", "tags": ["x"]}"#)
            .replace(
                r#""dependsOn": ["pkg:npm/a@1", "pkg:npm/b@1"]}"#,
                r#""dependsOn": ["pkg:npm/a@1", "pkg:npm/b@1"], "provides": ["pkg:npm/a@1"]}"#,
            );
        std::fs::write(&path, document).unwrap();
        let config = AppConfig::builder()
            .required_only(true)
            .spec_version(SpecVersion::V1_5)
            .build();
        let outcome = filter_document(&path, &config).unwrap();
        let bom = outcome.bom;
        assert_eq!(bom.spec_version, SpecVersion::V1_5);
        assert!(bom.components[0].tags.is_empty());
        assert!(bom.dependencies.iter().all(|e| e.provides.is_none()));
        assert_eq!(bom.compositions.len(), 1);
    }

    #[test]
    fn test_filter_document_without_compositions_on_1_4() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bom.json");
        std::fs::write(&path, DOCUMENT).unwrap();
        let config = AppConfig::builder()
            .required_only(true)
            .spec_version(SpecVersion::V1_4)
            .build();
        let outcome = filter_document(&path, &config).unwrap();
        assert_eq!(outcome.bom.spec_version, SpecVersion::V1_4);
        assert!(outcome.is_partial());
        assert!(outcome.bom.compositions.is_empty());
    }

    #[test]
    fn test_merge_documents() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("one.cdx.json");
        let second = tmp.path().join("two.cdx.json");
        std::fs::write(&first, DOCUMENT).unwrap();
        std::fs::write(&second, DOCUMENT.replace("\"app\"", "\"other\"")).unwrap();
        let outcome = merge_documents(&[first, second], &AppConfig::default()).unwrap();
        assert!(!outcome.is_partial());
        assert_eq!(outcome.bom.components.len(), 2);
        let root = outcome.bom.metadata.component.unwrap();
        assert_eq!(root.name, "app");
        assert_eq!(root.components.len(), 1);
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.json");
        let err = filter_document(&path, &AppConfig::default()).unwrap_err();
        assert!(err.downcast_ref::<PipelineError>().is_some());
    }
}
