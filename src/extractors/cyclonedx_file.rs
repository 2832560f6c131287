//! Reads `CycloneDX` documents that already exist in the scanned tree.

use super::{Ecosystem, Extractor, ExtractorOutput};
use crate::context::ScanContext;
use crate::error::ExtractorErrorKind;
use crate::model::{Bom, BOM_FORMAT};
use crate::utils::content_hash;
use std::path::{Path, PathBuf};

/// File names recognised as documents.
const DOCUMENT_NAMES: &[&str] = &["bom.json", "sbom.json"];
/// File suffixes recognised as documents.
const DOCUMENT_SUFFIXES: &[&str] = &[".cdx.json", ".bom.json", ".sbom.json"];

/// Extractor for existing `CycloneDX` JSON documents.
///
/// A file path is read directly; for a directory, documents at its top
/// level are read in name order. Parsed documents are cached in the scan
/// context by content hash.
#[derive(Debug, Clone, Default)]
pub struct CycloneDxFileExtractor;

impl CycloneDxFileExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn candidates(path: &Path) -> Vec<PathBuf> {
        if path.is_file() {
            return vec![path.to_path_buf()];
        }
        let Ok(entries) = std::fs::read_dir(path) else {
            return Vec::new();
        };
        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_document_name(p))
            .collect();
        found.sort();
        found
    }

    fn load(path: &Path, ctx: &ScanContext) -> Result<Option<Bom>, ExtractorErrorKind> {
        let bytes = std::fs::read(path)
            .map_err(|e| ExtractorErrorKind::Unparsable(format!("{}: {e}", path.display())))?;
        let hash = content_hash(&bytes);
        if let Some(bom) = ctx.cached_document(hash) {
            return Ok(Some(bom));
        }
        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Skipping {}: not JSON ({e})", path.display());
                return Ok(None);
            }
        };
        if value.get("bomFormat").and_then(serde_json::Value::as_str) != Some(BOM_FORMAT) {
            tracing::debug!("Skipping {}: not a CycloneDX document", path.display());
            return Ok(None);
        }
        let bom: Bom = serde_json::from_value(value)
            .map_err(|e| ExtractorErrorKind::Unparsable(format!("{}: {e}", path.display())))?;
        ctx.cache_document(hash, bom.clone());
        Ok(Some(bom))
    }
}

fn is_document_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_lowercase();
    DOCUMENT_NAMES.contains(&name.as_str()) || DOCUMENT_SUFFIXES.iter().any(|s| name.ends_with(s))
}

impl Extractor for CycloneDxFileExtractor {
    fn name(&self) -> &str {
        "cyclonedx-file"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Bom
    }

    fn extract(&self, path: &Path, ctx: &ScanContext) -> Result<ExtractorOutput, ExtractorErrorKind> {
        let mut output = ExtractorOutput::default();
        for file in Self::candidates(path) {
            if let Some(bom) = Self::load(&file, ctx)? {
                tracing::debug!(
                    "Read {} components from {}",
                    bom.components.len(),
                    file.display()
                );
                output.absorb(ExtractorOutput::from_bom(bom));
            }
        }
        Ok(output)
    }
}
