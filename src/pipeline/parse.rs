//! Reading existing documents.

use crate::error::{ParseErrorKind, SbomGraphError};
use crate::model::{Bom, BOM_FORMAT};
use anyhow::Result;
use std::path::Path;

/// Parse a `CycloneDX` document from JSON text.
pub fn parse_bom_str(content: &str) -> crate::Result<Bom> {
    use crate::error::ErrorContext;

    let bom = Bom::from_json_str(content).context("Invalid CycloneDX JSON")?;
    if bom.bom_format != BOM_FORMAT {
        return Err(SbomGraphError::parse(
            format!("unexpected bomFormat '{}'", bom.bom_format),
            ParseErrorKind::NotCycloneDx,
        ));
    }
    Ok(bom)
}

/// Parse a document with context for error messages
pub fn parse_bom_with_context(path: &Path, quiet: bool) -> Result<Bom> {
    use anyhow::Context;

    if !quiet {
        tracing::info!("Parsing document: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let bom = parse_bom_str(&content)
        .with_context(|| format!("Failed to parse document: {}", path.display()))?;
    if !quiet {
        tracing::info!(
            "Parsed {} components and {} dependency edges",
            bom.components.len(),
            bom.dependencies.len()
        );
    }
    Ok(bom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_document() {
        let bom = parse_bom_str(r#"{"bomFormat":"CycloneDX","specVersion":"1.5"}"#).unwrap();
        assert!(bom.components.is_empty());
        assert_eq!(bom.version, 1);
    }

    #[test]
    fn test_rejects_other_formats() {
        let err = parse_bom_str(r#"{"bomFormat":"SPDX","specVersion":"1.5"}"#).unwrap_err();
        assert!(matches!(
            err,
            SbomGraphError::Parse {
                source: ParseErrorKind::NotCycloneDx,
                ..
            }
        ));
        assert!(err.to_string().contains("SPDX"));

        match parse_bom_str("not json").unwrap_err() {
            SbomGraphError::Parse {
                context,
                source: ParseErrorKind::InvalidJson(_),
            } => assert_eq!(context, "Invalid CycloneDX JSON: JSON deserialization"),
            other => panic!("Expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn test_error_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = parse_bom_with_context(&path, true).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
