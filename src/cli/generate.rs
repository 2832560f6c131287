//! `generate` and `merge` command handlers.

use super::emit;
use crate::config::AppConfig;
use crate::pipeline::{generate, merge_documents};
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Scan `paths` and write one document.
pub fn run_generate(
    paths: Vec<PathBuf>,
    config: &AppConfig,
    report_file: Option<PathBuf>,
    quiet: bool,
) -> Result<i32> {
    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };
    for path in &paths {
        if !path.exists() {
            bail!("Path does not exist: {}", path.display());
        }
    }
    if !quiet {
        tracing::info!(
            "Generating CycloneDX {} document for {} path(s)",
            config.assembly.spec_version,
            paths.len()
        );
    }
    let outcome = generate(&paths, config)?;
    emit(&outcome, config, report_file, quiet)
}

/// Aggregate existing documents and write the result.
pub fn run_merge(inputs: Vec<PathBuf>, config: &AppConfig, quiet: bool) -> Result<i32> {
    if inputs.is_empty() {
        bail!("merge needs at least one input document");
    }
    if let Some(missing) = inputs.iter().find(|p| !p.is_file()) {
        bail!("Not a file: {}", missing.display());
    }
    let outcome = merge_documents(&inputs, config)?;
    emit(&outcome, config, None, quiet)
}
