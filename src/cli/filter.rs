//! `filter` command handler.

use super::emit;
use crate::config::AppConfig;
use crate::pipeline::filter_document;
use anyhow::Result;
use std::path::Path;

/// Post-process an existing document and write the result.
pub fn run_filter(input: &Path, config: &AppConfig, quiet: bool) -> Result<i32> {
    if !config.filter.is_active() && !quiet {
        tracing::info!("No filter options given; only metadata will be added");
    }
    let outcome = filter_document(input, config)?;
    emit(&outcome, config, None, quiet)
}
