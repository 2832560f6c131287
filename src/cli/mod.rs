//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand
//! and returns the process exit code.

mod filter;
mod generate;

pub use filter::run_filter;
pub use generate::{run_generate, run_merge};

use crate::config::{load_or_default, AppConfig, ConfigPreset, Validatable};
use crate::pipeline::{exit_codes, write_output, GenerateOutcome, OutputTarget, PipelineError};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Layer configuration: file (or defaults), then a preset, then CLI values.
///
/// The result is validated; every problem is reported at once.
pub fn resolve_config(
    config_path: Option<&Path>,
    preset: Option<&str>,
    overrides: &AppConfig,
) -> Result<AppConfig> {
    let (mut config, loaded_from) = load_or_default(config_path);
    if let Some(path) = loaded_from {
        tracing::debug!("Loaded configuration from {}", path.display());
    }
    if let Some(name) = preset {
        let Some(preset) = ConfigPreset::from_name(name) else {
            let known: Vec<&str> = ConfigPreset::all().iter().map(ConfigPreset::name).collect();
            bail!("Unknown preset '{name}' (expected one of: {})", known.join(", "));
        };
        config.merge(&AppConfig::from_preset(preset));
    }
    config.merge(overrides);

    let errors = config.validate();
    if !errors.is_empty() {
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", lines.join("\n  "));
    }
    Ok(config)
}

/// Write the document (and optionally the scan report) and pick the exit code.
fn emit(
    outcome: &GenerateOutcome,
    config: &AppConfig,
    report_file: Option<PathBuf>,
    quiet: bool,
) -> Result<i32> {
    let json = outcome
        .bom
        .to_json(config.output.pretty)
        .map_err(|e| PipelineError::OutputFailed { source: e.into() })?;
    let target = OutputTarget::from_option(config.output.file.clone());
    write_output(&json, &target, quiet)?;

    if let Some(path) = report_file {
        let report = serde_json::to_string_pretty(&outcome.report)
            .context("Failed to serialize scan report")?;
        write_output(&report, &OutputTarget::File(path), quiet)?;
    }
    for program in &outcome.report.open_circuits {
        tracing::warn!("{} was disabled after repeated failures", program);
    }

    if outcome.is_partial() {
        if !quiet {
            tracing::info!("Filter removed {} components", outcome.removed);
        }
        if config.output.fail_on_partial {
            return Ok(exit_codes::PARTIAL);
        }
    }
    Ok(exit_codes::SUCCESS)
}
