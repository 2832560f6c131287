//! Configuration module for sbom-graph.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets for common use cases
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sbom_graph::config::{AppConfig, ConfigPreset};
//!
//! // Use defaults
//! let config = AppConfig::default();
//!
//! // Use a preset
//! let config = AppConfig::from_preset(ConfigPreset::RequiredOnly);
//!
//! // Use builder
//! let config = AppConfig::builder()
//!     .project_name("shop")
//!     .min_confidence(0.8)
//!     .fail_on_error(true)
//!     .build();
//! ```
//!
//! # Configuration File
//!
//! Place a `.sbom-graph.yaml` file in your project root or `~/.config/sbom-graph/`:
//!
//! ```yaml
//! assembly:
//!   spec_version: "1.6"
//! filter:
//!   required_only: true
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    ConfigPreset, DEFAULT_CIRCUIT_BREAKER_THRESHOLD, DEFAULT_MAX_BUFFER_BYTES,
    DEFAULT_TIMEOUT_SECS, HIGH_CONFIDENCE_THRESHOLD, TECHNIQUE_AUTO,
};
pub use types::{
    AppConfig, AppConfigBuilder, AssemblyConfig, CommandExtractorConfig, ExecutionConfig,
    FilterConfig, OutputConfig, ProjectConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.sbom-graph.yaml` config files.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
