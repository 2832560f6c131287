//! Configuration types for sbom-graph operations.
//!
//! Provides structured configuration for generation, filtering and output.

use crate::extractors::ProjectTypeFilter;
use crate::model::{Component, SpecVersion};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// CLI arguments are layered over file settings with [`AppConfig::merge`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Project identity and project-type selection
    pub project: ProjectConfig,
    /// Document assembly options
    pub assembly: AssemblyConfig,
    /// Post-generation filter options
    pub filter: FilterConfig,
    /// External command execution limits
    pub execution: ExecutionConfig,
    /// User-declared external-command extractors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extractors: Vec<CommandExtractorConfig>,
    /// Output configuration
    pub output: OutputConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the project name used for the root component.
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.config.project.name = Some(name.into());
        self
    }

    /// Set the project version used for the root component.
    pub fn project_version(mut self, version: impl Into<String>) -> Self {
        self.config.project.version = Some(version.into());
        self
    }

    /// Set the project group used for the root component.
    pub fn project_group(mut self, group: impl Into<String>) -> Self {
        self.config.project.group = Some(group.into());
        self
    }

    /// Restrict extraction to these project types.
    pub fn project_types(mut self, types: Vec<String>) -> Self {
        self.config.project.project_type = types;
        self
    }

    /// Exclude these project types from extraction.
    pub fn exclude_types(mut self, types: Vec<String>) -> Self {
        self.config.project.exclude_type = types;
        self
    }

    /// Use a pre-built root component.
    pub fn parent_component(mut self, parent: Component) -> Self {
        self.config.project.parent_component = Some(parent);
        self
    }

    /// Set the output spec version.
    pub const fn spec_version(mut self, version: SpecVersion) -> Self {
        self.config.assembly.spec_version = version;
        self
    }

    /// Abort generation on the first extractor failure.
    pub const fn fail_on_error(mut self, fail: bool) -> Self {
        self.config.assembly.fail_on_error = fail;
        self
    }

    /// Scan input paths concurrently.
    pub const fn parallel_paths(mut self, parallel: bool) -> Self {
        self.config.assembly.parallel_paths = parallel;
        self
    }

    /// Collect cryptographic assets (CycloneDX 1.6 and later).
    pub const fn include_crypto(mut self, include: bool) -> Self {
        self.config.assembly.include_crypto = include;
        self
    }

    /// Base directory for relative `SrcFile` paths.
    pub fn base_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.assembly.base_dir = dir;
        self
    }

    /// Drop components below this purl-identity confidence.
    pub const fn min_confidence(mut self, confidence: f64) -> Self {
        self.config.filter.min_confidence = confidence;
        self
    }

    /// Allowed identity techniques.
    pub fn techniques(mut self, techniques: Vec<String>) -> Self {
        self.config.filter.technique = techniques;
        self
    }

    /// Keep only `required` components.
    pub const fn required_only(mut self, required_only: bool) -> Self {
        self.config.filter.required_only = required_only;
        self
    }

    /// Keep only components whose purl contains every one of these strings.
    pub fn only(mut self, only: Vec<String>) -> Self {
        self.config.filter.only = only;
        self
    }

    /// Drop components whose purl or property values contain any of these strings.
    pub fn exclude_matching(mut self, filter: Vec<String>) -> Self {
        self.config.filter.filter = filter;
        self
    }

    /// Record a composition when the filter removes components.
    pub const fn auto_compositions(mut self, enabled: bool) -> Self {
        self.config.filter.auto_compositions = enabled;
        self
    }

    /// Set the per-command timeout.
    pub const fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.execution.timeout_secs = secs;
        self
    }

    /// Add an external-command extractor.
    pub fn extractor(mut self, extractor: CommandExtractorConfig) -> Self {
        self.config.extractors.push(extractor);
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Pretty-print the output document.
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.config.output.pretty = pretty;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Project identity and project-type selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root component name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root component version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Root component group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Project types to scan (empty scans every ecosystem)
    pub project_type: Vec<String>,
    /// Project types to skip; an exclusion always wins
    pub exclude_type: Vec<String>,
    /// Pre-built root component, takes priority over every other source
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub parent_component: Option<Component>,
}

impl ProjectConfig {
    /// The project-type allowlist for this configuration.
    #[must_use]
    pub fn type_filter(&self) -> ProjectTypeFilter {
        ProjectTypeFilter::new(&self.project_type, &self.exclude_type)
    }
}

/// Document assembly options.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Output spec version: 1.4, 1.5, 1.6 or 1.7
    #[schemars(with = "String")]
    pub spec_version: SpecVersion,
    /// Abort generation when an extractor fails
    pub fail_on_error: bool,
    /// Scan input paths concurrently
    pub parallel_paths: bool,
    /// Collect cryptographic assets (requires CycloneDX 1.6 or later)
    pub include_crypto: bool,
    /// Base directory that `SrcFile` paths are made relative to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            spec_version: SpecVersion::default(),
            fail_on_error: false,
            parallel_paths: true,
            include_crypto: false,
            base_dir: None,
        }
    }
}

/// Post-generation filter options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum purl-identity confidence (0 disables the check)
    #[schemars(range(min = 0.0, max = 1.0))]
    pub min_confidence: f64,
    /// Allowed identity techniques; `auto` disables the check
    pub technique: Vec<String>,
    /// Keep only components with `required` scope
    pub required_only: bool,
    /// Keep only components whose purl contains all of these strings
    pub only: Vec<String>,
    /// Drop components whose purl or property values contain any of these strings
    pub filter: Vec<String>,
    /// Record an incomplete composition when anything was removed
    pub auto_compositions: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            technique: vec![super::defaults::TECHNIQUE_AUTO.to_string()],
            required_only: false,
            only: Vec::new(),
            filter: Vec::new(),
            auto_compositions: true,
        }
    }
}

impl FilterConfig {
    /// Whether any option would remove components.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.min_confidence > 0.0
            || self.technique_filter_active()
            || self.required_only
            || self.only.iter().any(|s| !s.is_empty())
            || self.filter.iter().any(|s| !s.is_empty())
    }

    /// Whether the technique allowlist is in effect.
    #[must_use]
    pub fn technique_filter_active(&self) -> bool {
        !self.technique.is_empty()
            && !self
                .technique
                .iter()
                .any(|t| t.eq_ignore_ascii_case(super::defaults::TECHNIQUE_AUTO))
    }
}

/// External command execution limits.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Wall-clock timeout per command, in seconds
    #[schemars(range(min = 1))]
    pub timeout_secs: u64,
    /// Maximum captured output per command, in bytes
    #[schemars(range(min = 1))]
    pub max_buffer_bytes: usize,
    /// Consecutive failures before a command is no longer invoked
    #[schemars(range(min = 1))]
    pub circuit_breaker_threshold: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: super::defaults::DEFAULT_TIMEOUT_SECS,
            max_buffer_bytes: super::defaults::DEFAULT_MAX_BUFFER_BYTES,
            circuit_breaker_threshold: super::defaults::DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
        }
    }
}

/// A user-declared extractor backed by an external command.
///
/// The command must print (or write to `{output}`) either extractor output JSON
/// (`pkgList`/`dependenciesList`/`parentComponent`) or a `CycloneDX` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommandExtractorConfig {
    /// Extractor name used in logs and the scan report
    pub name: String,
    /// Ecosystem name or alias this extractor reports for
    pub ecosystem: String,
    /// Program to run, resolved on `PATH`
    pub program: String,
    /// Arguments; `{path}` is replaced with the scanned path and `{output}`
    /// with a scratch file the program writes its output to
    #[serde(default)]
    pub args: Vec<String>,
    /// Only run when one of these files exists in the scanned path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifests: Vec<String>,
}

/// Output-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Pretty-print JSON
    pub pretty: bool,
    /// Exit with a distinct code when the filter produced a partial document
    pub fail_on_partial: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: None,
            pretty: true,
            fail_on_partial: false,
        }
    }
}
