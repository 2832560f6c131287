//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".sbom-graph.yaml",
    ".sbom-graph.yml",
    "sbom-graph.yaml",
    "sbom-graph.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/sbom-graph/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path.filter(|p| p.exists()) {
        return Some(path.to_path_buf());
    }

    let cwd = std::env::current_dir().ok();
    let candidates = [
        cwd.clone(),
        find_git_root(),
        dirs::config_dir().map(|dir| dir.join("sbom-graph")),
        dirs::home_dir(),
    ];
    candidates
        .iter()
        .flatten()
        .find_map(|dir| find_config_in_dir(dir))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();

    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// File not found
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// IO error reading file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing error
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// Only values that differ from the defaults override, so CLI arguments
    /// that were not given leave file settings in place.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        // Project
        if other.project.name.is_some() {
            self.project.name.clone_from(&other.project.name);
        }
        if other.project.version.is_some() {
            self.project.version.clone_from(&other.project.version);
        }
        if other.project.group.is_some() {
            self.project.group.clone_from(&other.project.group);
        }
        if !other.project.project_type.is_empty() {
            self.project.project_type.clone_from(&other.project.project_type);
        }
        if !other.project.exclude_type.is_empty() {
            self.project.exclude_type.clone_from(&other.project.exclude_type);
        }
        if other.project.parent_component.is_some() {
            self.project.parent_component.clone_from(&other.project.parent_component);
        }

        // Assembly
        if other.assembly.spec_version != defaults.assembly.spec_version {
            self.assembly.spec_version = other.assembly.spec_version;
        }
        if other.assembly.fail_on_error {
            self.assembly.fail_on_error = true;
        }
        if !other.assembly.parallel_paths {
            self.assembly.parallel_paths = false;
        }
        if other.assembly.include_crypto {
            self.assembly.include_crypto = true;
        }
        if other.assembly.base_dir.is_some() {
            self.assembly.base_dir.clone_from(&other.assembly.base_dir);
        }

        // Filter
        if other.filter.min_confidence > 0.0 {
            self.filter.min_confidence = other.filter.min_confidence;
        }
        if other.filter.technique != defaults.filter.technique {
            self.filter.technique.clone_from(&other.filter.technique);
        }
        if other.filter.required_only {
            self.filter.required_only = true;
        }
        if !other.filter.only.is_empty() {
            self.filter.only.clone_from(&other.filter.only);
        }
        if !other.filter.filter.is_empty() {
            self.filter.filter.clone_from(&other.filter.filter);
        }
        if !other.filter.auto_compositions {
            self.filter.auto_compositions = false;
        }

        // Execution
        if other.execution.timeout_secs != defaults.execution.timeout_secs {
            self.execution.timeout_secs = other.execution.timeout_secs;
        }
        if other.execution.max_buffer_bytes != defaults.execution.max_buffer_bytes {
            self.execution.max_buffer_bytes = other.execution.max_buffer_bytes;
        }
        if other.execution.circuit_breaker_threshold != defaults.execution.circuit_breaker_threshold {
            self.execution.circuit_breaker_threshold = other.execution.circuit_breaker_threshold;
        }

        // Extractors accumulate
        for extractor in &other.extractors {
            if !self.extractors.contains(extractor) {
                self.extractors.push(extractor.clone());
            }
        }

        // Output
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if !other.output.pretty {
            self.output.pretty = false;
        }
        if other.output.fail_on_partial {
            self.output.fail_on_partial = true;
        }
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# sbom-graph configuration
# Place this file at .sbom-graph.yaml in your project root or ~/.config/sbom-graph/

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandExtractorConfig;
    use crate::model::SpecVersion;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".sbom-graph.yaml");
        std::fs::write(&config_path, "filter:\n  required_only: true\n").unwrap();

        assert_eq!(find_config_in_dir(tmp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");

        let yaml = r#"
project:
  name: shop
  project_type: [js, python]
assembly:
  spec_version: "1.5"
filter:
  min_confidence: 0.5
  only: ["npm"]
extractors:
  - name: syft-js
    ecosystem: js
    program: syft
    args: ["{path}", "-o", "cyclonedx-json"]
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("shop"));
        assert_eq!(config.project.project_type, vec!["js", "python"]);
        assert_eq!(config.assembly.spec_version, SpecVersion::V1_5);
        assert_eq!(config.filter.min_confidence, 0.5);
        assert_eq!(config.extractors.len(), 1);
        assert_eq!(config.extractors[0].args[0], "{path}");
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_load_config_file_invalid_yaml() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("bad.yaml");
        std::fs::write(&config_path, "assembly:\n  spec_version: '2.0'\n").unwrap();
        assert!(matches!(
            load_config_file(&config_path),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::builder()
            .project_name("from-file")
            .required_only(true)
            .build();
        let overrides = AppConfig::builder()
            .project_name("from-cli")
            .spec_version(SpecVersion::V1_7)
            .pretty(false)
            .extractor(CommandExtractorConfig {
                name: "x".to_string(),
                ecosystem: "go".to_string(),
                program: "x".to_string(),
                args: vec![],
                manifests: vec![],
            })
            .build();

        base.merge(&overrides);

        assert_eq!(base.project.name.as_deref(), Some("from-cli"));
        assert_eq!(base.assembly.spec_version, SpecVersion::V1_7);
        assert!(base.filter.required_only);
        assert!(!base.output.pretty);
        assert_eq!(base.extractors.len(), 1);
    }

    #[test]
    fn test_generate_example_config() {
        let example = generate_example_config();
        assert!(example.contains("assembly:"));
        assert!(example.contains("min_confidence"));
        let parsed: AppConfig = serde_yaml::from_str(&example).unwrap();
        assert!(parsed.filter.auto_compositions);
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        std::fs::write(&config_path, "output:\n  pretty: false\n").unwrap();

        assert_eq!(discover_config_file(Some(&config_path)), Some(config_path));
    }
}
