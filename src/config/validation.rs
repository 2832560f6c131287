//! Configuration validation for sbom-graph.
//!
//! Provides validation traits and implementations for all configuration types.

use super::defaults::TECHNIQUE_AUTO;
use super::types::*;
use crate::extractors::Ecosystem;
use crate::model::Technique;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.project.validate());
        errors.extend(self.assembly.validate());
        errors.extend(self.filter.validate());
        errors.extend(self.execution.validate());
        for (idx, extractor) in self.extractors.iter().enumerate() {
            errors.extend(extractor.validate().into_iter().map(|mut e| {
                e.field = format!("extractors[{idx}].{}", e.field);
                e
            }));
        }
        errors.extend(self.output.validate());
        errors
    }
}

impl Validatable for ProjectConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(ref parent) = self.parent_component {
            if parent.name.trim().is_empty() {
                errors.push(ConfigError::new(
                    "project.parent_component.name",
                    "Parent component must have a name",
                ));
            }
        }
        if self.version.is_some() && self.name.is_none() {
            errors.push(ConfigError::new(
                "project.version",
                "A project version requires a project name",
            ));
        }
        errors
    }
}

impl Validatable for AssemblyConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.include_crypto && !self.spec_version.supports_crypto() {
            errors.push(ConfigError::new(
                "assembly.include_crypto",
                format!(
                    "Cryptographic assets require spec version 1.6 or later, got {}",
                    self.spec_version
                ),
            ));
        }
        if let Some(ref dir) = self.base_dir {
            if !dir.is_dir() {
                errors.push(ConfigError::new(
                    "assembly.base_dir",
                    format!("Base directory does not exist: {}", dir.display()),
                ));
            }
        }
        errors
    }
}

impl Validatable for FilterConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.min_confidence) {
            errors.push(ConfigError::new(
                "filter.min_confidence",
                format!(
                    "Confidence must be between 0.0 and 1.0, got {}",
                    self.min_confidence
                ),
            ));
        }
        for technique in &self.technique {
            if technique.eq_ignore_ascii_case(TECHNIQUE_AUTO) {
                continue;
            }
            if matches!(Technique::from(technique.clone()), Technique::Other(_)) {
                errors.push(ConfigError::new(
                    "filter.technique",
                    format!("Unknown identity technique '{technique}'"),
                ));
            }
        }
        errors
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new(
                "execution.timeout_secs",
                "Timeout must be at least one second",
            ));
        }
        if self.max_buffer_bytes == 0 {
            errors.push(ConfigError::new(
                "execution.max_buffer_bytes",
                "Output buffer limit must be greater than zero",
            ));
        }
        if self.circuit_breaker_threshold == 0 {
            errors.push(ConfigError::new(
                "execution.circuit_breaker_threshold",
                "Circuit breaker threshold must be at least 1",
            ));
        }
        errors
    }
}

impl Validatable for CommandExtractorConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ConfigError::new("name", "Extractor name must not be empty"));
        }
        if self.program.trim().is_empty() {
            errors.push(ConfigError::new("program", "Program must not be empty"));
        }
        if Ecosystem::from_name(&self.ecosystem).is_none() {
            errors.push(ConfigError::new(
                "ecosystem",
                format!("Unknown ecosystem '{}'", self.ecosystem),
            ));
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Some(ref file_path) = self.file {
            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(ConfigError::new(
                        "output.file",
                        format!("Parent directory does not exist: {}", parent.display()),
                    ));
                }
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ComponentType, SpecVersion};

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.is_valid(), "{:?}", config.validate());
    }

    #[test]
    fn test_min_confidence_range() {
        let filter = FilterConfig {
            min_confidence: 1.5,
            ..FilterConfig::default()
        };
        let errors = filter.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "filter.min_confidence");
    }

    #[test]
    fn test_unknown_technique() {
        let filter = FilterConfig {
            technique: vec!["manifest-analysis".to_string(), "guessing".to_string()],
            ..FilterConfig::default()
        };
        let errors = filter.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("guessing"));
    }

    #[test]
    fn test_crypto_requires_spec_1_6() {
        let assembly = AssemblyConfig {
            spec_version: SpecVersion::V1_5,
            include_crypto: true,
            ..AssemblyConfig::default()
        };
        assert!(!assembly.is_valid());
    }

    #[test]
    fn test_extractor_errors_are_indexed() {
        let config = AppConfig::builder()
            .extractor(CommandExtractorConfig {
                name: "syft".to_string(),
                ecosystem: "cobol".to_string(),
                program: "syft".to_string(),
                args: vec![],
                manifests: vec![],
            })
            .build();
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "extractors[0].ecosystem");
    }

    #[test]
    fn test_parent_component_needs_name() {
        let project = ProjectConfig {
            parent_component: Some(Component::new(ComponentType::Application, " ")),
            ..ProjectConfig::default()
        };
        assert_eq!(project.validate().len(), 1);
    }

    #[test]
    fn test_zero_timeout() {
        let execution = ExecutionConfig {
            timeout_secs: 0,
            ..ExecutionConfig::default()
        };
        assert_eq!(execution.validate()[0].field, "execution.timeout_secs");
    }
}
