//! Default configurations and presets for sbom-graph.
//!
//! Provides named presets for common use cases and default values.

use super::types::{AppConfig, FilterConfig, OutputConfig};

// ============================================================================
// Default Values
// ============================================================================

/// Technique value that disables the technique filter.
pub const TECHNIQUE_AUTO: &str = "auto";

/// Default wall-clock timeout for an external command.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default cap on captured command output (100 MiB).
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 100 * 1024 * 1024;

/// Default consecutive failures before a command is skipped.
pub const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 5;

/// Purl-identity confidence used by the high-confidence preset.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Keep everything the extractors report
    Default,
    /// Drop optional and excluded components
    RequiredOnly,
    /// Drop components identified with low confidence
    HighConfidence,
    /// Compact output, fail on any extractor error
    Ci,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::RequiredOnly => "required-only",
            Self::HighConfidence => "high-confidence",
            Self::Ci => "ci",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "required-only" | "required" | "prod" | "production" => Some(Self::RequiredOnly),
            "high-confidence" | "confident" => Some(Self::HighConfidence),
            "ci" | "ci-cd" | "pipeline" => Some(Self::Ci),
            _ => None,
        }
    }

    /// Get a description of this preset.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Keep every component the extractors report",
            Self::RequiredOnly => "Keep only components required by the final build",
            Self::HighConfidence => "Drop components whose purl identity confidence is below 0.8",
            Self::Ci => "Compact JSON, fail on extractor errors and partial documents",
        }
    }

    /// Get all available presets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::RequiredOnly, Self::HighConfidence, Self::Ci]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Preset Implementations
// ============================================================================

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::RequiredOnly => Self::required_only_preset(),
            ConfigPreset::HighConfidence => Self::high_confidence_preset(),
            ConfigPreset::Ci => Self::ci_preset(),
        }
    }

    /// Production preset: only `required` components survive.
    #[must_use]
    pub fn required_only_preset() -> Self {
        Self {
            filter: FilterConfig {
                required_only: true,
                ..FilterConfig::default()
            },
            ..Self::default()
        }
    }

    /// High-confidence preset.
    ///
    /// Components with no purl identity evidence are kept; components whose
    /// best purl confidence is below the threshold are dropped.
    #[must_use]
    pub fn high_confidence_preset() -> Self {
        Self {
            filter: FilterConfig {
                min_confidence: HIGH_CONFIDENCE_THRESHOLD,
                ..FilterConfig::default()
            },
            ..Self::default()
        }
    }

    /// CI preset.
    ///
    /// - Compact JSON output
    /// - Any extractor failure aborts generation
    /// - Partial documents produce a distinct exit code
    #[must_use]
    pub fn ci_preset() -> Self {
        let mut config = Self {
            output: OutputConfig {
                file: None,
                pretty: false,
                fail_on_partial: true,
            },
            ..Self::default()
        };
        config.assembly.fail_on_error = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names_round_trip() {
        for preset in ConfigPreset::all() {
            assert_eq!(ConfigPreset::from_name(preset.name()), Some(*preset));
        }
        assert_eq!(ConfigPreset::from_name("PROD"), Some(ConfigPreset::RequiredOnly));
        assert_eq!(ConfigPreset::from_name("unknown"), None);
    }

    #[test]
    fn test_required_only_preset() {
        let config = AppConfig::from_preset(ConfigPreset::RequiredOnly);
        assert!(config.filter.required_only);
        assert!(config.filter.auto_compositions);
    }

    #[test]
    fn test_high_confidence_preset() {
        let config = AppConfig::from_preset(ConfigPreset::HighConfidence);
        assert!((config.filter.min_confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ci_preset() {
        let config = AppConfig::from_preset(ConfigPreset::Ci);
        assert!(config.assembly.fail_on_error);
        assert!(!config.output.pretty);
        assert!(config.output.fail_on_partial);
    }
}
