//! Unified error types for sbom-graph.
//!
//! Merge, assembly and filter operations are total and never return errors.
//! Errors come from the edges of the engine: reading documents, running
//! extractors, and loading configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sbom-graph operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SbomGraphError {
    /// Errors reading a document or extractor output
    #[error("Failed to parse document: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// Errors raised by an extractor
    #[error("Extractor failed: {context}: {source}")]
    Extractor {
        context: String,
        #[source]
        source: ExtractorErrorKind,
    },

    /// Errors that abort an assembly run
    #[error("Assembly aborted: {context}")]
    Assembly {
        context: String,
        #[source]
        source: AssemblyErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Not a CycloneDX document")]
    NotCycloneDx,

    #[error("Unsupported spec version: {0}")]
    UnsupportedVersion(String),

    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),
}

/// Specific extractor error kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractorErrorKind {
    #[error("Tool not found in PATH: {0}")]
    ToolMissing(String),

    #[error("Failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("{program} produced more than {limit} bytes of output")]
    OutputTooLarge { program: String, limit: usize },

    #[error("Failed to read output of {program}: {reason}")]
    Capture { program: String, reason: String },

    #[error("Unparsable extractor output: {0}")]
    Unparsable(String),

    #[error("Circuit open for {0} after repeated failures")]
    CircuitOpen(String),
}

/// Specific assembly error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AssemblyErrorKind {
    #[error("{ecosystem} extractor failed for {path} with fail-on-error set: {reason}")]
    ExtractorAborted {
        ecosystem: String,
        path: String,
        reason: String,
    },
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for sbom-graph operations
pub type Result<T> = std::result::Result<T, SbomGraphError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl SbomGraphError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create an extractor error with context
    pub fn extractor(context: impl Into<String>, source: ExtractorErrorKind) -> Self {
        Self::Extractor {
            context: context.into(),
            source,
        }
    }

    /// Create an assembly error with context
    pub fn assembly(context: impl Into<String>, source: AssemblyErrorKind) -> Self {
        Self::Assembly {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for SbomGraphError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SbomGraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<crate::model::UnsupportedSpecVersion> for SbomGraphError {
    fn from(err: crate::model::UnsupportedSpecVersion) -> Self {
        Self::parse("spec version", ParseErrorKind::UnsupportedVersion(err.0))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// The context string is prepended to the error's existing context,
/// creating a chain that shows the path through the code.
///
/// ```ignore
/// use sbom_graph::error::ErrorContext;
///
/// let content = std::fs::read_to_string(path).context("reading extractor output")?;
/// let bom = Bom::from_json_str(&content)
///     .with_context(|| format!("parsing {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<SbomGraphError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: SbomGraphError, new_ctx: &str) -> SbomGraphError {
    match err {
        SbomGraphError::Parse {
            context: existing,
            source,
        } => SbomGraphError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomGraphError::Extractor {
            context: existing,
            source,
        } => SbomGraphError::Extractor {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomGraphError::Assembly {
            context: existing,
            source,
        } => SbomGraphError::Assembly {
            context: chain_context(new_ctx, &existing),
            source,
        },
        SbomGraphError::Io {
            path,
            message,
            source,
        } => SbomGraphError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        SbomGraphError::Config(msg) => SbomGraphError::Config(chain_context(new_ctx, &msg)),
        SbomGraphError::Validation(msg) => SbomGraphError::Validation(chain_context(new_ctx, &msg)),
    }
}

/// Chain two context strings together as "`new`: `existing`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}
