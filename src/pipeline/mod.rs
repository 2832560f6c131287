//! Pipeline orchestration for document generation.
//!
//! Shared orchestration for scan → aggregate → filter → write and for
//! re-processing existing documents, so the CLI handlers stay thin.

mod generate;
mod output;
mod parse;

pub use generate::{filter_document, generate, merge_documents, GenerateOutcome};
pub use output::{write_output, OutputTarget};
pub use parse::{parse_bom_str, parse_bom_with_context};

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to read or parse an input document
    #[error("Parse failed for {path}: {source}")]
    ParseFailed {
        path: String,
        source: anyhow::Error,
    },

    /// Scanning or aggregation failed
    #[error("Generation failed: {source}")]
    GenerationFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Serializing or writing the document failed
    #[error("Output failed: {source}")]
    OutputFailed {
        #[source]
        source: anyhow::Error,
    },
}

/// Exit codes for CI/CD integration
pub mod exit_codes {
    /// Document written
    pub const SUCCESS: i32 = 0;
    /// Document written, but the filter removed components and
    /// `--fail-on-partial` was set
    pub const PARTIAL: i32 = 1;
    /// An error occurred
    pub const ERROR: i32 = 3;
}
