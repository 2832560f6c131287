//! Per-ecosystem extractors.
//!
//! An [`Extractor`] turns one filesystem path into an [`ExtractorOutput`]:
//! the packages it found, their edges and, optionally, the project's own
//! component. Extractors are black boxes to the aggregator. A failure is an
//! [`ExtractorErrorKind`] value, never a panic, and the aggregator decides
//! whether it is fatal.

mod command;
mod cyclonedx_file;
mod ecosystem;
mod output;

pub use command::CommandExtractor;
pub use cyclonedx_file::CycloneDxFileExtractor;
pub use ecosystem::{Ecosystem, ProjectTypeFilter, CONTAINER_TYPES, UNIVERSAL_TYPES};
pub use output::ExtractorOutput;

use crate::config::AppConfig;
use crate::context::ScanContext;
use crate::error::{ErrorContext, ExtractorErrorKind, Result};
use std::path::Path;
use std::sync::Arc;

/// Extracts components and edges of one ecosystem from a path.
pub trait Extractor: Send + Sync {
    /// Name used in logs and warnings.
    fn name(&self) -> &str;

    /// Ecosystem this extractor reports for.
    fn ecosystem(&self) -> Ecosystem;

    /// Run against `path`.
    ///
    /// Returning an empty output is not an error.
    fn extract(&self, path: &Path, ctx: &ScanContext) -> std::result::Result<ExtractorOutput, ExtractorErrorKind>;
}

/// Extractors grouped by ecosystem, in registration order.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|e| (e.ecosystem(), e.name().to_string())))
            .finish()
    }
}

impl ExtractorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in document extractor plus every configured command extractor.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(CycloneDxFileExtractor::new());
        for (index, extractor) in config.extractors.iter().enumerate() {
            let command = CommandExtractor::from_config(extractor)
                .with_context(|| format!("extractors[{index}]"))?;
            registry.register(command);
        }
        Ok(registry)
    }

    pub fn register(&mut self, extractor: impl Extractor + 'static) {
        self.extractors.push(Arc::new(extractor));
    }

    /// Extractors for `ecosystem`, in registration order.
    pub fn for_ecosystem(&self, ecosystem: Ecosystem) -> impl Iterator<Item = &Arc<dyn Extractor>> {
        self.extractors
            .iter()
            .filter(move |e| e.ecosystem() == ecosystem)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}
