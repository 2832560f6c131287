//! **Assemble one `CycloneDX` component and dependency graph from many extractors.**
//!
//! `sbom-graph` runs per-ecosystem extractors over a set of project paths and
//! folds their results into a single document: one record per component
//! identity, one edge per bom-ref, one authoritative root. A post-generation
//! filter then prunes the document while keeping the dependency graph closed.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: serde types for the `CycloneDX` JSON wire format, with
//!   spec-version projection at the serialization boundary.
//! - **[`merge`]**: identity merge of components and edge merge of
//!   dependency lists.
//! - **[`hierarchy`]**: root selection and the parent/sub-parent hierarchy.
//! - **[`extractors`]**: the [`Extractor`] seam, ecosystem order and the
//!   project-type allowlist.
//! - **[`aggregate`]**: the multi-ecosystem fold, parallel per path.
//! - **[`assembly`]**: document assembly and metadata.
//! - **[`postgen`]**: the graph filter and summary metadata.
//! - **[`pipeline`]**: generate, filter and merge as end-to-end stages.
//!
//! ## Getting Started
//!
//! ```no_run
//! use std::path::PathBuf;
//! use sbom_graph::{pipeline, AppConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::builder()
//!         .project_name("shop")
//!         .project_version("1.0.0")
//!         .required_only(true)
//!         .build();
//!     let outcome = pipeline::generate(&[PathBuf::from(".")], &config)?;
//!     println!("{}", outcome.bom.to_json(true)?);
//!     Ok(())
//! }
//! ```
//!
//! ### Merging graphs directly
//!
//! ```
//! use sbom_graph::merge::{merge_dependencies, trim_components};
//! use sbom_graph::model::{Component, DependencyEdge};
//!
//! let components = trim_components(vec![
//!     Component::library("lodash", "pkg:npm/lodash@4.17.21"),
//!     Component::library("lodash", "pkg:npm/lodash@4.17.21"),
//! ]);
//! assert_eq!(components.len(), 1);
//!
//! let edges = merge_dependencies(
//!     vec![DependencyEdge::depends("root", ["root", "a"])],
//!     vec![],
//!     None,
//! );
//! assert_eq!(edges[0].depends_on, vec!["a"]);
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    clippy::module_name_repetitions
)]

pub mod aggregate;
pub mod assembly;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod hierarchy;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod postgen;
pub mod utils;

// Re-export main types for convenience
pub use aggregate::create_multi_x_bom;
pub use assembly::{add_metadata, build_bom_ns_data, dedupe_bom};
pub use config::{AppConfig, AppConfigBuilder, ConfigPreset, FilterConfig};
pub use config::{ConfigError, Validatable};
pub use context::{ScanContext, ScanReport};
pub use error::{ErrorContext, Result, SbomGraphError};
pub use extractors::{Ecosystem, Extractor, ExtractorOutput, ExtractorRegistry};
pub use hierarchy::{determine_parent_component, ParentHierarchy};
pub use merge::{merge_dependencies, trim_components};
pub use model::{Bom, Component, DependencyEdge, SpecVersion};
pub use postgen::{apply_metadata, filter_bom, post_process};
