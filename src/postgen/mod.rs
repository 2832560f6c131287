//! Post-generation passes over an assembled document.
//!
//! [`post_process`] runs the graph filter and then records summary
//! metadata. Both passes consume and return the document.

mod filter;
mod metadata;

pub use filter::filter_bom;
pub use metadata::{
    apply_metadata, relative_dir, COMPONENT_NAMESPACES_PROPERTY, COMPONENT_SRC_FILES_PROPERTY,
    COMPONENT_TYPES_PROPERTY,
};

use crate::config::FilterConfig;
use crate::model::Bom;
use std::path::Path;

/// Filter `bom`, then add summary metadata.
#[must_use]
pub fn post_process(bom: Bom, filter: &FilterConfig, base_dir: Option<&Path>) -> Bom {
    let bom = filter_bom(bom, filter);
    apply_metadata(bom, base_dir)
}
