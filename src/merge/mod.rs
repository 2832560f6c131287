//! Component and edge merging.
//!
//! Both merges are pure folds: they consume their inputs and return a new
//! list, so no caller ever observes a list another stage is still building.

mod components;
mod edges;

pub use components::{merge_component, merge_scope, trim_components};
pub use edges::merge_dependencies;
