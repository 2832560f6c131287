//! Data model of the assembled document.
//!
//! These are serde types for the `CycloneDX` JSON wire format. They keep the
//! fields the engine reasons about typed (identity, scope, evidence, edges)
//! and carry everything else through untouched, so that reading and writing a
//! document does not lose data the engine does not understand.

mod bom;
mod component;
mod dependency;
mod evidence;
mod identifiers;
mod spec_version;

pub use bom::*;
pub(crate) use component::deserialize_lenient;
pub use component::{components_from_values, Component, ComponentType, Hash, Property, Scope};
pub use dependency::*;
pub use evidence::*;
pub use identifiers::*;
pub use spec_version::*;
