//! Build pipeline: per-component builds and whole-bundle assembly.

mod bundle;
mod component;

pub use bundle::BundleAssembler;
pub use component::{BuiltComponent, ComponentBuilder};
