//! Gantry Core Library
//!
//! Provides the domain logic for building application bundles and
//! deploying them into a runtime installation tree.

pub mod archive;
pub mod build;
pub mod bundle;
pub mod compile;
pub mod deploy;
pub mod error;
pub mod fs;
pub mod ham;
pub mod launch;
pub mod layout;
pub mod library;
pub mod resolve;
pub mod template;

/// Re-exports of commonly used types
pub mod prelude {
    // Descriptors
    pub use crate::bundle::{
        BundleDescriptor, BundleManifest, ComponentDescriptor, DependencyRef, SharedScope,
    };
    pub use crate::ham::{AppDescriptor, ComponentEntry, ResolvedAppDescriptor};

    // Build pipeline
    pub use crate::build::{BuiltComponent, BundleAssembler, ComponentBuilder};
    pub use crate::compile::{CommandCompiler, Compiler};
    pub use crate::resolve::{DependencyResolver, DirectoryResolver};
    pub use crate::template::{CopyTemplates, TemplateEngine};

    // Deployment
    pub use crate::deploy::{deploy, deployed_apps};

    // Launch
    pub use crate::launch::{LaunchConfig, ScriptKind, build_classpath};
    pub use crate::layout::RuntimeLayout;

    // Errors
    pub use crate::error::GantryError;
}
