//! Configuration template seam.
//!
//! A component may name a configuration template; the engine collaborator
//! turns it into the concrete config file packed next to the component's
//! classes. Substitution values belong to the engine, not to the build
//! pipeline. [`CopyTemplates`] is the identity engine for templates that
//! are already concrete.

use std::path::{Path, PathBuf};

/// Trait for rendering one configuration template into an output directory.
pub trait TemplateEngine: Send + Sync {
    /// Render `template` under `out_dir` and return the rendered file path.
    fn render(&self, template: &Path, out_dir: &Path) -> anyhow::Result<PathBuf>;
}

/// Engine that copies templates verbatim, keeping their file names.
#[derive(Debug, Clone, Default)]
pub struct CopyTemplates;

impl TemplateEngine for CopyTemplates {
    fn render(&self, template: &Path, out_dir: &Path) -> anyhow::Result<PathBuf> {
        crate::fs::copy_into(template, out_dir)
    }
}
