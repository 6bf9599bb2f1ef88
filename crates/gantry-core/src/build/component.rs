//! Per-component build: compile, pack, and stage one component archive.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::archive;
use crate::bundle::manifest::{component_entry, component_resources_entry};
use crate::bundle::ComponentDescriptor;
use crate::compile::Compiler;
use crate::error::GantryError;
use crate::fs;
use crate::library::{self, LibraryFile};
use crate::template::TemplateEngine;

/// A staged component archive, ready for bundle assembly.
#[derive(Debug, Clone)]
pub struct BuiltComponent {
    pub classname: String,
    pub archive_path: PathBuf,
}

/// Builds one component at a time inside a caller-owned scratch root.
///
/// Every build claims a private temporary directory under the scratch root
/// and releases it on both success and failure; only the final component
/// archive survives, staged directly at the scratch root.
pub struct ComponentBuilder<'a> {
    compiler: &'a dyn Compiler,
    templates: &'a dyn TemplateEngine,
}

impl<'a> ComponentBuilder<'a> {
    pub fn new(compiler: &'a dyn Compiler, templates: &'a dyn TemplateEngine) -> Self {
        Self {
            compiler,
            templates,
        }
    }

    /// Compile and pack `component`, returning the staged archive.
    ///
    /// Libraries are merged shared-scope first, so a component can never
    /// shadow a shared library of the same name.
    pub fn build(
        &self,
        component: &ComponentDescriptor,
        shared_libraries: &[LibraryFile],
        component_libraries: &[LibraryFile],
        scratch_root: &Path,
    ) -> anyhow::Result<BuiltComponent> {
        let classname = component.classname.as_str();
        info!(classname, "building component");

        if !component.source_dir.is_dir() {
            return Err(GantryError::input(format!(
                "component '{}' source directory not found: {}",
                classname,
                component.source_dir.display()
            ))
            .into());
        }

        let libraries = library::merge(&[
            shared_libraries.to_vec(),
            component_libraries.to_vec(),
        ]);

        let workdir = fs::scratch_dir(scratch_root)?;
        let classes_dir = workdir.path().join("classes");
        std::fs::create_dir_all(&classes_dir)
            .with_context(|| format!("Failed to create directory: {}", classes_dir.display()))?;

        self.compiler
            .compile(&component.source_dir, &classes_dir, &libraries)
            .map_err(|e| GantryError::Compile {
                classname: classname.to_string(),
                diagnostics: format!("{e:#}"),
            })?;

        let class_archive = workdir.path().join(component_entry(classname));
        std::fs::write(&class_archive, archive::pack_dir(&classes_dir)?)
            .with_context(|| format!("Failed to write archive: {}", class_archive.display()))?;
        let mut parts = vec![class_archive];

        if let Some(template) = &component.config_template {
            if !template.is_file() {
                return Err(GantryError::input(format!(
                    "component '{}' config template not found: {}",
                    classname,
                    template.display()
                ))
                .into());
            }
            parts.push(self.templates.render(template, workdir.path())?);
        }

        if let Some(resources_dir) = &component.resources_dir {
            if !resources_dir.is_dir() {
                return Err(GantryError::input(format!(
                    "component '{}' resources directory not found: {}",
                    classname,
                    resources_dir.display()
                ))
                .into());
            }
            let resources_archive = workdir.path().join(component_resources_entry(classname));
            std::fs::write(&resources_archive, archive::pack_dir(resources_dir)?)
                .with_context(|| {
                    format!("Failed to write archive: {}", resources_archive.display())
                })?;
            parts.push(resources_archive);
        }

        let archive_path = scratch_root.join(component_entry(classname));
        std::fs::write(&archive_path, archive::pack_files(&parts)?)
            .with_context(|| format!("Failed to write archive: {}", archive_path.display()))?;

        Ok(BuiltComponent {
            classname: classname.to_string(),
            archive_path,
        })
    }
}
