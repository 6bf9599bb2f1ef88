//! Bundle assembly: the full descriptor-to-archive pipeline.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::archive;
use crate::bundle::manifest::{
    bundle_file_name, descriptor_file_name, BundleManifest, LIB_JAR_ENTRY, MANIFEST_ENTRY,
    SHARED_RESOURCES_ENTRY,
};
use crate::bundle::BundleDescriptor;
use crate::compile::Compiler;
use crate::error::GantryError;
use crate::fs;
use crate::ham::AppDescriptor;
use crate::layout::RuntimeLayout;
use crate::library;
use crate::resolve::{resolve_scope, DependencyResolver};
use crate::template::TemplateEngine;

use super::component::ComponentBuilder;

/// Drives one bundle build end to end.
///
/// Components are built strictly in declaration order, one at a time. The
/// whole bundle is staged inside a scratch directory under the layout's
/// temp root and moved to the output directory only once every step has
/// succeeded, so a failed build never leaves a partial archive behind.
pub struct BundleAssembler<'a> {
    resolver: &'a dyn DependencyResolver,
    compiler: &'a dyn Compiler,
    templates: &'a dyn TemplateEngine,
}

impl<'a> BundleAssembler<'a> {
    pub fn new(
        resolver: &'a dyn DependencyResolver,
        compiler: &'a dyn Compiler,
        templates: &'a dyn TemplateEngine,
    ) -> Self {
        Self {
            resolver,
            compiler,
            templates,
        }
    }

    /// Build the bundle described by `descriptor` and write
    /// `<application_name>.hab` into `output_dir`, returning its path.
    pub fn assemble(
        &self,
        descriptor: &BundleDescriptor,
        layout: &RuntimeLayout,
        output_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        descriptor.validate()?;
        let application = descriptor.application_name.as_str();
        info!(
            application,
            components = descriptor.components.len(),
            "assembling bundle"
        );

        let scratch = fs::scratch_dir(layout.temp_dir())?;
        let stage = scratch.path();

        let shared_libraries = resolve_scope(self.resolver, descriptor.shared_dependencies())?;

        let builder = ComponentBuilder::new(self.compiler, self.templates);
        let mut scopes = vec![shared_libraries.clone()];
        let mut component_archives = Vec::new();
        for component in &descriptor.components {
            let component_libraries = resolve_scope(self.resolver, &component.dependencies)?;
            let built =
                builder.build(component, &shared_libraries, &component_libraries, stage)?;
            component_archives.push(built.archive_path);
            scopes.push(component_libraries);
        }

        // The merged library set, shared scope first. Always written, even
        // when empty, so deployment never has to probe for it.
        let merged = library::merge(&scopes);
        debug!(application, libraries = merged.len(), "merged library set");
        let library_paths: Vec<PathBuf> = merged.into_iter().map(|l| l.path).collect();
        let lib_jar = stage.join(LIB_JAR_ENTRY);
        std::fs::write(&lib_jar, archive::pack_files(&library_paths)?)
            .with_context(|| format!("Failed to write archive: {}", lib_jar.display()))?;

        let shared_resources_jar = match descriptor.shared_resources_dir() {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(GantryError::input(format!(
                        "shared resources directory not found: {}",
                        dir.display()
                    ))
                    .into());
                }
                let path = stage.join(SHARED_RESOURCES_ENTRY);
                std::fs::write(&path, archive::pack_dir(dir)?)
                    .with_context(|| format!("Failed to write archive: {}", path.display()))?;
                Some(path)
            }
            None => None,
        };

        let classnames: Vec<String> = descriptor
            .components
            .iter()
            .map(|c| c.classname.clone())
            .collect();

        let ham_path = stage.join(descriptor_file_name(application));
        std::fs::write(&ham_path, AppDescriptor::new(application, &classnames).to_json()?)
            .with_context(|| format!("Failed to write descriptor: {}", ham_path.display()))?;

        let bundle_manifest =
            BundleManifest::for_application(application, &classnames, shared_resources_jar.is_some());
        let manifest_path = stage.join(MANIFEST_ENTRY);
        std::fs::write(&manifest_path, bundle_manifest.to_json()?)
            .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;

        let mut entries = vec![manifest_path, ham_path, lib_jar];
        entries.extend(shared_resources_jar);
        entries.extend(component_archives);

        let bundle_name = bundle_file_name(application);
        let staged_bundle = stage.join(&bundle_name);
        std::fs::write(&staged_bundle, archive::pack_files(&entries)?)
            .with_context(|| format!("Failed to write bundle: {}", staged_bundle.display()))?;

        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;
        let target = output_dir.join(&bundle_name);
        fs::persist(&staged_bundle, &target)?;

        info!(bundle = %target.display(), "bundle assembled");
        Ok(target)
    }
}
