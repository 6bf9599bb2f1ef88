//! Bundle installation: manifest-driven extraction into the runtime tree.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::archive;
use crate::bundle::manifest::{
    component_entry, component_resources_entry, BundleManifest, MANIFEST_ENTRY,
};
use crate::fs;
use crate::ham::AppDescriptor;
use crate::layout::RuntimeLayout;

/// Install a bundle archive into the runtime tree and return the deployed
/// application directory.
///
/// Deployment always replaces: any previous installation of the same
/// application is deleted before the first new file lands, so the tree can
/// never mix files from two bundle versions. Libraries whose names are
/// already provided by the platform's bin directory are skipped.
pub fn deploy(bundle_path: &Path, layout: &RuntimeLayout) -> anyhow::Result<PathBuf> {
    let manifest_json = archive::read_entry(bundle_path, MANIFEST_ENTRY)?;
    let manifest = BundleManifest::from_json(
        std::str::from_utf8(&manifest_json).context("Bundle manifest is not UTF-8")?,
    )?;

    let ham_json = archive::read_entry(bundle_path, &manifest.ham_file)?;
    let descriptor = AppDescriptor::from_json(
        std::str::from_utf8(&ham_json).context("Application descriptor is not UTF-8")?,
    )?;
    let application = descriptor.application_name.as_str();
    info!(application, bundle = %bundle_path.display(), "deploying bundle");

    let app_dir = layout.app_dir(application);
    fs::recreate_dir(&app_dir)?;

    let scratch = fs::scratch_dir(layout.temp_dir())?;
    install_libraries(
        bundle_path,
        &manifest,
        layout,
        &layout.app_lib_dir(application),
        scratch.path(),
    )?;
    install_shared_resources(
        bundle_path,
        &manifest,
        &layout.app_resources_dir(application),
    )?;

    let resolved = descriptor.resolve(&app_dir)?;
    resolved.write_to(&layout.app_descriptor_path(application))?;

    for component in &descriptor.components {
        install_component(bundle_path, &component.classname, &app_dir)?;
    }

    info!(application, app_dir = %app_dir.display(), "deployed");
    Ok(app_dir)
}

/// Stage the library archive in scratch, then copy everything the platform
/// does not already provide into `lib/`. The directory is created even when
/// nothing survives the filter.
fn install_libraries(
    bundle_path: &Path,
    manifest: &BundleManifest,
    layout: &RuntimeLayout,
    lib_dir: &Path,
    scratch: &Path,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(lib_dir)
        .with_context(|| format!("Failed to create directory: {}", lib_dir.display()))?;

    let data = archive::read_entry(bundle_path, &manifest.lib_jar)?;
    let staged = scratch.join("lib");
    archive::extract(&data, &staged)?;

    let platform = fs::file_names(layout.bin_dir())?;
    for file in fs::files_in(&staged)? {
        let Some(name) = file.file_name() else {
            continue;
        };
        if platform.contains(name) {
            warn!(
                library = %name.to_string_lossy(),
                "skipping platform-provided library"
            );
            continue;
        }
        fs::copy_into(&file, lib_dir)?;
    }
    Ok(())
}

/// Shared resources extract straight into `resources/`, unfiltered.
fn install_shared_resources(
    bundle_path: &Path,
    manifest: &BundleManifest,
    resources_dir: &Path,
) -> anyhow::Result<()> {
    let Some(entry) = &manifest.shared_resources_jar else {
        return Ok(());
    };
    let data = archive::read_entry(bundle_path, entry)?;
    archive::extract(&data, resources_dir)?;
    Ok(())
}

/// Extract one component archive into its own subdirectory. A packed
/// resources archive is unpacked into `resources/` and removed, leaving
/// loose files only.
fn install_component(
    bundle_path: &Path,
    classname: &str,
    app_dir: &Path,
) -> anyhow::Result<()> {
    let component_dir = app_dir.join(classname);
    let data = archive::read_entry(bundle_path, &component_entry(classname))?;
    archive::extract(&data, &component_dir)?;
    debug!(classname, "component extracted");

    let residual = component_dir.join(component_resources_entry(classname));
    if residual.is_file() {
        let resources = std::fs::read(&residual)
            .with_context(|| format!("Failed to read archive: {}", residual.display()))?;
        archive::extract(&resources, &component_dir.join("resources"))?;
        std::fs::remove_file(&residual)
            .with_context(|| format!("Failed to remove: {}", residual.display()))?;
    }
    Ok(())
}
