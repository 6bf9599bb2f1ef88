//! Deployment: install bundles and enumerate what is installed.

mod installer;

pub use installer::deploy;

use anyhow::Context;

use crate::ham::ResolvedAppDescriptor;
use crate::layout::RuntimeLayout;

/// Applications deployed under the layout's apps root, sorted by name.
///
/// An application counts as deployed when its directory carries the
/// matching `<name>.ham` descriptor; anything else under the apps root is
/// ignored.
pub fn deployed_apps(layout: &RuntimeLayout) -> anyhow::Result<Vec<String>> {
    let apps_dir = layout.apps_dir();
    if !apps_dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(apps_dir)
        .with_context(|| format!("Failed to read directory: {}", apps_dir.display()))?;
    let mut apps = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read directory: {}", apps_dir.display()))?;
        if !entry
            .file_type()
            .with_context(|| format!("Failed to stat: {}", entry.path().display()))?
            .is_dir()
        {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let descriptor_path = layout.app_descriptor_path(&name);
        if !descriptor_path.is_file() {
            continue;
        }
        let descriptor = ResolvedAppDescriptor::load(&descriptor_path)?;
        apps.push(descriptor.application_name);
    }
    apps.sort();
    Ok(apps)
}
