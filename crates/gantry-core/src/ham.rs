//! Application descriptor (`.ham`): the runtime-facing view of a bundle.
//!
//! The descriptor exists in two phases. Inside a bundle archive it is
//! *portable*: its `home` field holds the literal `${application.home}`
//! token, so the same archive deploys anywhere. At deploy time it is
//! *resolved* against the actual application directory and only then
//! written to disk. The phases are separate types; a resolved descriptor
//! can never be packed and a portable one can never be installed.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::bundle::{is_plain_name, RESERVED_CLASSNAMES};
use crate::error::GantryError;

/// Token standing in for the application directory in portable descriptors.
pub const HOME_PLACEHOLDER: &str = "${application.home}";

/// One deployable component, as the runtime sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Matches the component's archive entry and deploy subdirectory.
    pub classname: String,
}

/// The wire document shared by both phases.
#[derive(Debug, Serialize, Deserialize)]
struct HamDocument {
    application_name: String,
    home: String,
    components: Vec<ComponentEntry>,
}

impl HamDocument {
    /// Every name in a descriptor lands in a filesystem path at deploy
    /// time, so a descriptor read out of an archive gets the same checks
    /// as an authored one.
    fn validate_names(&self) -> Result<(), GantryError> {
        if self.application_name.trim().is_empty() || !is_plain_name(&self.application_name) {
            return Err(GantryError::input(format!(
                "application name '{}' is not usable as a directory name",
                self.application_name
            )));
        }
        for component in &self.components {
            if component.classname.trim().is_empty() || !is_plain_name(&component.classname) {
                return Err(GantryError::input(format!(
                    "classname '{}' is not usable as a directory name",
                    component.classname
                )));
            }
            if RESERVED_CLASSNAMES.contains(&component.classname.as_str()) {
                return Err(GantryError::input(format!(
                    "classname '{}' collides with a reserved bundle entry",
                    component.classname
                )));
            }
        }
        Ok(())
    }
}

/// Location-agnostic descriptor, the form carried inside bundle archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDescriptor {
    pub application_name: String,
    pub components: Vec<ComponentEntry>,
}

impl AppDescriptor {
    pub fn new(application_name: impl Into<String>, classnames: &[String]) -> Self {
        Self {
            application_name: application_name.into(),
            components: classnames
                .iter()
                .map(|c| ComponentEntry {
                    classname: c.clone(),
                })
                .collect(),
        }
    }

    /// Serialize with the home placeholder intact.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let document = HamDocument {
            application_name: self.application_name.clone(),
            home: HOME_PLACEHOLDER.to_string(),
            components: self.components.clone(),
        };
        serde_json::to_string_pretty(&document)
            .context("Failed to serialize application descriptor")
    }

    /// Parse a portable descriptor. Rejects documents whose home was
    /// already resolved to a concrete path, and any name that could not
    /// have passed build-side validation.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let document: HamDocument =
            serde_json::from_str(content).context("Invalid application descriptor")?;
        document.validate_names()?;
        if document.home != HOME_PLACEHOLDER {
            return Err(GantryError::input(format!(
                "descriptor for '{}' is already resolved to '{}'",
                document.application_name, document.home
            ))
            .into());
        }
        Ok(Self {
            application_name: document.application_name,
            components: document.components,
        })
    }

    /// Bind the descriptor to its installation directory. The directory is
    /// made absolute so the written descriptor never depends on the working
    /// directory of whoever reads it.
    pub fn resolve(&self, app_dir: &Path) -> anyhow::Result<ResolvedAppDescriptor> {
        let home = std::path::absolute(app_dir)
            .with_context(|| format!("Failed to resolve path: {}", app_dir.display()))?;
        Ok(ResolvedAppDescriptor {
            application_name: self.application_name.clone(),
            home,
            components: self.components.clone(),
        })
    }

    pub fn classnames(&self) -> Vec<&str> {
        self.components
            .iter()
            .map(|c| c.classname.as_str())
            .collect()
    }
}

/// Descriptor bound to a concrete installation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAppDescriptor {
    pub application_name: String,
    pub home: PathBuf,
    pub components: Vec<ComponentEntry>,
}

impl ResolvedAppDescriptor {
    pub fn to_json(&self) -> anyhow::Result<String> {
        let document = HamDocument {
            application_name: self.application_name.clone(),
            home: self.home.display().to_string(),
            components: self.components.clone(),
        };
        serde_json::to_string_pretty(&document)
            .context("Failed to serialize application descriptor")
    }

    /// Parse a resolved descriptor. Rejects portable documents whose home
    /// is still the placeholder.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let document: HamDocument =
            serde_json::from_str(content).context("Invalid application descriptor")?;
        document.validate_names()?;
        if document.home == HOME_PLACEHOLDER {
            return Err(GantryError::input(format!(
                "descriptor for '{}' was never resolved to an install directory",
                document.application_name
            ))
            .into());
        }
        Ok(Self {
            application_name: document.application_name,
            home: PathBuf::from(document.home),
            components: document.components,
        })
    }

    /// Read a descriptor installed under an application directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read application descriptor: {}", path.display())
        })?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse application descriptor: {}", path.display()))
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let content = self.to_json()?;
        std::fs::write(path, content).with_context(|| {
            format!("Failed to write application descriptor: {}", path.display())
        })
    }
}
