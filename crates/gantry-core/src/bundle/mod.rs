//! Bundle descriptor: the authored build input.
//!
//! A descriptor names the application, an optional shared scope, and the
//! ordered components to compile and package. On disk it is a TOML document:
//!
//! ```toml
//! application_name = "Orders"
//!
//! [shared]
//! dependencies = ["lib/shared"]
//! resources_dir = "resources/shared"
//!
//! [[components]]
//! classname = "OrderModule"
//! source_dir = "src/orders"
//! config_template = "config/orders.properties"
//! dependencies = ["lib/orders"]
//! ```

pub mod manifest;

pub use manifest::BundleManifest;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::GantryError;

/// Opaque reference to a dependency, resolved by a
/// [`DependencyResolver`](crate::resolve::DependencyResolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyRef(String);

impl DependencyRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dependencies and resources common to every component of a bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedScope {
    /// Ordered dependency references; resolved once per build.
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,

    /// Resources packed once and deployed to the application's `resources/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources_dir: Option<PathBuf>,
}

/// One independently compiled unit of the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Unique within the bundle; names the archive entry and the deploy
    /// subdirectory.
    pub classname: String,

    /// Source tree handed to the compiler collaborator.
    pub source_dir: PathBuf,

    /// Configuration template rendered against shared-scope values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_template: Option<PathBuf>,

    /// Resources packed into `<classname>-resources.jar`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources_dir: Option<PathBuf>,

    /// Ordered component-local dependency references.
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

/// The authored description of one application bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDescriptor {
    /// Unique deploy key, case-sensitive; also names the bundle archive.
    pub application_name: String,

    /// Scope shared by every component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<SharedScope>,

    /// Ordered, non-empty component list.
    pub components: Vec<ComponentDescriptor>,
}

impl BundleDescriptor {
    /// Read and validate a descriptor file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bundle descriptor: {}", path.display()))?;
        let descriptor = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse bundle descriptor: {}", path.display()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Parse descriptor TOML without touching the filesystem.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let descriptor: Self =
            toml::from_str(content).context("Invalid bundle descriptor TOML")?;
        Ok(descriptor)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize bundle descriptor")
    }

    /// Structural checks that must hold before any build step runs.
    pub fn validate(&self) -> Result<(), GantryError> {
        if self.application_name.trim().is_empty() {
            return Err(GantryError::input("application name is empty"));
        }
        if !is_plain_name(&self.application_name) {
            return Err(GantryError::input(format!(
                "application name '{}' is not usable as a directory name",
                self.application_name
            )));
        }
        if self.components.is_empty() {
            return Err(GantryError::input(format!(
                "bundle '{}' declares no components",
                self.application_name
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for component in &self.components {
            if component.classname.trim().is_empty() {
                return Err(GantryError::input(format!(
                    "bundle '{}' has a component with an empty classname",
                    self.application_name
                )));
            }
            if !is_plain_name(&component.classname) {
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
            if !seen.insert(component.classname.as_str()) {
                return Err(GantryError::input(format!(
                    "duplicate component classname '{}'",
                    component.classname
                )));
            }
        }
        Ok(())
    }

    /// Shared dependency references, empty when no shared scope is declared.
    pub fn shared_dependencies(&self) -> &[DependencyRef] {
        self.shared
            .as_ref()
            .map(|s| s.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Shared resources directory, if the shared scope declares one.
    pub fn shared_resources_dir(&self) -> Option<&Path> {
        self.shared
            .as_ref()
            .and_then(|s| s.resources_dir.as_deref())
    }
}

/// Classnames that would collide with fixed bundle entries or with the
/// `lib/` and `resources/` directories of a deployed application.
pub(crate) const RESERVED_CLASSNAMES: [&str; 3] = ["lib", "resources", "shared-resources"];

/// Names that land in archive entries and directory paths must be single
/// path components.
pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.contains('/') && !name.contains('\\') && name != "." && name != ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS_TOML: &str = r#"
application_name = "Orders"

[shared]
dependencies = ["deps/shared"]
resources_dir = "resources/shared"

[[components]]
classname = "OrderModule"
source_dir = "src/orders"
config_template = "config/orders.properties"
dependencies = ["deps/orders"]

[[components]]
classname = "BillingModule"
source_dir = "src/billing"
"#;

    #[test]
    fn parses_full_descriptor() {
        let descriptor = BundleDescriptor::from_toml_str(ORDERS_TOML).expect("parse");
        assert_eq!(descriptor.application_name, "Orders");
        assert_eq!(descriptor.components.len(), 2);
        assert_eq!(descriptor.shared_dependencies().len(), 1);
        assert_eq!(
            descriptor.shared_resources_dir(),
            Some(Path::new("resources/shared"))
        );

        let billing = &descriptor.components[1];
        assert_eq!(billing.classname, "BillingModule");
        assert!(billing.config_template.is_none());
        assert!(billing.resources_dir.is_none());
        assert!(billing.dependencies.is_empty());
    }

    #[test]
    fn toml_round_trip_preserves_order() {
        let descriptor = BundleDescriptor::from_toml_str(ORDERS_TOML).expect("parse");
        let serialized = descriptor.to_toml_string().expect("serialize");
        let reparsed = BundleDescriptor::from_toml_str(&serialized).expect("reparse");
        let classnames: Vec<_> = reparsed
            .components
            .iter()
            .map(|c| c.classname.as_str())
            .collect();
        assert_eq!(classnames, vec!["OrderModule", "BillingModule"]);
    }

    #[test]
    fn validate_rejects_empty_name() {
        let descriptor = BundleDescriptor {
            application_name: "  ".to_string(),
            shared: None,
            components: vec![ComponentDescriptor {
                classname: "M".to_string(),
                source_dir: PathBuf::from("src"),
                config_template: None,
                resources_dir: None,
                dependencies: Vec::new(),
            }],
        };
        let err = descriptor.validate().expect_err("must reject");
        assert!(matches!(err, GantryError::Input(_)));
    }

    #[test]
    fn validate_rejects_missing_components() {
        let descriptor = BundleDescriptor {
            application_name: "Orders".to_string(),
            shared: None,
            components: Vec::new(),
        };
        let err = descriptor.validate().expect_err("must reject");
        assert!(err.to_string().contains("no components"));
    }

    #[test]
    fn validate_rejects_duplicate_classnames() {
        let component = ComponentDescriptor {
            classname: "OrderModule".to_string(),
            source_dir: PathBuf::from("src"),
            config_template: None,
            resources_dir: None,
            dependencies: Vec::new(),
        };
        let descriptor = BundleDescriptor {
            application_name: "Orders".to_string(),
            shared: None,
            components: vec![component.clone(), component],
        };
        let err = descriptor.validate().expect_err("must reject");
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn validate_rejects_reserved_classnames() {
        let descriptor = BundleDescriptor {
            application_name: "Orders".to_string(),
            shared: None,
            components: vec![ComponentDescriptor {
                classname: "lib".to_string(),
                source_dir: PathBuf::from("src"),
                config_template: None,
                resources_dir: None,
                dependencies: Vec::new(),
            }],
        };
        let err = descriptor.validate().expect_err("must reject");
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn validate_rejects_path_like_names() {
        let descriptor = BundleDescriptor {
            application_name: "apps/../escape".to_string(),
            shared: None,
            components: vec![ComponentDescriptor {
                classname: "M".to_string(),
                source_dir: PathBuf::from("src"),
                config_template: None,
                resources_dir: None,
                dependencies: Vec::new(),
            }],
        };
        assert!(descriptor.validate().is_err());
    }
}
