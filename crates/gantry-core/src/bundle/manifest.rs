//! The manifest carried inside every bundle archive.
//!
//! Extraction is manifest-driven: the deployer reads `manifest.json` first
//! and addresses every other entry through it, so entry names can evolve
//! without breaking deployed bundles.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::layout::DESCRIPTOR_EXTENSION;

/// File extension of a bundle archive.
pub const BUNDLE_EXTENSION: &str = "hab";

/// Archive entry holding the manifest itself.
pub const MANIFEST_ENTRY: &str = "manifest.json";

/// Archive entry holding the merged library archive.
pub const LIB_JAR_ENTRY: &str = "lib.jar";

/// Archive entry holding shared resources, present only when declared.
pub const SHARED_RESOURCES_ENTRY: &str = "shared-resources.jar";

/// Manifest format revision written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Entry name of a component archive.
pub fn component_entry(classname: &str) -> String {
    format!("{classname}.jar")
}

/// Entry name of a component's packed resources, inside its archive.
pub fn component_resources_entry(classname: &str) -> String {
    format!("{classname}-resources.jar")
}

/// File name of the application descriptor, in archives and on disk.
pub fn descriptor_file_name(application: &str) -> String {
    format!("{application}.{DESCRIPTOR_EXTENSION}")
}

/// File name of a bundle archive.
pub fn bundle_file_name(application: &str) -> String {
    format!("{application}.{BUNDLE_EXTENSION}")
}

/// Index of the well-known entries of one bundle archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Manifest format revision.
    pub format_version: u32,

    /// Application name the bundle was built for.
    pub application: String,

    /// Build timestamp, informational only.
    pub created_at: DateTime<Utc>,

    /// Entry name of the application descriptor.
    pub ham_file: String,

    /// Entry name of the merged library archive. Always present, possibly
    /// an empty archive.
    pub lib_jar: String,

    /// Entry name of the shared resources archive, when one was packed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_resources_jar: Option<String>,

    /// Component archive entries, in build order.
    pub components: Vec<String>,
}

impl BundleManifest {
    /// Manifest for a freshly assembled bundle, using the fixed entry names.
    pub fn for_application(
        application: &str,
        classnames: &[String],
        shared_resources: bool,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            application: application.to_string(),
            created_at: Utc::now(),
            ham_file: descriptor_file_name(application),
            lib_jar: LIB_JAR_ENTRY.to_string(),
            shared_resources_jar: shared_resources.then(|| SHARED_RESOURCES_ENTRY.to_string()),
            components: classnames.iter().map(|c| component_entry(c)).collect(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize bundle manifest")
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("Invalid bundle manifest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_follow_classname() {
        assert_eq!(component_entry("OrderModule"), "OrderModule.jar");
        assert_eq!(
            component_resources_entry("OrderModule"),
            "OrderModule-resources.jar"
        );
        assert_eq!(descriptor_file_name("Orders"), "Orders.ham");
        assert_eq!(bundle_file_name("Orders"), "Orders.hab");
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let manifest = BundleManifest::for_application(
            "Orders",
            &["OrderModule".to_string(), "BillingModule".to_string()],
            true,
        );
        let json = manifest.to_json().expect("serialize");
        let parsed = BundleManifest::from_json(&json).expect("parse");

        assert_eq!(parsed.format_version, FORMAT_VERSION);
        assert_eq!(parsed.application, "Orders");
        assert_eq!(parsed.ham_file, "Orders.ham");
        assert_eq!(parsed.lib_jar, LIB_JAR_ENTRY);
        assert_eq!(
            parsed.shared_resources_jar.as_deref(),
            Some(SHARED_RESOURCES_ENTRY)
        );
        assert_eq!(
            parsed.components,
            vec!["OrderModule.jar", "BillingModule.jar"]
        );
    }

    #[test]
    fn shared_resources_key_is_omitted_when_absent() {
        let manifest = BundleManifest::for_application("Orders", &["M".to_string()], false);
        let json = manifest.to_json().expect("serialize");
        assert!(!json.contains("shared_resources_jar"));

        let parsed = BundleManifest::from_json(&json).expect("parse");
        assert!(parsed.shared_resources_jar.is_none());
    }

    #[test]
    fn rejects_malformed_manifest() {
        assert!(BundleManifest::from_json("{не-json").is_err());
        assert!(BundleManifest::from_json(r#"{"application": "Orders"}"#).is_err());
    }
}
