//! Dependency resolution seam.
//!
//! Descriptors carry opaque [`DependencyRef`]s; a resolver turns each one
//! into concrete library files before the build touches them. The crate
//! ships a directory-based resolver; registry- or network-backed resolvers
//! plug in through the same trait.

use std::path::PathBuf;

use tracing::debug;

use crate::bundle::DependencyRef;
use crate::error::GantryError;
use crate::library::{self, LibraryFile};

/// Trait for materializing dependency references as library files.
pub trait DependencyResolver: Send + Sync {
    /// Resolve one reference to its library files, in a stable order.
    fn resolve(&self, reference: &DependencyRef) -> anyhow::Result<Vec<LibraryFile>>;
}

/// Resolve an ordered scope of references, preserving reference order.
pub fn resolve_scope(
    resolver: &dyn DependencyResolver,
    references: &[DependencyRef],
) -> anyhow::Result<Vec<LibraryFile>> {
    let mut libraries = Vec::new();
    for reference in references {
        libraries.extend(resolver.resolve(reference)?);
    }
    Ok(libraries)
}

/// Resolver for references that are filesystem paths.
///
/// A reference naming a library file resolves to that file; one naming a
/// directory resolves to the library files directly inside it, sorted by
/// name. Relative references are anchored at the resolver's base directory.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    base_dir: PathBuf,
}

impl DirectoryResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl DependencyResolver for DirectoryResolver {
    fn resolve(&self, reference: &DependencyRef) -> anyhow::Result<Vec<LibraryFile>> {
        let path = self.base_dir.join(reference.as_str());
        if !path.exists() {
            return Err(GantryError::input(format!(
                "dependency '{}' not found at {}",
                reference,
                path.display()
            ))
            .into());
        }

        if path.is_file() {
            if !library::is_library(&path) {
                return Err(GantryError::input(format!(
                    "dependency '{}' is not a library file: {}",
                    reference,
                    path.display()
                ))
                .into());
            }
            return Ok(vec![LibraryFile::from_path(&path)?]);
        }

        let mut libraries = Vec::new();
        for file in crate::fs::files_in(&path)? {
            if library::is_library(&file) {
                libraries.push(LibraryFile::from_path(&file)?);
            } else {
                debug!(path = %file.display(), "skipping non-library file");
            }
        }
        Ok(libraries)
    }
}
