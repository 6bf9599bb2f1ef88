//! Library files and scope merging.
//!
//! A bundle draws libraries from several ordered scopes: the shared scope
//! first, then each component in declaration order. [`merge`] flattens those
//! scopes into one set keyed by file name.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

/// Extension of library archives, both platform-provided and bundled.
pub const LIBRARY_EXTENSION: &str = "jar";

/// One concrete library on disk. `name` is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFile {
    pub name: String,
    pub path: PathBuf,
}

impl LibraryFile {
    /// Library named after the file it points at.
    pub fn from_path(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .with_context(|| format!("Library path has no file name: {}", path.display()))?
            .to_string_lossy()
            .into_owned();
        Ok(Self { name, path })
    }
}

/// Merge ordered scopes into one library set, first-by-name wins.
///
/// Scopes are processed in the given order and entries within a scope in
/// order; a candidate is kept only if no previously kept entry shares its
/// name. Later duplicates are dropped silently (logged at debug level).
/// Identity is the file name alone; contents are never compared.
pub fn merge(scopes: &[Vec<LibraryFile>]) -> Vec<LibraryFile> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();
    for scope in scopes {
        for library in scope {
            if seen.insert(library.name.clone()) {
                kept.push(library.clone());
            } else {
                debug!(
                    name = %library.name,
                    path = %library.path.display(),
                    "dropping duplicate library"
                );
            }
        }
    }
    kept
}

/// True if the path looks like a library archive.
pub fn is_library(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == LIBRARY_EXTENSION)
}
