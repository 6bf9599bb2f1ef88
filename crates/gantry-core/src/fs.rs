//! Filesystem primitives shared by the build and deploy pipeline.
//!
//! The two patterns the pipeline leans on live here: `recreate_dir`, the
//! idempotent delete-then-recreate used for deploy targets, and
//! `scratch_dir`, a guarded temporary directory that is released on every
//! exit path, success or failure.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::TempDir;

/// Delete `path` recursively if present, then create it empty.
///
/// Replace semantics: after this call the directory exists and contains
/// nothing, regardless of what was there before. A plain file at `path` is
/// removed the same way.
pub fn recreate_dir(path: &Path) -> anyhow::Result<()> {
    remove_if_exists(path)?;
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    Ok(())
}

/// Remove a file or directory tree if it exists; missing paths are fine.
pub fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => return Ok(()),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(())
}

/// Create a guarded scratch directory under `root`.
///
/// The root is created if missing. The returned guard removes the scratch
/// directory and everything in it when dropped, which is what guarantees
/// the no-partial-output contract of builds and deploys.
pub fn scratch_dir(root: &Path) -> anyhow::Result<TempDir> {
    fs::create_dir_all(root)
        .with_context(|| format!("Failed to create scratch root: {}", root.display()))?;
    tempfile::Builder::new()
        .prefix("gantry-")
        .tempdir_in(root)
        .with_context(|| format!("Failed to create scratch directory under: {}", root.display()))
}

/// Move `src` to `dst`, falling back to copy+rename across filesystems.
///
/// The fallback copies into a temporary sibling of `dst` and renames it
/// into place, so a copy that dies midway never leaves a partial file at
/// the destination.
pub fn persist(src: &Path, dst: &Path) -> anyhow::Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    persist_via_copy(src, dst)
}

fn persist_via_copy(src: &Path, dst: &Path) -> anyhow::Result<()> {
    let dir = dst
        .parent()
        .with_context(|| format!("Destination has no parent directory: {}", dst.display()))?;
    let staged = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to stage copy under: {}", dir.display()))?;
    fs::copy(src, staged.path()).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            src.display(),
            staged.path().display()
        )
    })?;
    staged
        .persist(dst)
        .with_context(|| format!("Failed to move staged copy to: {}", dst.display()))?;
    fs::remove_file(src)
        .with_context(|| format!("Failed to remove staged file: {}", src.display()))?;
    Ok(())
}

/// Copy a file into a directory, keeping its file name.
pub fn copy_into(file: &Path, dir: &Path) -> anyhow::Result<PathBuf> {
    let name = file
        .file_name()
        .with_context(|| format!("Path has no file name: {}", file.display()))?;
    let target = dir.join(name);
    fs::copy(file, &target).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            file.display(),
            target.display()
        )
    })?;
    Ok(target)
}

/// Plain files directly inside `dir`, sorted by name.
///
/// A missing directory reads as empty; a fresh installation has not grown
/// all of its roots yet.
pub fn files_in(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        if entry
            .file_type()
            .with_context(|| format!("Failed to stat: {}", entry.path().display()))?
            .is_file()
        {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// File names (not paths) directly inside `dir`.
pub fn file_names(dir: &Path) -> anyhow::Result<BTreeSet<OsString>> {
    Ok(files_in(dir)?
        .into_iter()
        .filter_map(|p| p.file_name().map(OsString::from))
        .collect())
}

/// All files with the given extension under `root`, recursively, sorted.
///
/// A missing root reads as empty.
pub fn collect_by_extension(root: &Path, extension: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if root.exists() {
        collect_recursive(root, extension, &mut found)?;
        found.sort();
    }
    Ok(found)
}

fn collect_recursive(
    dir: &Path,
    extension: &str,
    found: &mut Vec<PathBuf>,
) -> anyhow::Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        let path = entry.path();
        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat: {}", path.display()))?;
        if ty.is_dir() {
            collect_recursive(&path, extension, found)?;
        } else if ty.is_file() && path.extension().is_some_and(|e| e == extension) {
            found.push(path);
        }
    }
    Ok(())
}

/// Deterministic blake3 digest of a directory tree.
///
/// Entries are visited in sorted order; files hash as
/// `relative_path || 0x00 || content`, directories as
/// `relative_path || 0xFF`. Two trees with identical structure and content
/// produce identical digests, which is how redeploy idempotence is checked.
pub fn hash_tree(root: &Path) -> anyhow::Result<String> {
    let mut hasher = blake3::Hasher::new();
    hash_level(&mut hasher, root, "")?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn hash_level(hasher: &mut blake3::Hasher, dir: &Path, prefix: &str) -> anyhow::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let rel = if prefix.is_empty() {
            name.to_string_lossy().into_owned()
        } else {
            format!("{}/{}", prefix, name.to_string_lossy())
        };
        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat: {}", entry.path().display()))?;
        if ty.is_dir() {
            hasher.update(rel.as_bytes());
            hasher.update(&[0xFF]);
            hash_level(hasher, &entry.path(), &rel)?;
        } else if ty.is_file() {
            hasher.update(rel.as_bytes());
            hasher.update(&[0x00]);
            let content = fs::read(entry.path())
                .with_context(|| format!("Failed to read file: {}", entry.path().display()))?;
            hasher.update(&content);
        } else {
            anyhow::bail!("Unsupported filesystem entry: {}", entry.path().display());
        }
    }
    Ok(())
}
