//! Thin wrappers over the zip codec.
//!
//! Bundles, component archives, and library archives are ordinary zip data;
//! everything here stays in memory because individual artifacts are small.
//! Entry paths are sanitized on extraction so a hostile archive cannot
//! escape its target directory.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::write::SimpleFileOptions;

/// Pack files into a flat archive; each entry is named by its file name.
///
/// Callers guarantee name uniqueness (the library merge and component
/// packaging both key on file names).
pub fn pack_files(files: &[PathBuf]) -> anyhow::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default();
        for file in files {
            let name = file
                .file_name()
                .with_context(|| format!("Path has no file name: {}", file.display()))?
                .to_string_lossy()
                .into_owned();
            writer
                .start_file(name, options)
                .with_context(|| format!("Failed to add entry for: {}", file.display()))?;
            let content = fs::read(file)
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            writer
                .write_all(&content)
                .with_context(|| format!("Failed to write entry for: {}", file.display()))?;
        }
        writer.finish().context("Failed to finish archive")?;
    }
    Ok(buf.into_inner())
}

/// Pack a directory tree; entry names are `/`-separated relative paths.
///
/// Entries are added in sorted order so identical trees produce identical
/// archives. Empty directories are not recorded.
pub fn pack_dir(root: &Path) -> anyhow::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        pack_level(&mut writer, root, "")?;
        writer.finish().context("Failed to finish archive")?;
    }
    Ok(buf.into_inner())
}

fn pack_level(
    writer: &mut zip::ZipWriter<&mut Cursor<Vec<u8>>>,
    dir: &Path,
    prefix: &str,
) -> anyhow::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<Result<_, _>>()
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    let options = SimpleFileOptions::default();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let path = entry.path();
        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat: {}", path.display()))?;
        if ty.is_dir() {
            pack_level(writer, &path, &rel)?;
        } else if ty.is_file() {
            writer
                .start_file(rel, options)
                .with_context(|| format!("Failed to add entry for: {}", path.display()))?;
            let content = fs::read(&path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            writer
                .write_all(&content)
                .with_context(|| format!("Failed to write entry for: {}", path.display()))?;
        }
    }
    Ok(())
}

/// Extract archive bytes into `dest`, returning the written file paths.
///
/// Entries whose names would escape `dest` are skipped. Parent directories
/// are created as needed; unix permission bits are restored best-effort.
pub fn extract(data: &[u8], dest: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).context("Failed to read archive data")?;
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;
        let Some(rel) = file.enclosed_name() else {
            continue;
        };
        let target = dest.join(rel);

        if file.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .with_context(|| format!("Failed to read archive entry: {}", file.name()))?;
        fs::write(&target, &content)
            .with_context(|| format!("Failed to write file: {}", target.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode)).ok();
            }
        }

        written.push(target);
    }

    Ok(written)
}

/// Read one named entry out of an archive file.
pub fn read_entry(archive_path: &Path, entry: &str) -> anyhow::Result<Vec<u8>> {
    let data = fs::read(archive_path)
        .with_context(|| format!("Failed to read archive: {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut file = archive.by_name(entry).with_context(|| {
        format!(
            "Entry '{}' not found in archive: {}",
            entry,
            archive_path.display()
        )
    })?;
    let mut content = Vec::new();
    file.read_to_end(&mut content)
        .with_context(|| format!("Failed to read entry '{entry}'"))?;
    Ok(content)
}

/// Number of entries in archive bytes. An empty archive is valid.
pub fn entry_count(data: &[u8]) -> anyhow::Result<usize> {
    let archive =
        zip::ZipArchive::new(Cursor::new(data)).context("Failed to read archive data")?;
    Ok(archive.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, content).expect("write test file");
    }

    #[test]
    fn pack_files_uses_flat_names() {
        let tmp = TempDir::new().expect("tempdir");
        write(&tmp.path().join("deep/a.jar"), "a");
        write(&tmp.path().join("b.jar"), "b");

        let data = pack_files(&[tmp.path().join("deep/a.jar"), tmp.path().join("b.jar")])
            .expect("pack");

        let out = TempDir::new().expect("tempdir");
        let written = extract(&data, out.path()).expect("extract");
        assert_eq!(written.len(), 2);
        assert!(out.path().join("a.jar").is_file());
        assert!(out.path().join("b.jar").is_file());
        assert!(!out.path().join("deep").exists());
    }

    #[test]
    fn pack_dir_round_trips_structure() {
        let tmp = TempDir::new().expect("tempdir");
        write(&tmp.path().join("top.txt"), "top");
        write(&tmp.path().join("sub/inner.txt"), "inner");

        let data = pack_dir(tmp.path()).expect("pack");
        let out = TempDir::new().expect("tempdir");
        extract(&data, out.path()).expect("extract");

        assert_eq!(
            fs::read_to_string(out.path().join("top.txt")).expect("read"),
            "top"
        );
        assert_eq!(
            fs::read_to_string(out.path().join("sub/inner.txt")).expect("read"),
            "inner"
        );
    }

    #[test]
    fn empty_pack_is_a_valid_empty_archive() {
        let data = pack_files(&[]).expect("pack");
        assert_eq!(entry_count(&data).expect("count"), 0);

        let out = TempDir::new().expect("tempdir");
        let written = extract(&data, out.path()).expect("extract");
        assert!(written.is_empty());
    }

    #[test]
    fn extract_skips_escaping_entries() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default();
            writer.start_file("../evil.txt", options).expect("start");
            writer.write_all(b"nope").expect("write");
            writer.start_file("fine.txt", options).expect("start");
            writer.write_all(b"ok").expect("write");
            writer.finish().expect("finish");
        }
        let data = buf.into_inner();

        let tmp = TempDir::new().expect("tempdir");
        let dest = tmp.path().join("dest");
        let written = extract(&data, &dest).expect("extract");

        assert_eq!(written, vec![dest.join("fine.txt")]);
        assert!(!tmp.path().join("evil.txt").exists());
    }

    #[test]
    fn read_entry_finds_named_entry() {
        let tmp = TempDir::new().expect("tempdir");
        write(&tmp.path().join("manifest.json"), "{}");
        let data = pack_files(&[tmp.path().join("manifest.json")]).expect("pack");
        let archive_path = tmp.path().join("bundle.hab");
        fs::write(&archive_path, &data).expect("write archive");

        let bytes = read_entry(&archive_path, "manifest.json").expect("read entry");
        assert_eq!(bytes, b"{}");

        let missing = read_entry(&archive_path, "absent.jar");
        assert!(missing.is_err());
    }

    #[test]
    fn invalid_archive_data_is_rejected() {
        let tmp = TempDir::new().expect("tempdir");
        let dest = tmp.path().join("dest");
        assert!(extract(b"not a zip", &dest).is_err());
        assert!(!dest.exists());
        assert!(entry_count(b"not a zip").is_err());
    }
}
