/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Archive extraction, file injection, and repacking.
//! Extraction always starts from a freshly created directory so a previous
//! failed run can never contaminate the tree.

use crate::{error::PatcherError, ui::Ui, BUFFER_SIZE};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Component, Path, PathBuf},
};
use zip::{
    write::{FileOptions, ZipWriter},
    CompressionMethod, ZipArchive,
};

/// Extract `archive` into `target`. Any pre-existing directory at `target`
/// is deleted first.
pub fn extract(archive: &Path, target: &Path, ui: &Ui) -> Result<(), PatcherError> {
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;

    let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
    let total = zip.len();
    if ui.verbose {
        ui.show_progress_bar(total as u64, "Extracting");
    }

    let mut buf = vec![0u8; BUFFER_SIZE];
    for i in 0..total {
        let mut entry = zip.by_index(i)?;
        let relative = entry.enclosed_name().ok_or_else(|| {
            PatcherError::ArchiveCorrupt(zip::result::ZipError::InvalidArchive(
                "entry name escapes the extraction directory".into(),
            ))
        })?;
        let dest = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::with_capacity(BUFFER_SIZE, File::create(&dest)?);
            loop {
                let n = entry.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n])?;
            }
            out.flush()?;
            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&dest, fs::Permissions::from_mode(mode))?;
            }
        }

        if ui.verbose && ui.has_progress_bar() {
            ui.update_progress((i + 1) as u64);
        }
    }

    if ui.verbose && ui.has_progress_bar() {
        ui.finish_progress();
    }
    Ok(())
}

/// Copy `source` to `relative_path` under `dir`, creating intermediate
/// directories. Overwriting an existing file is supported and deliberate.
pub fn inject(dir: &Path, relative_path: &str, source: &Path) -> Result<(), PatcherError> {
    let dest = dir.join(relative_path);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, &dest)?;
    Ok(())
}

/// Recursively compress the tree under `dir` into a new archive at `output`.
pub fn repack(dir: &Path, output: &Path, ui: &Ui) -> Result<(), PatcherError> {
    let files = collect_tree(dir)?;
    if ui.verbose {
        ui.show_progress_bar(files.len() as u64, "Repacking");
    }

    let mut writer = ZipWriter::new(BufWriter::with_capacity(BUFFER_SIZE, File::create(output)?));
    let mut buf = vec![0u8; BUFFER_SIZE];

    for (i, path) in files.iter().enumerate() {
        // collect_tree only returns paths under dir
        let relative = path.strip_prefix(dir).map_err(|_| {
            PatcherError::Io(std::io::Error::other("path escaped the repack root"))
        })?;
        let name = zip_entry_name(relative);

        if path.is_dir() {
            writer.add_directory(name, FileOptions::<()>::default())?;
        } else {
            let mode = entry_mode(path)?;
            let options = FileOptions::<()>::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(mode)
                .with_alignment(4);
            writer.start_file(name, options)?;
            let mut file = BufReader::with_capacity(BUFFER_SIZE, File::open(path)?);
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                writer.write_all(&buf[..n])?;
            }
        }

        if ui.verbose && ui.has_progress_bar() {
            ui.update_progress((i + 1) as u64);
        }
    }

    if ui.verbose && ui.has_progress_bar() {
        ui.finish_progress();
    }
    writer.finish()?;
    Ok(())
}

/// Depth-first listing, directories before their contents, names sorted so
/// repacking is reproducible.
fn collect_tree(dir: &Path) -> Result<Vec<PathBuf>, PatcherError> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut children: Vec<PathBuf> = fs::read_dir(&current)?
            .map(|e| e.map(|e| e.path()))
            .collect::<Result<_, _>>()?;
        children.sort();
        for child in children {
            if child.is_dir() {
                out.push(child.clone());
                stack.push(child);
            } else {
                out.push(child);
            }
        }
    }
    out.sort();
    Ok(out)
}

fn zip_entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn entry_mode(path: &Path) -> Result<u32, PatcherError> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode())
}

#[cfg(not(unix))]
fn entry_mode(_path: &Path) -> Result<u32, PatcherError> {
    Ok(0o644)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn tree_contents(root: &Path) -> BTreeMap<String, Vec<u8>> {
        let mut map = BTreeMap::new();
        for path in collect_tree(root).unwrap() {
            if path.is_file() {
                let name = zip_entry_name(path.strip_prefix(root).unwrap());
                map.insert(name, fs::read(&path).unwrap());
            }
        }
        map
    }

    #[test]
    fn repack_then_extract_round_trips() {
        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("src");
        fs::create_dir_all(src.join("assets/_local")).unwrap();
        fs::create_dir_all(src.join("lib/arm64-v8a")).unwrap();
        fs::write(src.join("AndroidManifest.xml"), b"<manifest/>").unwrap();
        fs::write(src.join("assets/_local/config.json"), b"{}").unwrap();
        fs::write(src.join("lib/arm64-v8a/libr15.so"), vec![0u8; 4096]).unwrap();

        let ui = Ui::default();
        let archive = work.path().join("packed.apk");
        repack(&src, &archive, &ui).unwrap();

        let dst = work.path().join("dst");
        extract(&archive, &dst, &ui).unwrap();
        assert_eq!(tree_contents(&src), tree_contents(&dst));
    }

    #[test]
    fn extract_recreates_stale_target() {
        let work = tempfile::tempdir().unwrap();
        let src = work.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), b"a").unwrap();

        let ui = Ui::default();
        let archive = work.path().join("packed.zip");
        repack(&src, &archive, &ui).unwrap();

        let dst = work.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("stale.txt"), b"left over from a failed run").unwrap();

        extract(&archive, &dst, &ui).unwrap();
        assert!(dst.join("a.txt").exists());
        assert!(!dst.join("stale.txt").exists());
    }

    #[test]
    fn inject_overwrites_and_creates_parents() {
        let work = tempfile::tempdir().unwrap();
        let tree = work.path().join("tree");
        fs::create_dir_all(&tree).unwrap();
        let source = work.path().join("config.json");
        fs::write(&source, b"{\"k\":1}").unwrap();

        inject(&tree, "assets/_local/config.json", &source).unwrap();
        assert_eq!(
            fs::read(tree.join("assets/_local/config.json")).unwrap(),
            b"{\"k\":1}"
        );

        fs::write(&source, b"{\"k\":2}").unwrap();
        inject(&tree, "assets/_local/config.json", &source).unwrap();
        assert_eq!(
            fs::read(tree.join("assets/_local/config.json")).unwrap(),
            b"{\"k\":2}"
        );
    }

    #[test]
    fn extract_rejects_corrupt_archive() {
        let work = tempfile::tempdir().unwrap();
        let bogus = work.path().join("bogus.apk");
        fs::write(&bogus, b"this is not a zip archive").unwrap();
        let ui = Ui::default();
        assert!(matches!(
            extract(&bogus, &work.path().join("out"), &ui),
            Err(PatcherError::ArchiveCorrupt(_))
        ));
    }
}
