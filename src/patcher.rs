/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! The run itself: a linear, fail-fast sequence with no retries and no
//! partial-success state. Every precondition is checked before the first
//! filesystem mutation; any error aborts the whole run. Working directories
//! are unique per run and removed on every exit path.

use crate::{
    config::Config,
    endpoints,
    error::PatcherError,
    integrity,
    keys::KeyChain,
    patch, pipeline,
    profile::{BuildProfile, LibraryPatch},
    signing::ArchiveSigner,
    ui::Ui,
    BUFFER_SIZE,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub struct Patcher<'a> {
    config: &'a Config,
    profile: &'a BuildProfile,
    ui: &'a Ui,
}

impl<'a> Patcher<'a> {
    pub fn new(config: &'a Config, profile: &'a BuildProfile, ui: &'a Ui) -> Self {
        Self {
            config,
            profile,
            ui,
        }
    }

    /// Execute the full pipeline. Returns the path of the signed artifact.
    pub fn run(&self) -> Result<PathBuf, PatcherError> {
        self.ui.step("Checking preconditions...");
        self.check_preconditions()?;

        // Unique per run; dropped (and deleted, best-effort) on every exit
        // path out of this function.
        let workdir = tempfile::Builder::new().prefix("echopatch-").tempdir()?;
        self.ui
            .debug(&format!("Working directory: {}", workdir.path().display()));
        let tree = workdir.path().join("tree");

        self.ui.step("Extracting files...");
        pipeline::extract(&self.config.input_path, &tree, self.ui)?;

        self.ui.step("Copying config.json...");
        pipeline::inject(&tree, &self.profile.config_dest, &self.config.config_path)?;

        for lib in &self.profile.patches {
            self.ui.step(&format!("Patching {}...", lib.archive_path));
            self.patch_library(&tree, lib)?;
        }

        self.ui.step("Creating unsigned APK...");
        let unsigned = workdir.path().join("unsigned.apk");
        pipeline::repack(&tree, &unsigned, self.ui)?;

        self.ui.step("Signing APK...");
        let keys = KeyChain::dev()?;
        ArchiveSigner::sign_in_place(&unsigned, &keys, self.ui)?;

        self.ui.step("Moving signed APK...");
        let output = self.config.output_path(&self.profile.output_name);
        Self::relocate(&unsigned, &output)?;

        self.ui.step("Cleaning up temporary files...");
        workdir.close()?;

        Ok(output)
    }

    /// All validation happens here, before any destructive operation.
    fn check_preconditions(&self) -> Result<(), PatcherError> {
        if !self.config.input_path.is_file() {
            return Err(PatcherError::InputNotFound(
                self.config.input_path.display().to_string(),
            ));
        }

        integrity::verify(&self.config.input_path, &self.profile.expected_md5)?;
        self.ui.verbose("APK hash matches the supported build");

        if !self.config.config_path.is_file() {
            return Err(PatcherError::ConfigNotFound(
                self.config.config_path.display().to_string(),
            ));
        }
        let config_text = fs::read_to_string(&self.config.config_path).map_err(|_| {
            PatcherError::ConfigUnreadable(self.config.config_path.display().to_string())
        })?;
        endpoints::validate(&config_text)?;
        self.ui.verbose("Endpoint config validated");

        Ok(())
    }

    /// Apply one delta. The replacement is fully written to a side file
    /// before the original is deleted, so a failed application leaves the
    /// original library untouched.
    fn patch_library(&self, tree: &Path, lib: &LibraryPatch) -> Result<(), PatcherError> {
        let target = tree.join(lib.archive_path.as_ref());
        if !target.is_file() {
            return Err(PatcherError::PatchFailed(format!(
                "`{}` not present in the extracted archive",
                lib.archive_path
            )));
        }

        let original = fs::read(&target)?;
        let side_path = side_file_path(&target);

        let result = (|| -> Result<(), PatcherError> {
            let mut out = BufWriter::with_capacity(BUFFER_SIZE, File::create(&side_path)?);
            let written = patch::apply(&original, &lib.payload, &mut out)?;
            out.flush()?;
            self.ui
                .verbose(&format!("{}: wrote {} bytes", lib.archive_path, written));
            Ok(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&side_path);
            return Err(e);
        }

        fs::remove_file(&target)?;
        fs::rename(&side_path, &target)?;
        Ok(())
    }

    /// Move the signed archive to its final location, replacing any earlier
    /// output. Falls back to copy+delete when rename crosses filesystems.
    fn relocate(from: &Path, to: &Path) -> Result<(), PatcherError> {
        if to.exists() {
            fs::remove_file(to)?;
        }
        if fs::rename(from, to).is_err() {
            fs::copy(from, to)?;
            fs::remove_file(from)?;
        }
        Ok(())
    }
}

fn side_file_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push("_patched");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn side_file_keeps_directory_and_name() {
        let side = side_file_path(Path::new("/tmp/tree/lib/arm64-v8a/libr15.so"));
        assert_eq!(
            side,
            PathBuf::from("/tmp/tree/lib/arm64-v8a/libr15.so_patched")
        );
    }

    fn dummy_config(dir: &Path) -> Config {
        Config {
            input_path: dir.join("input.apk"),
            config_path: dir.join("config.json"),
            output_dir: dir.to_path_buf(),
            pause: false,
            quiet: true,
            verbosity_level: 0,
        }
    }

    fn dummy_profile(patches: Vec<LibraryPatch>) -> BuildProfile {
        BuildProfile {
            expected_md5: Cow::Borrowed("00000000000000000000000000000000"),
            output_name: Cow::Borrowed("out.apk"),
            config_dest: Cow::Borrowed("assets/_local/config.json"),
            patches,
        }
    }

    #[test]
    fn failed_patch_leaves_original_untouched() {
        let work = tempfile::tempdir().unwrap();
        let tree = work.path().join("tree");
        fs::create_dir_all(tree.join("lib/arm64-v8a")).unwrap();
        let original = vec![7u8; 2048];
        fs::write(tree.join("lib/arm64-v8a/libr15.so"), &original).unwrap();

        let lib = LibraryPatch {
            archive_path: Cow::Borrowed("lib/arm64-v8a/libr15.so"),
            payload: Cow::Borrowed(b"not a valid delta"),
        };
        let config = dummy_config(work.path());
        let profile = dummy_profile(vec![lib.clone()]);
        let ui = Ui::default();
        let patcher = Patcher::new(&config, &profile, &ui);

        let err = patcher.patch_library(&tree, &lib).unwrap_err();
        assert!(matches!(err, PatcherError::PatchFailed(_)));
        assert_eq!(
            fs::read(tree.join("lib/arm64-v8a/libr15.so")).unwrap(),
            original
        );
        assert!(!tree.join("lib/arm64-v8a/libr15.so_patched").exists());
    }

    #[test]
    fn successful_patch_swaps_in_replacement() {
        let work = tempfile::tempdir().unwrap();
        let tree = work.path().join("tree");
        fs::create_dir_all(tree.join("lib/arm64-v8a")).unwrap();
        let original = b"original library bytes".to_vec();
        let patched = b"patched library content, longer than before".to_vec();
        fs::write(tree.join("lib/arm64-v8a/libpnsovr.so"), &original).unwrap();

        let lib = LibraryPatch {
            archive_path: Cow::Borrowed("lib/arm64-v8a/libpnsovr.so"),
            payload: Cow::Owned(patch::create(&original, &patched).unwrap()),
        };
        let config = dummy_config(work.path());
        let profile = dummy_profile(vec![lib.clone()]);
        let ui = Ui::default();
        let patcher = Patcher::new(&config, &profile, &ui);

        patcher.patch_library(&tree, &lib).unwrap();
        assert_eq!(
            fs::read(tree.join("lib/arm64-v8a/libpnsovr.so")).unwrap(),
            patched
        );
        assert!(!tree.join("lib/arm64-v8a/libpnsovr.so_patched").exists());
    }

    #[test]
    fn patching_a_missing_library_is_an_error() {
        let work = tempfile::tempdir().unwrap();
        let tree = work.path().join("tree");
        fs::create_dir_all(&tree).unwrap();

        let lib = LibraryPatch {
            archive_path: Cow::Borrowed("lib/arm64-v8a/libr15.so"),
            payload: Cow::Borrowed(&[]),
        };
        let config = dummy_config(work.path());
        let profile = dummy_profile(vec![lib.clone()]);
        let ui = Ui::default();
        let patcher = Patcher::new(&config, &profile, &ui);

        assert!(matches!(
            patcher.patch_library(&tree, &lib),
            Err(PatcherError::PatchFailed(_))
        ));
    }
}
