/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Build profiles: everything specific to one supported APK build, as data.
//! The default profile describes the goldmaster store build; tests construct
//! their own profiles against fixture archives.

use crate::{
    error::PatcherError, resources, CONFIG_DEST_PATH, EXPECTED_APK_MD5, OUTPUT_APK_NAME,
    PNSOVR_LIB_PATH, R15_LIB_PATH,
};
use std::borrow::Cow;

/// One native library to patch inside the extracted tree.
#[derive(Debug, Clone)]
pub struct LibraryPatch {
    /// Forward-slash relative path of the library inside the archive.
    pub archive_path: Cow<'static, str>,
    /// Delta payload applied to the library.
    pub payload: Cow<'static, [u8]>,
}

/// The `{expected hash -> patch payloads}` table for one APK build.
#[derive(Debug, Clone)]
pub struct BuildProfile {
    /// Lowercase hex MD5 the input must match before anything is mutated.
    pub expected_md5: Cow<'static, str>,
    /// File name of the output artifact, written beside the input.
    pub output_name: Cow<'static, str>,
    /// Destination of the injected config inside the tree.
    pub config_dest: Cow<'static, str>,
    /// Libraries to patch, applied in order.
    pub patches: Vec<LibraryPatch>,
}

impl BuildProfile {
    /// Profile for the one supported build, using the embedded payloads.
    /// Fails with `ResourceMissing` when the tool was packaged without them.
    pub fn goldmaster() -> Result<Self, PatcherError> {
        Ok(Self {
            expected_md5: Cow::Borrowed(EXPECTED_APK_MD5),
            output_name: Cow::Borrowed(OUTPUT_APK_NAME),
            config_dest: Cow::Borrowed(CONFIG_DEST_PATH),
            patches: vec![
                LibraryPatch {
                    archive_path: Cow::Borrowed(PNSOVR_LIB_PATH),
                    payload: Cow::Borrowed(resources::pnsovr_patch()?),
                },
                LibraryPatch {
                    archive_path: Cow::Borrowed(R15_LIB_PATH),
                    payload: Cow::Borrowed(resources::r15_patch()?),
                },
            ],
        })
    }
}
