/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Patch payloads embedded at build time.
//!
//! The release deltas are produced out-of-band against the supported APK
//! build and dropped into `resources/` before building. A binary built
//! without them still compiles; their absence is reported as a packaging
//! error during precondition checks, before any filesystem mutation.

use crate::error::PatcherError;

#[cfg(has_embedded_patches)]
include!(concat!(env!("OUT_DIR"), "/embedded_patches.rs"));

#[cfg(not(has_embedded_patches))]
pub const PNSOVR_PATCH: Option<&[u8]> = None;
#[cfg(not(has_embedded_patches))]
pub const R15_PATCH: Option<&[u8]> = None;

/// Delta payload for `libpnsovr.so`, if this build carries it.
pub fn pnsovr_patch() -> Result<&'static [u8], PatcherError> {
    PNSOVR_PATCH.ok_or_else(|| PatcherError::ResourceMissing("libpnsovr_patch.bin".into()))
}

/// Delta payload for `libr15.so`, if this build carries it.
pub fn r15_patch() -> Result<&'static [u8], PatcherError> {
    R15_PATCH.ok_or_else(|| PatcherError::ResourceMissing("libr15_patch.bin".into()))
}
