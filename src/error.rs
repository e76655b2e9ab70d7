/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Error types for the patching pipeline.
//! Every failure is terminal: errors propagate to `main`, which reports them
//! on the console and exits with a code specific to the error kind.

use std::{fmt, io};

/// Comprehensive error type for all pipeline operations.
#[derive(Debug)]
pub enum PatcherError {
    /// Input APK path does not exist or is not a file
    InputNotFound(String),
    /// Input APK content hash does not match the supported build
    IntegrityMismatch { expected: String, actual: String },
    /// config.json not found beside the input APK
    ConfigNotFound(String),
    /// config.json exists but could not be read
    ConfigUnreadable(String),
    /// config.json is not parseable JSON
    ConfigMalformed(String),
    /// config.json parsed but fails the endpoint schema
    ConfigInvalidSchema(String),
    /// Embedded patch payload absent from this build of the tool
    ResourceMissing(String),
    /// ZIP format errors during extract or repack
    ArchiveCorrupt(zip::result::ZipError),
    /// Binary delta could not be applied
    PatchFailed(String),
    /// Signing or post-sign verification failed
    SignFailed(String),
    /// I/O errors during extract/copy/move/delete
    Io(io::Error),
    /// Bad command line or setup
    Usage(String),
}

impl PatcherError {
    /// Process exit code for this error kind. Zero is reserved for success.
    pub fn exit_code(&self) -> i32 {
        match self {
            PatcherError::InputNotFound(_) => 2,
            PatcherError::IntegrityMismatch { .. } => 3,
            PatcherError::ConfigNotFound(_) => 4,
            PatcherError::ConfigUnreadable(_) => 5,
            PatcherError::ConfigMalformed(_) => 6,
            PatcherError::ConfigInvalidSchema(_) => 7,
            PatcherError::ResourceMissing(_) => 8,
            PatcherError::ArchiveCorrupt(_) => 9,
            PatcherError::PatchFailed(_) => 10,
            PatcherError::SignFailed(_) => 11,
            PatcherError::Io(_) => 12,
            PatcherError::Usage(_) => 64,
        }
    }
}

impl fmt::Display for PatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatcherError::InputNotFound(s) => write!(
                f,
                "Invalid Echo VR APK: {}. Pass the path to the APK as the first argument.",
                s
            ),
            PatcherError::IntegrityMismatch { expected, actual } => write!(
                f,
                "Invalid Echo VR APK (hash mismatch): expected {}, got {}. \
                 Download the correct APK (version 4987566) and retry.",
                expected, actual
            ),
            PatcherError::ConfigNotFound(s) => write!(
                f,
                "Invalid config: {} not found. Place config.json in the same directory as the APK.",
                s
            ),
            PatcherError::ConfigUnreadable(s) => write!(
                f,
                "Invalid config: could not read {}. Confirm no other program is holding it open.",
                s
            ),
            PatcherError::ConfigMalformed(s) => {
                write!(f, "Invalid config: JSON could not be parsed: {}", s)
            }
            PatcherError::ConfigInvalidSchema(s) => {
                write!(f, "Invalid config: {}. Confirm all service endpoints are correct.", s)
            }
            PatcherError::ResourceMissing(s) => write!(
                f,
                "Missing embedded patch payload: {}. This build of the tool was packaged \
                 without its patch resources.",
                s
            ),
            PatcherError::ArchiveCorrupt(e) => write!(f, "APK archive error: {}", e),
            PatcherError::PatchFailed(s) => write!(f, "Binary patch failed: {}", s),
            PatcherError::SignFailed(s) => write!(f, "Signing failed: {}", s),
            PatcherError::Io(e) => write!(f, "I/O error: {}", e),
            PatcherError::Usage(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for PatcherError {}

impl From<io::Error> for PatcherError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<zip::result::ZipError> for PatcherError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::ArchiveCorrupt(e)
    }
}

impl From<ring::error::Unspecified> for PatcherError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignFailed("cryptographic operation failed".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let errors = [
            PatcherError::InputNotFound("x".into()),
            PatcherError::IntegrityMismatch {
                expected: "a".into(),
                actual: "b".into(),
            },
            PatcherError::ConfigNotFound("x".into()),
            PatcherError::ConfigUnreadable("x".into()),
            PatcherError::ConfigMalformed("x".into()),
            PatcherError::ConfigInvalidSchema("x".into()),
            PatcherError::ResourceMissing("x".into()),
            PatcherError::PatchFailed("x".into()),
            PatcherError::SignFailed("x".into()),
            PatcherError::Usage("x".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&c| c != 0));
    }
}
