/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Input identity verification. The tool supports exactly one APK build,
//! identified by its MD5. The digest is an identity check, not a defense
//! against tampering.

use crate::{error::PatcherError, BUFFER_SIZE};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Stream a file through MD5 and render the digest as lowercase hex.
pub fn file_md5(path: &Path) -> Result<String, PatcherError> {
    let mut file = File::open(path)?;
    let mut ctx = md5::Context::new();
    let mut buf = vec![0u8; BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        ctx.consume(&buf[..n]);
    }
    Ok(format!("{:x}", ctx.compute()))
}

/// Compare a file's digest against the expected one, case-insensitively.
pub fn verify(path: &Path, expected: &str) -> Result<(), PatcherError> {
    let actual = file_md5(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(PatcherError::IntegrityMismatch {
            expected: expected.to_ascii_lowercase(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn md5_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.bin");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"hello world").unwrap();
        drop(f);
        // md5sum of "hello world"
        assert_eq!(
            file_md5(&path).unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn verify_accepts_mixed_case_expected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.bin");
        std::fs::write(&path, b"hello world").unwrap();
        verify(&path, "5EB63BBBE01EEED093CB22BB8F5ACDC3").unwrap();
    }

    #[test]
    fn verify_rejects_wrong_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.bin");
        std::fs::write(&path, b"hello world").unwrap();
        match verify(&path, "00000000000000000000000000000000") {
            Err(PatcherError::IntegrityMismatch { actual, .. }) => {
                assert_eq!(actual, "5eb63bbbe01eeed093cb22bb8f5acdc3");
            }
            other => panic!("expected IntegrityMismatch, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");
        assert!(matches!(file_md5(&path), Err(PatcherError::Io(_))));
    }
}
