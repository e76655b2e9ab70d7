/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Verification of archives signed by [`crate::signing::ArchiveSigner`].
//! Checks the RSA signature over the SF file, the manifest digest recorded
//! in the SF file, and every entry digest recorded in the manifest.

use crate::{
    crypto::CryptoEngine, error::PatcherError, keys::KeyChain, CERT_RSA_NAME, CERT_SF_NAME,
    MANIFEST_NAME,
};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

pub struct ArtifactVerifier;

impl ArtifactVerifier {
    pub fn verify(path: &Path, keys: &KeyChain) -> Result<(), PatcherError> {
        let mut archive = ZipArchive::new(File::open(path)?)?;

        let signature_bytes = Self::read_entry(&mut archive, CERT_RSA_NAME)?;
        let sf_bytes = Self::read_entry(&mut archive, CERT_SF_NAME)?;
        let manifest_bytes = Self::read_entry(&mut archive, MANIFEST_NAME)?;

        keys.public_key
            .verify(&sf_bytes, &signature_bytes)
            .map_err(|_| PatcherError::SignFailed("RSA signature does not verify".into()))?;

        let manifest_hash = CryptoEngine::compute_sha1(&manifest_bytes);
        let sf_content = String::from_utf8_lossy(&sf_bytes);
        if !sf_content.contains(&format!("SHA1-Digest-Manifest: {}", manifest_hash)) {
            return Err(PatcherError::SignFailed(
                "manifest hash in SF file does not match".into(),
            ));
        }

        let manifest = String::from_utf8_lossy(&manifest_bytes).into_owned();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if name.ends_with('/') || name.starts_with("META-INF/") {
                continue;
            }
            let digest = CryptoEngine::compute_stream_sha1(&mut entry)?;
            if !manifest.contains(&format!("SHA1-Digest: {}", digest)) {
                return Err(PatcherError::SignFailed(format!(
                    "entry `{}` digest not present in manifest",
                    name
                )));
            }
        }

        Ok(())
    }

    fn read_entry(
        archive: &mut ZipArchive<File>,
        name: &str,
    ) -> Result<Vec<u8>, PatcherError> {
        let mut bytes = Vec::new();
        archive
            .by_name(name)
            .map_err(|e| PatcherError::SignFailed(format!("missing {}: {}", name, e)))?
            .read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
