/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! JAR-style (v1) archive signing.
//!
//! `sign_in_place` computes a SHA-1 digest for every entry, generates
//! `META-INF/MANIFEST.MF`, `META-INF/CERT.SF` and `META-INF/CERT.RSA`, then
//! rewrites the archive to a side file and swaps it over the original. The
//! rewritten archive is re-opened afterwards and every entry's CRC is
//! checked before the swap, so a failed signing run never replaces the
//! input.

use crate::{
    crypto::CryptoEngine, error::PatcherError, keys::KeyChain, ui::Ui, APP_NAME, BUFFER_SIZE,
    CERT_RSA_NAME, CERT_SF_NAME, MANIFEST_NAME,
};
use crc32fast::Hasher as Crc32;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};
use zip::{
    write::{FileOptions, ZipWriter},
    CompressionMethod, DateTime, ZipArchive,
};

pub struct ArchiveSigner;

impl ArchiveSigner {
    /// Sign `archive` in place with `keys`.
    pub fn sign_in_place(archive: &Path, keys: &KeyChain, ui: &Ui) -> Result<(), PatcherError> {
        let digests = Self::compute_entry_digests(archive, ui)?;
        ui.verbose(&format!("Computed digests for {} entries", digests.len()));

        let side_file = archive.with_extension("signing");
        Self::write_signed_zip(archive, &side_file, keys, &digests, ui)?;

        match Self::verify_zip_integrity(&side_file) {
            Ok(()) => {
                fs::remove_file(archive)?;
                fs::rename(&side_file, archive)?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&side_file);
                Err(e)
            }
        }
    }

    /// SHA-1 digest of every non-directory entry outside META-INF.
    fn compute_entry_digests(
        path: &Path,
        ui: &Ui,
    ) -> Result<BTreeMap<String, String>, PatcherError> {
        let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
        let mut digests = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if name.ends_with('/') || name.starts_with("META-INF/") {
                continue;
            }
            let digest = CryptoEngine::compute_stream_sha1(&mut entry)?;
            ui.very_verbose(&format!("SHA1 {}: {}", name, digest));
            digests.insert(name, digest);
        }
        Ok(digests)
    }

    fn write_signed_zip(
        input: &Path,
        output: &Path,
        keys: &KeyChain,
        digests: &BTreeMap<String, String>,
        ui: &Ui,
    ) -> Result<(), PatcherError> {
        let timestamp = keys.reproducible_timestamp();
        ui.verbose(&format!(
            "Signature timestamp: {:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            timestamp.year(),
            timestamp.month(),
            timestamp.day(),
            timestamp.hour(),
            timestamp.minute(),
            timestamp.second()
        ));

        let out_file = File::create(output)?;
        let mut writer = ZipWriter::new(BufWriter::with_capacity(BUFFER_SIZE, out_file));

        let manifest_bytes = Self::gen_manifest(digests);
        let sf_bytes = Self::gen_sf(&manifest_bytes, digests);
        let rsa_bytes = Self::gen_rsa(keys, &sf_bytes)?;

        Self::write_entry(&mut writer, MANIFEST_NAME, &manifest_bytes, timestamp)?;
        Self::write_entry(&mut writer, CERT_SF_NAME, &sf_bytes, timestamp)?;
        Self::write_entry(&mut writer, CERT_RSA_NAME, &rsa_bytes, timestamp)?;

        let mut archive = ZipArchive::new(BufReader::new(File::open(input)?))?;
        let mut buf = vec![0u8; BUFFER_SIZE];
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if name.starts_with("META-INF/")
                || name.ends_with("MANIFEST.MF")
                || name.ends_with(".SF")
                || name.ends_with(".RSA")
            {
                continue;
            }

            let options = FileOptions::<()>::default()
                .compression_method(entry.compression())
                .last_modified_time(timestamp)
                .unix_permissions(entry.unix_mode().unwrap_or(0o644))
                .with_alignment(4);
            writer.start_file(&name, options)?;
            loop {
                let n = entry.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                writer.write_all(&buf[..n])?;
            }
        }

        writer.finish()?;
        Ok(())
    }

    fn write_entry(
        w: &mut ZipWriter<BufWriter<File>>,
        name: &str,
        data: &[u8],
        t: DateTime,
    ) -> Result<(), PatcherError> {
        let options = FileOptions::<()>::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(t)
            .with_alignment(4);
        w.start_file(name, options)?;
        w.write_all(data)?;
        Ok(())
    }

    // Manifest values wrap at 72 bytes with a one-space continuation, per
    // the JAR manifest format.
    fn write_manifest_line(out: &mut Vec<u8>, key: &str, value: &str) {
        let line = format!("{}: {}", key, value).into_bytes();
        let mut cursor = 0;
        while cursor < line.len() {
            let limit = if cursor == 0 { 72 } else { 71 };
            let chunk = std::cmp::min(line.len() - cursor, limit);
            if cursor > 0 {
                out.push(b' ');
            }
            out.extend_from_slice(&line[cursor..cursor + chunk]);
            out.extend_from_slice(b"\r\n");
            cursor += chunk;
        }
    }

    fn create_manifest_entry(name: &str, hash: &str) -> Vec<u8> {
        let mut entry = Vec::with_capacity(name.len() + hash.len() + 50);
        Self::write_manifest_line(&mut entry, "Name", name);
        Self::write_manifest_line(&mut entry, "SHA1-Digest", hash);
        entry.extend_from_slice(b"\r\n");
        entry
    }

    fn gen_manifest(digests: &BTreeMap<String, String>) -> Vec<u8> {
        let mut out = Vec::with_capacity(50 + digests.len() * 100);
        out.extend_from_slice(b"Manifest-Version: 1.0\r\n");
        Self::write_manifest_line(&mut out, "Created-By", APP_NAME);
        out.extend_from_slice(b"\r\n");
        for (name, hash) in digests {
            out.extend(Self::create_manifest_entry(name, hash));
        }
        out
    }

    fn gen_sf(manifest_bytes: &[u8], digests: &BTreeMap<String, String>) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"Signature-Version: 1.0\r\n");
        Self::write_manifest_line(&mut out, "Created-By", APP_NAME);
        let manifest_hash = CryptoEngine::compute_sha1(manifest_bytes);
        Self::write_manifest_line(&mut out, "SHA1-Digest-Manifest", &manifest_hash);
        out.extend_from_slice(b"\r\n");
        for (name, file_hash) in digests {
            let entry_hash = CryptoEngine::compute_sha1(&Self::create_manifest_entry(name, file_hash));
            Self::write_manifest_line(&mut out, "Name", name);
            Self::write_manifest_line(&mut out, "SHA1-Digest", &entry_hash);
            out.extend_from_slice(b"\r\n");
        }
        out
    }

    fn gen_rsa(keys: &KeyChain, sf: &[u8]) -> Result<Vec<u8>, PatcherError> {
        let mut signature = vec![0u8; keys.private_key.public().modulus_len()];
        let rng = ring::rand::SystemRandom::new();
        keys.private_key
            .sign(crate::keys::RSA_SIGNATURE_SCHEME, &rng, sf, &mut signature)?;
        Ok(signature)
    }

    fn verify_zip_integrity(path: &Path) -> Result<(), PatcherError> {
        let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
        let mut buf = vec![0u8; BUFFER_SIZE];
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let mut hasher = Crc32::new();
            loop {
                let n = entry.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            let stored = entry.crc32();
            let computed = hasher.finalize();
            if stored != computed {
                return Err(PatcherError::SignFailed(format!(
                    "CRC mismatch for `{}`: stored={:#010x}, computed={:#010x}",
                    entry.name(),
                    stored,
                    computed
                )));
            }
        }
        Ok(())
    }
}
