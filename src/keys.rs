/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Signing key material. The tool signs with a development key pair embedded
//! at build time from `certs/`; tests may load a pair from disk instead.

use crate::error::PatcherError;
use ::pem as pem_crate;
use ring::signature::{self, RsaKeyPair, UnparsedPublicKey};
use std::{fs, path::Path};
use x509_parser::prelude::*;
use zip::DateTime;

pub const RSA_SIGNATURE_SCHEME: &dyn signature::RsaEncoding = &signature::RSA_PKCS1_SHA256;

pub const RSA_VERIFICATION_ALGORITHM: &'static dyn signature::VerificationAlgorithm =
    &signature::RSA_PKCS1_2048_8192_SHA256;

#[cfg(has_dev_keys)]
include!(concat!(env!("OUT_DIR"), "/dev_keys.rs"));

#[cfg(not(has_dev_keys))]
pub const DEV_PRIVATE_KEY: &str = "";
#[cfg(not(has_dev_keys))]
pub const DEV_CERTIFICATE: &str = "";

pub struct KeyChain {
    pub private_key: RsaKeyPair,
    pub public_key: UnparsedPublicKey<Vec<u8>>,
    pub cert_not_before: DateTime,
    pub cert_der: Vec<u8>,
}

impl KeyChain {
    /// Load the embedded development key pair.
    pub fn dev() -> Result<Self, PatcherError> {
        if DEV_PRIVATE_KEY.is_empty() || DEV_CERTIFICATE.is_empty() {
            return Err(PatcherError::SignFailed(
                "no development key pair was embedded at build time (certs/ missing)".into(),
            ));
        }
        Self::from_pem(DEV_PRIVATE_KEY.as_bytes(), DEV_CERTIFICATE.as_bytes())
    }

    /// Load a key pair from PEM files on disk.
    pub fn from_files(key_path: &Path, cert_path: &Path) -> Result<Self, PatcherError> {
        Self::from_pem(&fs::read(key_path)?, &fs::read(cert_path)?)
    }

    fn from_pem(key_pem: &[u8], cert_pem: &[u8]) -> Result<Self, PatcherError> {
        let key_der = pem_crate::parse(key_pem)
            .map_err(|e| PatcherError::SignFailed(format!("private key is not PEM: {}", e)))?;
        let private_key = RsaKeyPair::from_pkcs8(key_der.contents())
            .map_err(|e| PatcherError::SignFailed(format!("invalid PKCS#8 private key: {}", e)))?;

        let cert_der = pem_crate::parse(cert_pem)
            .map_err(|e| PatcherError::SignFailed(format!("certificate is not PEM: {}", e)))?
            .contents()
            .to_vec();
        let (_, cert) = X509Certificate::from_der(&cert_der)
            .map_err(|e| PatcherError::SignFailed(format!("invalid X.509 certificate: {}", e)))?;

        let pk_der = cert.public_key().subject_public_key.data.to_vec();
        let cert_not_before = Self::asn1_to_zip_datetime(cert.validity().not_before);

        Ok(Self {
            private_key,
            public_key: UnparsedPublicKey::new(RSA_VERIFICATION_ALGORITHM, pk_der),
            cert_not_before,
            cert_der,
        })
    }

    /// Entry timestamp used for every signed file, taken from the
    /// certificate so repeated signing runs produce identical archives.
    pub fn reproducible_timestamp(&self) -> DateTime {
        self.cert_not_before
    }

    fn asn1_to_zip_datetime(asn1: ASN1Time) -> DateTime {
        let dt = asn1.to_datetime();
        // ZIP DateTime cannot represent years outside 1980..=2107
        let year = (dt.year().max(0) as u16).clamp(1980, 2107);
        DateTime::from_date_and_time(
            year,
            dt.month() as u8,
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
        .unwrap_or_else(|_| DateTime::default())
    }
}
