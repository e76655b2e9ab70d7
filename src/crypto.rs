/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Digest helpers for JAR-style signing. Android v1 signatures use SHA-1
//! digests rendered as base64.

use crate::{error::PatcherError, BUFFER_SIZE};
use base64::{engine::general_purpose::STANDARD as base64_engine, Engine};
use ring::digest;
use std::io::Read;

pub struct CryptoEngine;

impl CryptoEngine {
    pub fn compute_sha1(data: &[u8]) -> String {
        base64_engine.encode(digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, data).as_ref())
    }

    pub fn compute_stream_sha1<R: Read>(reader: &mut R) -> Result<String, PatcherError> {
        let mut ctx = digest::Context::new(&digest::SHA1_FOR_LEGACY_USE_ONLY);
        let mut buf = vec![0u8; BUFFER_SIZE];
        loop {
            let count = reader.read(&mut buf)?;
            if count == 0 {
                break;
            }
            ctx.update(&buf[..count]);
        }
        Ok(base64_engine.encode(ctx.finish().as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_digest_matches_buffer_digest() {
        let data = vec![0x42u8; 200_000];
        let streamed = CryptoEngine::compute_stream_sha1(&mut data.as_slice()).unwrap();
        assert_eq!(streamed, CryptoEngine::compute_sha1(&data));
    }
}
