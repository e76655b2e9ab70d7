/*
 * EchoPatch v1.0.0
 * Copyright (c) 2026 EchoPatch contributors.
 * Licensed under the MIT License.
 */

//! Binary delta application.
//!
//! The payload format is a bsdiff-family container: a 32-byte big-endian
//! header (magic, control length, diff length, output length) followed by
//! three zlib-compressed blocks. Control records are `(add, copy, seek)`
//! triples: add `add` bytes of old data plus diff data, copy `copy` literal
//! bytes from the extra block, then move the old-file cursor by `seek`.
//! Reconstruction is fully deterministic.

use crate::error::PatcherError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Cursor, Read, Write};

/// "ZBSDIFF1" as a big-endian u64.
const DELTA_MAGIC: u64 = 0x5A42_5344_4946_4631;

const HEADER_LEN: usize = 32;

#[derive(Debug, Clone)]
struct DeltaHeader {
    control_len: u64,
    diff_len: u64,
    output_len: u64,
}

impl DeltaHeader {
    fn read(reader: &mut impl Read) -> Result<Self, PatcherError> {
        let magic = reader
            .read_u64::<BigEndian>()
            .map_err(|_| PatcherError::PatchFailed("delta truncated before header".into()))?;
        if magic != DELTA_MAGIC {
            return Err(PatcherError::PatchFailed(format!(
                "bad delta magic {:#018x}",
                magic
            )));
        }
        let control_len = reader.read_i64::<BigEndian>()?;
        let diff_len = reader.read_i64::<BigEndian>()?;
        let output_len = reader.read_i64::<BigEndian>()?;
        if control_len < 0 || diff_len < 0 || output_len < 0 {
            return Err(PatcherError::PatchFailed(
                "negative block length in delta header".into(),
            ));
        }
        Ok(Self {
            control_len: control_len as u64,
            diff_len: diff_len as u64,
            output_len: output_len as u64,
        })
    }

    fn write(&self, writer: &mut impl Write) -> Result<(), PatcherError> {
        writer.write_u64::<BigEndian>(DELTA_MAGIC)?;
        writer.write_i64::<BigEndian>(self.control_len as i64)?;
        writer.write_i64::<BigEndian>(self.diff_len as i64)?;
        writer.write_i64::<BigEndian>(self.output_len as i64)?;
        Ok(())
    }
}

/// Apply `delta` to `old`, streaming the reconstructed bytes into `out`.
/// Returns the number of bytes written.
pub fn apply(old: &[u8], delta: &[u8], out: &mut impl Write) -> Result<u64, PatcherError> {
    if delta.len() < HEADER_LEN {
        return Err(PatcherError::PatchFailed(format!(
            "delta too short: {} bytes",
            delta.len()
        )));
    }
    let mut cursor = Cursor::new(delta);
    let header = DeltaHeader::read(&mut cursor)?;

    let control = read_block(&mut cursor, header.control_len)?;
    let diff = read_block(&mut cursor, header.diff_len)?;
    let mut extra_compressed = Vec::new();
    cursor.read_to_end(&mut extra_compressed)?;
    let extra = inflate(&extra_compressed)?;

    let mut control = Cursor::new(control.as_slice());
    let mut diff = Cursor::new(diff.as_slice());
    let mut extra = Cursor::new(extra.as_slice());

    let output_len = header.output_len;
    let mut written = 0u64;
    let mut old_pos = 0usize;
    let mut add_buf = Vec::new();

    while written < output_len {
        let add_len = read_control_field(&mut control)?;
        let copy_len = read_control_field(&mut control)?;
        let seek = control.read_i64::<BigEndian>().map_err(|_| {
            PatcherError::PatchFailed("control block truncated mid-record".into())
        })?;

        if written + add_len as u64 + copy_len as u64 > output_len {
            return Err(PatcherError::PatchFailed(
                "delta would exceed declared output length".into(),
            ));
        }

        // Old bytes past the end of the original read as zero, matching the
        // reference patcher.
        add_buf.clear();
        add_buf.resize(add_len, 0);
        diff.read_exact(&mut add_buf).map_err(|_| {
            PatcherError::PatchFailed("diff block shorter than control demands".into())
        })?;
        for byte in add_buf.iter_mut() {
            let old_byte = old.get(old_pos).copied().unwrap_or(0);
            *byte = old_byte.wrapping_add(*byte);
            old_pos += 1;
        }
        out.write_all(&add_buf)?;

        let mut copy_buf = vec![0u8; copy_len];
        extra.read_exact(&mut copy_buf).map_err(|_| {
            PatcherError::PatchFailed("extra block shorter than control demands".into())
        })?;
        out.write_all(&copy_buf)?;

        written += add_len as u64 + copy_len as u64;

        if seek < 0 {
            old_pos = old_pos.saturating_sub(seek.unsigned_abs() as usize);
        } else {
            old_pos = old_pos.saturating_add(seek as usize);
        }
    }

    Ok(written)
}

/// Build a delta that reconstructs `new` from `old`.
///
/// A single-record greedy encoding: common-length bytes go through the diff
/// block, the tail of `new` through the extra block. Valid and deterministic,
/// not minimal; release payloads come from a dedicated diffing tool.
pub fn create(old: &[u8], new: &[u8]) -> Result<Vec<u8>, PatcherError> {
    let add_len = old.len().min(new.len());

    let mut control = Vec::new();
    control.write_i64::<BigEndian>(add_len as i64)?;
    control.write_i64::<BigEndian>((new.len() - add_len) as i64)?;
    control.write_i64::<BigEndian>(0)?;

    let mut diff = Vec::with_capacity(add_len);
    for i in 0..add_len {
        diff.push(new[i].wrapping_sub(old[i]));
    }
    let extra = &new[add_len..];

    let control_z = deflate(&control)?;
    let diff_z = deflate(&diff)?;
    let extra_z = deflate(extra)?;

    let mut delta = Vec::with_capacity(HEADER_LEN + control_z.len() + diff_z.len() + extra_z.len());
    DeltaHeader {
        control_len: control_z.len() as u64,
        diff_len: diff_z.len() as u64,
        output_len: new.len() as u64,
    }
    .write(&mut delta)?;
    delta.extend_from_slice(&control_z);
    delta.extend_from_slice(&diff_z);
    delta.extend_from_slice(&extra_z);
    Ok(delta)
}

fn read_control_field(cursor: &mut Cursor<&[u8]>) -> Result<usize, PatcherError> {
    let value = cursor
        .read_i64::<BigEndian>()
        .map_err(|_| PatcherError::PatchFailed("control block truncated".into()))?;
    if value < 0 {
        return Err(PatcherError::PatchFailed(
            "negative length in control record".into(),
        ));
    }
    Ok(value as usize)
}

fn read_block(cursor: &mut Cursor<&[u8]>, compressed_len: u64) -> Result<Vec<u8>, PatcherError> {
    let mut compressed = vec![0u8; compressed_len as usize];
    cursor
        .read_exact(&mut compressed)
        .map_err(|_| PatcherError::PatchFailed("delta shorter than header declares".into()))?;
    inflate(&compressed)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, PatcherError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| PatcherError::PatchFailed(format!("delta block inflate failed: {}", e)))?;
    Ok(out)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PatcherError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(old: &[u8], new: &[u8]) -> Vec<u8> {
        let delta = create(old, new).unwrap();
        let mut out = Vec::new();
        let written = apply(old, &delta, &mut out).unwrap();
        assert_eq!(written, new.len() as u64);
        out
    }

    #[test]
    fn reconstructs_modified_content() {
        assert_eq!(roundtrip(b"Hello, World!", b"Hello, Rust!"), b"Hello, Rust!");
    }

    #[test]
    fn reconstructs_from_empty_original() {
        assert_eq!(roundtrip(b"", b"fresh content"), b"fresh content");
    }

    #[test]
    fn reconstructs_empty_target() {
        assert_eq!(roundtrip(b"old content", b""), b"");
    }

    #[test]
    fn application_is_deterministic() {
        let old: Vec<u8> = (0u16..4096).map(|i| (i % 251) as u8).collect();
        let mut new = old.clone();
        new[100] = 0xAA;
        new[2000] = 0xBB;
        new.extend_from_slice(b"appended section");

        let delta = create(&old, &new).unwrap();
        let mut first = Vec::new();
        let mut second = Vec::new();
        apply(&old, &delta, &mut first).unwrap();
        apply(&old, &delta, &mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, new);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut delta = create(b"aaa", b"bbb").unwrap();
        delta[0] ^= 0xFF;
        let mut out = Vec::new();
        assert!(matches!(
            apply(b"aaa", &delta, &mut out),
            Err(PatcherError::PatchFailed(_))
        ));
    }

    #[test]
    fn rejects_truncated_delta() {
        let delta = create(b"aaaa", b"bbbb").unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            apply(b"aaaa", &delta[..delta.len() - 3], &mut out),
            Err(PatcherError::PatchFailed(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        let mut out = Vec::new();
        assert!(matches!(
            apply(b"aaaa", b"definitely not a delta", &mut out),
            Err(PatcherError::PatchFailed(_))
        ));
    }
}
