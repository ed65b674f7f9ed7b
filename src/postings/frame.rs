// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Optional frame compression for stored postings blocks.
//!
//! When the `frame-compression` feature is enabled, each block payload in
//! postings.bin is one brotli frame and the file header carries flag bit 0.
//! Without the feature blocks are stored plain and the flag stays clear;
//! reading a compressed file then fails loudly instead of misdecoding.

use crate::error::Result;

#[cfg(feature = "frame-compression")]
const BROTLI_BUFFER_SIZE: usize = 4096;
#[cfg(feature = "frame-compression")]
const BROTLI_QUALITY: u32 = 5;
#[cfg(feature = "frame-compression")]
const BROTLI_LGWIN: u32 = 22;

/// True when this build stores blocks as compression frames.
pub const fn frames_enabled() -> bool {
    cfg!(feature = "frame-compression")
}

/// Compress one plain block into a single frame.
#[cfg(feature = "frame-compression")]
pub fn compress(plain: &[u8]) -> Result<Vec<u8>> {
    use std::io::Write;

    let mut encoder = brotli::CompressorWriter::new(
        Vec::with_capacity(plain.len() / 2 + 64),
        BROTLI_BUFFER_SIZE,
        BROTLI_QUALITY,
        BROTLI_LGWIN,
    );
    encoder.write_all(plain)?;
    Ok(encoder.into_inner())
}

/// Without the feature, "compression" is the identity; callers must leave
/// the header flag clear.
#[cfg(not(feature = "frame-compression"))]
pub fn compress(plain: &[u8]) -> Result<Vec<u8>> {
    Ok(plain.to_vec())
}

/// Decompress one frame back into the plain block encoding.
#[cfg(feature = "frame-compression")]
pub fn decompress(payload: &[u8]) -> Result<Vec<u8>> {
    use std::io::Read;

    let mut plain = Vec::with_capacity(payload.len() * 2);
    brotli::Decompressor::new(payload, BROTLI_BUFFER_SIZE).read_to_end(&mut plain)?;
    Ok(plain)
}

#[cfg(not(feature = "frame-compression"))]
pub fn decompress(_payload: &[u8]) -> Result<Vec<u8>> {
    Err(crate::error::Error::format(
        "postings file is frame-compressed but this build lacks the frame-compression feature",
    ))
}

#[cfg(all(test, feature = "frame-compression"))]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let plain: Vec<u8> = (0..10_000u32).flat_map(|v| (v % 97).to_le_bytes()).collect();
        let packed = compress(&plain).unwrap();
        assert!(packed.len() < plain.len());
        assert_eq!(decompress(&packed).unwrap(), plain);
    }

    #[test]
    fn empty_block_roundtrips() {
        let packed = compress(&[]).unwrap();
        assert_eq!(decompress(&packed).unwrap(), Vec::<u8>::new());
    }
}
