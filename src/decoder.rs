//! The decoder (spec §4.9): decompress one chunk's bytes and reverse its predictor, in place.
//!
//! Grounded on the teacher's per-request decode path in `format::tiff` (decompress once, reuse no
//! scratch across requests), generalised to own a reusable scratch buffer across calls, as spec
//! §3 "Ownership" requires ("the decoder owns a per-instance scratch buffer; it is not shared
//! across threads").

use crate::byteorder::ByteOrder;
use crate::compression::{self, Compression};
use crate::error::TiffError;
use crate::geometry::PixelType;
use crate::predictor::{self, Predictor};

/// A decoder instance: not thread-safe (spec §4.9 "per-instance, not thread-safe"). Callers that
/// need concurrent decoding run one `Decoder` per worker thread (spec §5's permitted alternative).
pub struct Decoder<P: PixelType> {
    scratch: Vec<u8>,
    _pixel: std::marker::PhantomData<P>,
}

impl<P: PixelType> Default for Decoder<P> {
    fn default() -> Self {
        Decoder { scratch: Vec::new(), _pixel: std::marker::PhantomData }
    }
}

impl<P: PixelType> Decoder<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decompress `compressed` into `output` and reverse the predictor in place (spec §4.9
    /// `decode_into`). Returns the number of bytes written.
    #[allow(clippy::too_many_arguments)]
    pub fn decode_into(
        &mut self,
        compressed: &[u8],
        output: &mut [u8],
        width: u32,
        height: u32,
        samples_per_pixel: u16,
        compression: Compression,
        predictor: Predictor,
        order: ByteOrder,
    ) -> Result<usize, TiffError> {
        let required = width as u64 * height as u64 * samples_per_pixel as u64 * std::mem::size_of::<P>() as u64;
        if (output.len() as u64) < required {
            tracing::warn!(output_len = output.len(), required, "decode output buffer undersized");
            return Err(TiffError::OutOfBounds(format!(
                "decode output buffer is {} bytes, need at least {required}",
                output.len()
            )));
        }

        let written = match compression::decompress(compression, compressed, output) {
            Ok(written) => written,
            Err(err) => {
                tracing::warn!(?compression, compressed_len = compressed.len(), %err, "chunk decompression failed");
                return Err(err);
            }
        };

        predictor::reverse_predictor(
            predictor,
            &mut output[..written],
            std::mem::size_of::<P>(),
            width as usize,
            height as usize,
            samples_per_pixel as usize,
            order,
            matches!(P::SAMPLE_FORMAT, crate::geometry::SampleFormat::IEEEFloat),
        );

        Ok(written)
    }

    /// Decode into the decoder's own scratch buffer, returning a borrowed span invalidated by the
    /// next call (spec §4.9 `decode`).
    #[allow(clippy::too_many_arguments)]
    pub fn decode(
        &mut self,
        compressed: &[u8],
        width: u32,
        height: u32,
        samples_per_pixel: u16,
        compression: Compression,
        predictor: Predictor,
        order: ByteOrder,
    ) -> Result<&[u8], TiffError> {
        let required = width as usize * height as usize * samples_per_pixel as usize * std::mem::size_of::<P>();
        self.scratch.clear();
        self.scratch.resize(required, 0);

        let mut scratch = std::mem::take(&mut self.scratch);
        let result = self.decode_into(compressed, &mut scratch, width, height, samples_per_pixel, compression, predictor, order);
        self.scratch = scratch;
        let written = result?;
        Ok(&self.scratch[..written])
    }

    /// Decode into an owned, freshly-allocated buffer (spec §4.9 `decode_copy`).
    #[allow(clippy::too_many_arguments)]
    pub fn decode_copy(
        &mut self,
        compressed: &[u8],
        width: u32,
        height: u32,
        samples_per_pixel: u16,
        compression: Compression,
        predictor: Predictor,
        order: ByteOrder,
    ) -> Result<Vec<u8>, TiffError> {
        Ok(self.decode(compressed, width, height, samples_per_pixel, compression, predictor, order)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_into_rejects_undersized_output() {
        let mut decoder: Decoder<u8> = Decoder::new();
        let mut output = vec![0u8; 2];
        let err = decoder
            .decode_into(&[1, 2, 3], &mut output, 2, 2, 1, Compression::None, Predictor::None, ByteOrder::Little)
            .unwrap_err();
        assert!(matches!(err, TiffError::OutOfBounds(_)));
    }

    #[test]
    fn decode_none_compression_with_horizontal_predictor() {
        let mut decoder: Decoder<u8> = Decoder::new();
        let compressed = vec![10, 1, 1, 1];
        let out = decoder
            .decode(&compressed, 4, 1, 1, Compression::None, Predictor::Horizontal, ByteOrder::Little)
            .unwrap();
        assert_eq!(out, &[10, 11, 12, 13]);
    }

    #[test]
    fn decode_copy_returns_independent_buffer() {
        let mut decoder: Decoder<u8> = Decoder::new();
        let a = decoder.decode_copy(&[1, 2, 3, 4], 4, 1, 1, Compression::None, Predictor::None, ByteOrder::Little).unwrap();
        let b = decoder.decode_copy(&[5, 6, 7, 8], 4, 1, 1, Compression::None, Predictor::None, ByteOrder::Little).unwrap();
        assert_eq!(a, vec![1, 2, 3, 4]);
        assert_eq!(b, vec![5, 6, 7, 8]);
    }

    #[test]
    fn decode_packbits_then_predictor() {
        let mut decoder: Decoder<u8> = Decoder::new();
        // PackBits-encoded [10, 11, 12, 13]: all distinct, so one literal run of 4.
        let compressed = vec![3, 10, 1, 1, 1];
        let out = decoder
            .decode(&compressed, 4, 1, 1, Compression::PackBits, Predictor::Horizontal, ByteOrder::Little)
            .unwrap();
        assert_eq!(out, &[10, 11, 12, 13]);
    }
}
