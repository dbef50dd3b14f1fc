//! The `None` compression scheme: verbatim memcpy with an output-size check (spec §4.9).

use crate::error::TiffError;

pub fn decompress(compressed: &[u8], output: &mut [u8]) -> Result<usize, TiffError> {
    if compressed.len() > output.len() {
        return Err(TiffError::OutOfBounds(format!(
            "uncompressed input is {} bytes, output buffer is {}",
            compressed.len(),
            output.len()
        )));
    }
    output[..compressed.len()].copy_from_slice(compressed);
    Ok(compressed.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_bytes_verbatim() {
        let mut out = vec![0u8; 4];
        let n = decompress(&[1, 2, 3], &mut out).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&out[..3], &[1, 2, 3]);
    }

    #[test]
    fn rejects_oversized_input() {
        let mut out = vec![0u8; 2];
        assert!(decompress(&[1, 2, 3], &mut out).is_err());
    }
}
