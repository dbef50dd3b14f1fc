//! TIFF / BigTIFF header parsing (spec §3, §4.3 `get_first_ifd_offset`).
//!
//! Grounded on the teacher's `format::tiff::parser` header layout doc comments and
//! `ByteOrder`/`TiffHeader` types, generalised to parse both the classic 8-byte header and the
//! BigTIFF 16-byte header behind one entry point instead of two ad hoc parsers.

use crate::byteorder::ByteOrder;
use crate::error::TiffError;
use crate::reader::Reader;

/// Size of the classic (32-bit) TIFF header, in bytes.
pub const TIFF_HEADER_SIZE: usize = 8;
/// Size of the BigTIFF (64-bit) header, in bytes.
pub const BIGTIFF_HEADER_SIZE: usize = 16;

const VERSION_TIFF: u16 = 42;
const VERSION_BIGTIFF: u16 = 43;
const BIGTIFF_OFFSET_SIZE: u16 = 8;

/// Which on-wire format a file uses. Determines IFD entry/offset widths throughout the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TiffFormat {
    /// Classic 32-bit TIFF: 16-bit IFD entry count, 32-bit offsets, 4-byte inline value slot.
    Classic,
    /// BigTIFF: 64-bit IFD entry count, 64-bit offsets, 8-byte inline value slot.
    BigTiff,
}

impl TiffFormat {
    /// Width, in bytes, of offsets and the inline-value slot for this format.
    #[inline]
    pub const fn offset_width(self) -> usize {
        match self {
            TiffFormat::Classic => 4,
            TiffFormat::BigTiff => 8,
        }
    }

    /// Inline-value threshold: `count * type_size <= inline_limit` means the value is stored
    /// inline in the tag entry rather than at an external offset.
    #[inline]
    pub const fn inline_limit(self) -> usize {
        self.offset_width()
    }

    /// Width, in bytes, of the IFD entry count field.
    #[inline]
    pub const fn count_width(self) -> usize {
        match self {
            TiffFormat::Classic => 2,
            TiffFormat::BigTiff => 8,
        }
    }
}

/// Parsed header: byte order, on-wire format, and the offset of the first IFD.
#[derive(Debug, Clone, Copy)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    pub format: TiffFormat,
    pub first_ifd_offset: u64,
}

/// Parse and validate the header, returning the first IFD's offset (spec §4.3).
///
/// Fails with [`TiffError::InvalidHeader`] on an unrecognised byte-order mark, a version that is
/// neither 42 nor 43, a BigTIFF offset-width field other than 8, or a non-zero BigTIFF reserved
/// field.
pub fn get_first_ifd_offset(reader: &dyn Reader) -> Result<TiffHeader, TiffError> {
    if reader.size() < TIFF_HEADER_SIZE as u64 {
        tracing::warn!(size = reader.size(), "file too small for a TIFF header");
        return Err(TiffError::InvalidHeader(format!(
            "file too small for a TIFF header: need at least {TIFF_HEADER_SIZE} bytes, found {}",
            reader.size()
        )));
    }

    let view = reader.read(0, TIFF_HEADER_SIZE)?;
    let head = view.data();

    let mark = u16::from_le_bytes([head[0], head[1]]);
    let byte_order = match mark {
        m if m == ByteOrder::MARK_LITTLE => ByteOrder::Little,
        m if m == ByteOrder::MARK_BIG => ByteOrder::Big,
        other => {
            tracing::warn!(mark = format!("0x{other:04X}"), "invalid TIFF byte-order mark");
            return Err(TiffError::InvalidHeader(format!(
                "invalid byte-order mark: expected 0x4949 (II) or 0x4D4D (MM), found 0x{other:04X}"
            )));
        }
    };

    let version = byte_order.read_u16(&head[2..4]);
    let (format, first_ifd_offset) = match version {
        VERSION_TIFF => {
            let offset = byte_order.read_u32(&head[4..8]) as u64;
            (TiffFormat::Classic, offset)
        }
        VERSION_BIGTIFF => {
            if reader.size() < BIGTIFF_HEADER_SIZE as u64 {
                tracing::warn!(size = reader.size(), "file too small for a BigTIFF header");
                return Err(TiffError::InvalidHeader(format!(
                    "file too small for a BigTIFF header: need at least {BIGTIFF_HEADER_SIZE} bytes, found {}",
                    reader.size()
                )));
            }
            let full = reader.read(0, BIGTIFF_HEADER_SIZE)?;
            let full = full.data();
            let offset_size = byte_order.read_u16(&full[4..6]);
            if offset_size != BIGTIFF_OFFSET_SIZE {
                tracing::warn!(offset_size, "invalid BigTIFF offset byte size");
                return Err(TiffError::InvalidHeader(format!(
                    "invalid BigTIFF offset byte size: expected 8, found {offset_size}"
                )));
            }
            let reserved = byte_order.read_u16(&full[6..8]);
            if reserved != 0 {
                tracing::warn!(reserved, "invalid BigTIFF reserved field");
                return Err(TiffError::InvalidHeader(format!(
                    "invalid BigTIFF reserved field: expected 0, found {reserved}"
                )));
            }
            let offset = byte_order.read_u64(&full[8..16]);
            (TiffFormat::BigTiff, offset)
        }
        other => {
            tracing::warn!(version = other, "invalid TIFF version");
            return Err(TiffError::InvalidHeader(format!(
                "invalid TIFF version: expected 42 or 43, found {other}"
            )));
        }
    };

    if first_ifd_offset >= reader.size() {
        tracing::warn!(first_ifd_offset, size = reader.size(), "first IFD offset lies outside the file");
        return Err(TiffError::InvalidHeader(format!(
            "first IFD offset {first_ifd_offset} lies outside the file (size {})",
            reader.size()
        )));
    }

    tracing::trace!(format = ?format, first_ifd_offset, "parsed TIFF header");
    Ok(TiffHeader { byte_order, format, first_ifd_offset })
}

impl ByteOrder {
    #[inline]
    pub(crate) fn read_u16(self, b: &[u8]) -> u16 {
        let raw = u16::from_le_bytes([b[0], b[1]]);
        match self {
            ByteOrder::Little => raw,
            ByteOrder::Big => u16::from_be_bytes([b[0], b[1]]),
        }
    }

    #[inline]
    pub(crate) fn read_u32(self, b: &[u8]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            ByteOrder::Big => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        }
    }

    #[inline]
    pub(crate) fn read_u64(self, b: &[u8]) -> u64 {
        match self {
            ByteOrder::Little => u64::from_le_bytes(b[..8].try_into().unwrap()),
            ByteOrder::Big => u64::from_be_bytes(b[..8].try_into().unwrap()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemorySource;

    fn classic_header(le: bool, ifd_offset: u32, total_size: usize) -> Vec<u8> {
        let mut v = vec![0u8; total_size];
        if le {
            v[0..2].copy_from_slice(b"II");
            v[2..4].copy_from_slice(&42u16.to_le_bytes());
            v[4..8].copy_from_slice(&ifd_offset.to_le_bytes());
        } else {
            v[0..2].copy_from_slice(b"MM");
            v[2..4].copy_from_slice(&42u16.to_be_bytes());
            v[4..8].copy_from_slice(&ifd_offset.to_be_bytes());
        }
        v
    }

    fn bigtiff_header(le: bool, ifd_offset: u64, total_size: usize) -> Vec<u8> {
        let mut v = vec![0u8; total_size];
        if le {
            v[0..2].copy_from_slice(b"II");
            v[2..4].copy_from_slice(&43u16.to_le_bytes());
            v[4..6].copy_from_slice(&8u16.to_le_bytes());
            v[6..8].copy_from_slice(&0u16.to_le_bytes());
            v[8..16].copy_from_slice(&ifd_offset.to_le_bytes());
        } else {
            v[0..2].copy_from_slice(b"MM");
            v[2..4].copy_from_slice(&43u16.to_be_bytes());
            v[4..6].copy_from_slice(&8u16.to_be_bytes());
            v[6..8].copy_from_slice(&0u16.to_be_bytes());
            v[8..16].copy_from_slice(&ifd_offset.to_be_bytes());
        }
        v
    }

    #[test]
    fn parses_classic_header_both_endiannesses() {
        for le in [true, false] {
            let bytes = classic_header(le, 8, 16);
            let r = MemorySource::new(bytes);
            let h = get_first_ifd_offset(&r).unwrap();
            assert_eq!(h.format, TiffFormat::Classic);
            assert_eq!(h.first_ifd_offset, 8);
            assert_eq!(h.byte_order, if le { ByteOrder::Little } else { ByteOrder::Big });
        }
    }

    #[test]
    fn parses_bigtiff_header_both_endiannesses() {
        for le in [true, false] {
            let bytes = bigtiff_header(le, 16, 32);
            let r = MemorySource::new(bytes);
            let h = get_first_ifd_offset(&r).unwrap();
            assert_eq!(h.format, TiffFormat::BigTiff);
            assert_eq!(h.first_ifd_offset, 16);
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = classic_header(true, 8, 16);
        bytes[0] = b'X';
        let r = MemorySource::new(bytes);
        assert!(matches!(get_first_ifd_offset(&r), Err(TiffError::InvalidHeader(_))));
    }

    #[test]
    fn rejects_bad_version() {
        let mut bytes = classic_header(true, 8, 16);
        bytes[2..4].copy_from_slice(&99u16.to_le_bytes());
        let r = MemorySource::new(bytes);
        assert!(matches!(get_first_ifd_offset(&r), Err(TiffError::InvalidHeader(_))));
    }

    #[test]
    fn rejects_bad_bigtiff_offset_width() {
        let mut bytes = bigtiff_header(true, 16, 32);
        bytes[4..6].copy_from_slice(&4u16.to_le_bytes());
        let r = MemorySource::new(bytes);
        assert!(matches!(get_first_ifd_offset(&r), Err(TiffError::InvalidHeader(_))));
    }

    #[test]
    fn rejects_nonzero_reserved() {
        let mut bytes = bigtiff_header(true, 16, 32);
        bytes[6..8].copy_from_slice(&1u16.to_le_bytes());
        let r = MemorySource::new(bytes);
        assert!(matches!(get_first_ifd_offset(&r), Err(TiffError::InvalidHeader(_))));
    }
}
