//! IFD chain walking and raw tag-entry access (spec §4.3).
//!
//! Grounded on the teacher's `format::tiff::parser::{Ifd, IfdEntry}`, generalised to the classic
//! vs. BigTIFF entry width split and to deferred endian conversion: the parser here never
//! interprets a tag's value, only its structural code/type/count, exactly as spec §4.3 requires
//! ("the parser never interprets tag values; it yields only raw entries").

use crate::byteorder::ByteOrder;
use crate::error::TiffError;
use crate::header::{TiffFormat, TiffHeader};
use crate::reader::Reader;

/// Size, in bytes, of one raw tag entry for a given format (not counting the IFD's own
/// count/next-offset fields).
const fn entry_size(format: TiffFormat) -> usize {
    match format {
        // tag(2) + type(2) + count(4) + value(4)
        TiffFormat::Classic => 12,
        // tag(2) + type(2) + count(8) + value(8)
        TiffFormat::BigTiff => 20,
    }
}

/// One raw IFD tag entry. The structural fields (`tag`, `field_type`, `count`) are already
/// endian-converted, since the extractor's two-pointer merge needs them to order and size entries;
/// the inline value bytes are left exactly as they appear on disk, and are converted lazily by the
/// typed accessor in [`crate::metadata`] once the target domain type is known.
#[derive(Debug, Clone)]
pub struct RawTagEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u64,
    /// Raw inline value slot: 4 bytes for classic TIFF, 8 for BigTIFF. Unused trailing bytes are
    /// zero. When the value does not fit inline, this holds the external offset in file byte
    /// order (lazily converted on read, like every other offset).
    pub value_bytes: [u8; 8],
}

impl RawTagEntry {
    fn parse(bytes: &[u8], format: TiffFormat, order: ByteOrder) -> RawTagEntry {
        let tag = order.read_u16(&bytes[0..2]);
        let field_type = order.read_u16(&bytes[2..4]);
        let (count, value_start) = match format {
            TiffFormat::Classic => (order.read_u32(&bytes[4..8]) as u64, 8),
            TiffFormat::BigTiff => (order.read_u64(&bytes[4..12]), 12),
        };
        let mut value_bytes = [0u8; 8];
        let width = format.offset_width();
        value_bytes[..width].copy_from_slice(&bytes[value_start..value_start + width]);
        RawTagEntry { tag, field_type, count, value_bytes }
    }

    /// Whether this entry's value is stored inline (vs. at an external offset), given the format's
    /// inline-value slot width and the entry's declared type size.
    pub fn is_inline(&self, format: TiffFormat, type_size: usize) -> bool {
        self.count.saturating_mul(type_size as u64) <= format.inline_limit() as u64
    }

    /// Interpret the inline value slot as an offset into the file, in the header's byte order.
    pub fn external_offset(&self, format: TiffFormat, order: ByteOrder) -> u64 {
        match format {
            TiffFormat::Classic => order.read_u32(&self.value_bytes[0..4]) as u64,
            TiffFormat::BigTiff => order.read_u64(&self.value_bytes[0..8]),
        }
    }
}

/// A parsed IFD: its raw tag entries (in file order) and the offset of the next IFD (0 terminates
/// the chain).
#[derive(Debug, Clone)]
pub struct Ifd {
    pub entries: Vec<RawTagEntry>,
    pub next_ifd_offset: u64,
}

/// Read one IFD at `offset`: the entry count, all raw tag entries, and the next-IFD offset, in as
/// few reads as possible (spec §4.3).
pub fn read_ifd(reader: &dyn Reader, header: &TiffHeader, offset: u64) -> Result<Ifd, TiffError> {
    let count_width = header.format.count_width();
    let count_view = reader.read(offset, count_width)?;
    let count = match header.format {
        TiffFormat::Classic => header.byte_order.read_u16(count_view.data()) as u64,
        TiffFormat::BigTiff => header.byte_order.read_u64(count_view.data()),
    };

    let esz = entry_size(header.format);
    let entries_offset = offset + count_width as u64;
    let entries_len = count as usize * esz;
    let next_offset_width = header.format.offset_width();

    let block = reader.read(entries_offset, entries_len + next_offset_width)?;
    let block = block.data();

    let mut entries = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let start = i * esz;
        entries.push(RawTagEntry::parse(&block[start..start + esz], header.format, header.byte_order));
    }

    let next_bytes = &block[entries_len..entries_len + next_offset_width];
    let next_ifd_offset = match header.format {
        TiffFormat::Classic => header.byte_order.read_u32(next_bytes) as u64,
        TiffFormat::BigTiff => header.byte_order.read_u64(next_bytes),
    };

    Ok(Ifd { entries, next_ifd_offset })
}

/// Read just the next-IFD offset immediately following a tag array (spec §4.3
/// `read_next_ifd_offset`), without re-reading the entries. Exposed for callers that already hold
/// the entry count and want to fetch only the trailing pointer.
pub fn read_next_ifd_offset(
    reader: &dyn Reader,
    header: &TiffHeader,
    ifd_offset: u64,
    entry_count: u64,
) -> Result<u64, TiffError> {
    let esz = entry_size(header.format);
    let next_offset_pos = ifd_offset + header.format.count_width() as u64 + entry_count * esz as u64;
    let width = header.format.offset_width();
    let view = reader.read(next_offset_pos, width)?;
    Ok(match header.format {
        TiffFormat::Classic => header.byte_order.read_u32(view.data()) as u64,
        TiffFormat::BigTiff => header.byte_order.read_u64(view.data()),
    })
}

/// Follow `next_ifd_offset` links from the header's first IFD until a zero terminates the chain,
/// collecting each IFD's file offset in order. Bounded by `max_pages` to defeat malformed circular
/// chains (spec §4.3).
pub fn walk_ifd_chain(
    reader: &dyn Reader,
    header: &TiffHeader,
    max_pages: usize,
) -> Result<Vec<u64>, TiffError> {
    let mut offsets = Vec::new();
    let mut next = header.first_ifd_offset;
    while next != 0 && offsets.len() < max_pages {
        offsets.push(next);
        let ifd = read_ifd(reader, header, next)?;
        next = ifd.next_ifd_offset;
    }
    if next != 0 {
        tracing::debug!(max_pages, "IFD chain walk stopped at the caller's page bound");
    }
    Ok(offsets)
}

impl Ifd {
    /// Look up the first entry for `tag`, if present. The extractor (§4.4) uses a two-pointer
    /// merge instead of this for whole-spec extraction; this is for ad hoc single-tag lookups.
    pub fn entry(&self, tag: u16) -> Option<&RawTagEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    /// `true` iff entries are in strictly ascending tag-code order, as the spec mandates for a
    /// well-formed file.
    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].tag < w[1].tag)
    }

    /// Sort entries by ascending tag code in place (lenient-mode recovery for unsorted files).
    pub fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.tag);
    }
}
