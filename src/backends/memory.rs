//! An in-memory [`Reader`](crate::reader::Reader), primarily for tests and for small files already
//! resident in memory.

use crate::error::TiffError;
use crate::reader::{ByteView, Reader};

/// Reads from an owned in-memory byte buffer.
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        MemorySource { data }
    }
}

impl Reader for MemorySource {
    fn read(&self, offset: u64, size: usize) -> Result<ByteView<'_>, TiffError> {
        let offset = offset as usize;
        let end = offset.checked_add(size).ok_or_else(|| TiffError::OutOfBounds(
            "offset + size overflowed usize".to_string(),
        ))?;
        if end > self.data.len() {
            return Err(TiffError::UnexpectedEndOfFile {
                offset: offset as u64,
                expected: size as u64,
                size: self.data.len() as u64,
            });
        }
        Ok(ByteView::borrowed(&self.data[offset..end]))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn is_valid(&self) -> bool {
        true
    }
}
