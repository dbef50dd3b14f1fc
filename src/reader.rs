//! The reader contract (spec §4.2).
//!
//! Grounded on the teacher's `io::RangeReader` trait, resynthesised as a synchronous,
//! lifetime-borrowing contract: the specification's parallel read strategy is a plain OS thread
//! pool (§5), not an async runtime, so `async_trait`/`tokio` are dropped in favour of a trait whose
//! `read` returns a borrowed [`ByteView`] tied to `&self`. Concurrent calls on separate threads must
//! be safe and independently usable, matching the teacher's `Send + Sync` bound on `RangeReader`.

use crate::error::TiffError;

/// A view over `size` bytes read from a [`Reader`].
///
/// Move-only, nothrow-movable, never mutated by the core. Per spec §9's design note, a reader
/// implementation is free to either borrow into its own storage (e.g. a memory-mapped region) or
/// hand back an owned copy (e.g. a positioned file read, which has nowhere to borrow from); both
/// are represented uniformly here so callers never have to special-case the backend. The core never
/// retains a `ByteView` across a suspension point of a read strategy.
#[derive(Debug)]
enum ByteViewStorage<'a> {
    Borrowed(&'a [u8]),
    Owned(Vec<u8>),
}

#[derive(Debug)]
pub struct ByteView<'a> {
    storage: ByteViewStorage<'a>,
}

impl<'a> ByteView<'a> {
    /// Construct a view borrowing from storage that outlives it.
    pub fn borrowed(data: &'a [u8]) -> Self {
        ByteView { storage: ByteViewStorage::Borrowed(data) }
    }

    /// Construct a view owning a freshly-read copy (e.g. from a positioned file read).
    pub fn owned(data: Vec<u8>) -> Self {
        ByteView { storage: ByteViewStorage::Owned(data) }
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        match &self.storage {
            ByteViewStorage::Borrowed(data) => data,
            ByteViewStorage::Owned(data) => data,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data().len()
    }

    #[inline]
    pub fn empty(&self) -> bool {
        self.data().is_empty()
    }
}

/// A positioned-read byte source.
///
/// Implementations back the core with local files, memory, memory-mapped regions, or high-latency
/// object storage. The core depends only on this interface; concrete backends
/// ([`crate::backends`]) are convenience implementations, not part of the mandated core.
pub trait Reader: Sync {
    /// Read exactly `size` bytes starting at `offset`.
    ///
    /// A short read is end-of-file, reported as [`TiffError::UnexpectedEndOfFile`], never as a
    /// partial success.
    fn read(&self, offset: u64, size: usize) -> Result<ByteView<'_>, TiffError>;

    /// Total readable length of the resource.
    fn size(&self) -> u64;

    /// Readiness probe; a reader that failed to open reports `false`.
    fn is_valid(&self) -> bool;
}
