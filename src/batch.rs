//! The chunk batcher (spec §4.7): groups an offset-sorted chunk list into coalesced read spans.
//!
//! Grounded on the teacher's `io::block_cache::BlockCache` range-coalescing logic (which merges
//! adjacent cache-miss ranges before issuing an HTTP range request), generalised into the
//! specification's parameterised gap-tolerance policy with named presets for different storage
//! backends.

use crate::chunk::Tile;

/// Batching policy: `min_batch_size == 0` means every chunk becomes its own batch; otherwise chunks
/// accumulate until a gap or span limit is exceeded (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchParams {
    pub min_batch_size: u64,
    pub max_hole_size: u64,
    pub max_batch_span: u64,
}

impl BatchParams {
    /// Every chunk is its own batch — the right choice for zero-latency local storage where
    /// coalescing buys nothing.
    pub fn none() -> BatchParams {
        BatchParams { min_batch_size: 0, max_hole_size: 0, max_batch_span: 0 }
    }

    /// One batch spanning the whole chunk list, regardless of gaps.
    pub fn all_at_once() -> BatchParams {
        BatchParams { min_batch_size: 1, max_hole_size: u64::MAX, max_batch_span: u64::MAX }
    }

    /// Tuned for a local disk or memory-mapped file: small gaps are cheap to read through.
    pub fn local_storage() -> BatchParams {
        BatchParams { min_batch_size: 128 * 1024, max_hole_size: 32 * 1024, max_batch_span: 1024 * 1024 }
    }

    /// Tuned for high-latency object storage: favour fewer, larger requests even across sizeable
    /// holes.
    pub fn high_latency() -> BatchParams {
        BatchParams { min_batch_size: 1024 * 1024, max_hole_size: 256 * 1024, max_batch_span: 4 * 1024 * 1024 }
    }
}

/// A contiguous sub-sequence of the planner's chunk list plus the half-open file-byte range that
/// covers it (spec §3 "Chunk batch"). Borrows into the planner's vector rather than owning storage.
#[derive(Debug, Clone, Copy)]
pub struct ChunkBatch<'a> {
    pub chunks: &'a [Tile],
    pub min_offset: u64,
    pub max_end: u64,
}

impl<'a> ChunkBatch<'a> {
    #[inline]
    pub fn file_span(&self) -> u64 {
        self.max_end - self.min_offset
    }

    #[inline]
    pub fn total_data_size(&self) -> u64 {
        self.chunks.iter().map(|c| c.byte_count()).sum()
    }

    /// Fraction of the batch's file span that is hole rather than chunk data, in `[0, 1]`.
    pub fn overhead_ratio(&self) -> f64 {
        let span = self.file_span();
        if span == 0 {
            return 0.0;
        }
        1.0 - (self.total_data_size() as f64 / span as f64)
    }
}

/// Drive `params` over an offset-sorted, non-empty-byte-count chunk list, invoking `on_batch` once
/// per batch (spec §4.7). `chunks` must already be sorted by ascending offset — the planner's
/// contract guarantees this.
pub fn batch_chunks<'a>(chunks: &'a [Tile], params: BatchParams, mut on_batch: impl FnMut(ChunkBatch<'a>)) {
    if chunks.is_empty() {
        return;
    }

    if params.min_batch_size == 0 {
        tracing::trace!(chunks = chunks.len(), "batching disabled, one batch per chunk");
        for chunk in chunks {
            on_batch(ChunkBatch { chunks: std::slice::from_ref(chunk), min_offset: chunk.span.offset, max_end: chunk.span.end() });
        }
        return;
    }

    let mut start = 0usize;
    let mut min_offset = chunks[0].span.offset;
    let mut max_end = chunks[0].span.end();
    let mut accumulated = chunks[0].byte_count();
    let mut batch_count = 0usize;

    for i in 1..chunks.len() {
        let chunk = &chunks[i];
        let gap = chunk.span.offset.saturating_sub(max_end);
        let new_span = chunk.span.end().saturating_sub(min_offset);

        if (gap > params.max_hole_size || new_span > params.max_batch_span) && accumulated >= params.min_batch_size {
            tracing::trace!(gap, new_span, accumulated, "flushing chunk batch");
            on_batch(ChunkBatch { chunks: &chunks[start..i], min_offset, max_end });
            batch_count += 1;
            start = i;
            min_offset = chunk.span.offset;
            max_end = chunk.span.end();
            accumulated = chunk.byte_count();
        } else {
            max_end = max_end.max(chunk.span.end());
            accumulated += chunk.byte_count();
        }
    }

    on_batch(ChunkBatch { chunks: &chunks[start..], min_offset, max_end });
    batch_count += 1;
    tracing::debug!(chunks = chunks.len(), batch_count, "coalesced chunk list into batches");
}
