//! Stripped geometry (spec §3 "Stripped geometry", §4.5 operations on `StrippedImageInfo`).
//!
//! Grounded on the same `format::tiff::pyramid::PyramidLevel` lineage as [`crate::tiled`], with the
//! strip-specific invariant that strips span the full image width and have no depth axis (spec:
//! "Strips do not support depth > 1").

use std::marker::PhantomData;

use crate::chunk::{FileSpan, Tile, TileId, TileSize};
use crate::error::TiffError;
use crate::geometry::{ImageShape, PixelType};
use crate::tags::{compression_code, predictor_code};

/// Strip layout plus offset/byte-count tables, layered on an [`ImageShape`] (spec §3 "Stripped
/// geometry").
#[derive(Debug, Clone)]
pub struct StrippedImageInfo<P: PixelType> {
    pub shape: ImageShape,
    pub rows_per_strip: u32,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
    pub compression: u16,
    pub predictor: u16,
    _pixel: PhantomData<P>,
}

impl<P: PixelType> StrippedImageInfo<P> {
    pub fn new(
        shape: ImageShape,
        rows_per_strip: u32,
        offsets: Vec<u64>,
        byte_counts: Vec<u64>,
        compression: Option<u16>,
        predictor: Option<u16>,
    ) -> Result<StrippedImageInfo<P>, TiffError> {
        if shape.is_3d() {
            return Err(TiffError::UnsupportedFeature("stripped images do not support depth > 1".to_string()));
        }
        let info = StrippedImageInfo {
            shape,
            rows_per_strip,
            offsets,
            byte_counts,
            compression: compression.unwrap_or(compression_code::NONE),
            predictor: predictor.unwrap_or(predictor_code::NONE),
            _pixel: PhantomData,
        };
        let expected = info.num_strips();
        if info.offsets.len() != expected || info.byte_counts.len() != expected {
            return Err(TiffError::InvalidFormat(format!(
                "strip offsets/byte-counts length mismatch: expected {expected}, found {} offsets and {} byte counts",
                info.offsets.len(),
                info.byte_counts.len()
            )));
        }
        Ok(info)
    }

    #[inline]
    pub fn strips_per_plane(&self) -> usize {
        self.shape.height.div_ceil(self.rows_per_strip) as usize
    }

    #[inline]
    fn num_planes(&self) -> usize {
        if self.shape.is_planar() {
            self.shape.samples_per_pixel as usize
        } else {
            1
        }
    }

    #[inline]
    pub fn num_strips(&self) -> usize {
        self.strips_per_plane() * self.num_planes()
    }

    /// Look up one strip's identity and file span (spec §4.5 `get_strip_info`): `index` is local to
    /// `plane`, the last strip in a plane has its height clamped to the image's remaining rows, and
    /// width is always the full image width.
    pub fn get_strip_info(&self, index: usize, plane: u16) -> Result<Tile, TiffError> {
        let per_plane = self.strips_per_plane();
        if index >= per_plane {
            return Err(TiffError::OutOfBounds(format!("strip index {index} outside plane range 0..{per_plane}")));
        }
        let plane_idx = if self.shape.is_planar() { plane as usize } else { 0 };
        if plane_idx >= self.num_planes() {
            return Err(TiffError::OutOfBounds(format!("sample plane {plane} outside range 0..{}", self.num_planes())));
        }
        let linear = plane_idx * per_plane + index;

        let start_row = index as u32 * self.rows_per_strip;
        let height = self.rows_per_strip.min(self.shape.height - start_row);
        let nsamples = if self.shape.is_planar() { 1 } else { self.shape.samples_per_pixel };

        Ok(Tile {
            id: TileId { index: linear as u64, x: 0, y: index as u32, z: 0, sample: plane },
            size: TileSize { width: self.shape.width, height, depth: 1, nsamples },
            span: FileSpan { offset: self.offsets[linear], length: self.byte_counts[linear] },
        })
    }
}
