//! Tiled geometry (spec §3 "Tiled geometry", §4.5 operations on `TiledImageInfo`).
//!
//! Grounded on the teacher's `format::tiff::pyramid::PyramidLevel`, which already carries a
//! level's tile grid dimensions and offset/byte-count arrays; generalised here with the
//! depth axis, planar fan-out, and the index-math operations the planner and image-reader façade
//! call directly.

use std::marker::PhantomData;

use crate::chunk::{FileSpan, Tile, TileId, TileSize};
use crate::error::TiffError;
use crate::geometry::{ImageShape, PixelType};
use crate::tags::{compression_code, predictor_code};

/// Tile-grid dimensions plus offset/byte-count tables, layered on an [`ImageShape`] (spec §3
/// "Tiled geometry"). Generic over the pixel type the caller intends to decode into, matching the
/// specification's `TiledImageInfo<PixelType>`.
#[derive(Debug, Clone)]
pub struct TiledImageInfo<P: PixelType> {
    pub shape: ImageShape,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_depth: u32,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
    pub compression: u16,
    pub predictor: u16,
    _pixel: PhantomData<P>,
}

impl<P: PixelType> TiledImageInfo<P> {
    /// Build from already-extracted tag values, checking the invariant that the offsets/byte-counts
    /// arrays match the tile grid's expected length (spec §3 invariant).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shape: ImageShape,
        tile_width: u32,
        tile_height: u32,
        tile_depth: Option<u32>,
        offsets: Vec<u64>,
        byte_counts: Vec<u64>,
        compression: Option<u16>,
        predictor: Option<u16>,
    ) -> Result<TiledImageInfo<P>, TiffError> {
        let tile_depth = tile_depth.unwrap_or(1);
        let info = TiledImageInfo {
            shape,
            tile_width,
            tile_height,
            tile_depth,
            offsets,
            byte_counts,
            compression: compression.unwrap_or(compression_code::NONE),
            predictor: predictor.unwrap_or(predictor_code::NONE),
            _pixel: PhantomData,
        };
        let expected = info.num_tiles();
        if info.offsets.len() != expected || info.byte_counts.len() != expected {
            return Err(TiffError::InvalidFormat(format!(
                "tile offsets/byte-counts length mismatch: expected {expected}, found {} offsets and {} byte counts",
                info.offsets.len(),
                info.byte_counts.len()
            )));
        }
        Ok(info)
    }

    #[inline]
    pub fn tiles_across(&self) -> u32 {
        self.shape.width.div_ceil(self.tile_width)
    }

    #[inline]
    pub fn tiles_down(&self) -> u32 {
        self.shape.height.div_ceil(self.tile_height)
    }

    #[inline]
    pub fn tiles_deep(&self) -> u32 {
        self.shape.depth.div_ceil(self.tile_depth)
    }

    /// Tiles in one sample plane (or the whole chunky image).
    #[inline]
    pub fn tiles_per_plane(&self) -> usize {
        self.tiles_across() as usize * self.tiles_down() as usize * self.tiles_deep() as usize
    }

    #[inline]
    fn tiles_per_slice(&self) -> usize {
        self.tiles_across() as usize * self.tiles_down() as usize
    }

    /// Number of planes the offsets/byte-counts arrays are fanned out over: samples-per-pixel when
    /// planar, 1 when chunky.
    #[inline]
    fn num_planes(&self) -> usize {
        if self.shape.is_planar() {
            self.shape.samples_per_pixel as usize
        } else {
            1
        }
    }

    #[inline]
    pub fn num_tiles(&self) -> usize {
        self.tiles_per_plane() * self.num_planes()
    }

    /// Linear index of the tile at grid coordinates `(x, y, z)` in sample plane `plane` (ignored
    /// for chunky images), following `plane * tiles_per_plane + z * tiles_per_slice + y *
    /// tiles_across + x` (spec §4.5).
    fn linear_index(&self, x: u32, y: u32, z: u32, plane: u16) -> Result<usize, TiffError> {
        if x >= self.tiles_across() || y >= self.tiles_down() || z >= self.tiles_deep() {
            return Err(TiffError::OutOfBounds(format!(
                "tile coordinate ({x}, {y}, {z}) outside grid {}x{}x{}",
                self.tiles_across(),
                self.tiles_down(),
                self.tiles_deep()
            )));
        }
        let plane = if self.shape.is_planar() { plane as usize } else { 0 };
        if plane >= self.num_planes() {
            return Err(TiffError::OutOfBounds(format!(
                "sample plane {plane} outside range 0..{}",
                self.num_planes()
            )));
        }
        Ok(plane * self.tiles_per_plane()
            + z as usize * self.tiles_per_slice()
            + y as usize * self.tiles_across() as usize
            + x as usize)
    }

    /// Look up one tile's identity and file span (spec §4.5 `get_tile_info`). Non-boundary tiles
    /// report the nominal tile size; boundary tiles also report the nominal size — the layout
    /// assembler clips to image bounds, per spec.
    pub fn get_tile_info(&self, x: u32, y: u32, z: u32, plane: u16) -> Result<Tile, TiffError> {
        let index = self.linear_index(x, y, z, plane)?;
        let nsamples = if self.shape.is_planar() { 1 } else { self.shape.samples_per_pixel };
        Ok(Tile {
            id: TileId { index: index as u64, x, y, z, sample: plane },
            size: TileSize { width: self.tile_width, height: self.tile_height, depth: self.tile_depth, nsamples },
            span: FileSpan { offset: self.offsets[index], length: self.byte_counts[index] },
        })
    }
}
