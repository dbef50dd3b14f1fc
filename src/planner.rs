//! The tile/strip planner (spec §4.6): region → offset-sorted chunk list.
//!
//! Grounded on the teacher's `io::block_cache` range-to-block mapping (which turns a byte range
//! into a sorted sequence of cache blocks to fetch), generalised from one linear axis to the
//! planner's four-axis tile/strip grid intersection and the planar sample fan-out the
//! specification requires.

use crate::chunk::Tile;
use crate::error::TiffError;
use crate::geometry::{ImageRegion, PixelType};
use crate::strips::StrippedImageInfo;
use crate::tiled::TiledImageInfo;

/// Either geometry flavour, so the planner and image-reader façade can operate over one type.
pub enum Geometry<P: PixelType> {
    Tiled(TiledImageInfo<P>),
    Stripped(StrippedImageInfo<P>),
}

impl<P: PixelType> Geometry<P> {
    pub fn shape(&self) -> &crate::geometry::ImageShape {
        match self {
            Geometry::Tiled(info) => &info.shape,
            Geometry::Stripped(info) => &info.shape,
        }
    }

    pub fn compression(&self) -> u16 {
        match self {
            Geometry::Tiled(info) => info.compression,
            Geometry::Stripped(info) => info.compression,
        }
    }

    pub fn predictor(&self) -> u16 {
        match self {
            Geometry::Tiled(info) => info.predictor,
            Geometry::Stripped(info) => info.predictor,
        }
    }

    pub fn is_planar(&self) -> bool {
        self.shape().is_planar()
    }

    /// The pixel-space origin `(x, y, z)` of `tile` within the full image, derived from its
    /// logical grid coordinates. Used by the image-reader façade to intersect a tile's nominal
    /// bounds against the requested region.
    pub fn tile_world_origin(&self, tile: &crate::chunk::Tile) -> (u32, u32, u32) {
        match self {
            Geometry::Tiled(info) => {
                (tile.id.x * info.tile_width, tile.id.y * info.tile_height, tile.id.z * info.tile_depth)
            }
            Geometry::Stripped(info) => (0, tile.id.y * info.rows_per_strip, 0),
        }
    }
}

/// Sample planes a region touches: every plane in `[start_channel, start_channel + num_channels)`
/// when planar, or the single chunky "plane" 0 otherwise.
fn planes_for_region(region: &ImageRegion, is_planar: bool) -> Vec<u16> {
    if is_planar {
        (region.start_channel..region.end_channel()).collect()
    } else {
        vec![0]
    }
}

/// Build the offset-sorted chunk list for `region` against `geometry` (spec §4.6). `out` is
/// cleared before planning begins, per the specification's "cleared up-front" contract.
pub fn plan_region<P: PixelType>(
    geometry: &Geometry<P>,
    region: &ImageRegion,
    out: &mut Vec<Tile>,
) -> Result<(), TiffError> {
    out.clear();
    region.validate(geometry.shape())?;

    match geometry {
        Geometry::Tiled(info) => plan_tiled(info, region, out),
        Geometry::Stripped(info) => plan_stripped(info, region, out),
    }

    out.sort_by_key(|t| t.span.offset);
    Ok(())
}

fn plan_tiled<P: PixelType>(info: &TiledImageInfo<P>, region: &ImageRegion, out: &mut Vec<Tile>) {
    let x0 = region.start_x / info.tile_width;
    let x1 = (region.end_x() - 1) / info.tile_width;
    let y0 = region.start_y / info.tile_height;
    let y1 = (region.end_y() - 1) / info.tile_height;
    let z0 = region.start_z / info.tile_depth;
    let z1 = (region.end_z() - 1) / info.tile_depth;

    for plane in planes_for_region(region, info.shape.is_planar()) {
        for z in z0..=z1 {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    // Bounds are already guaranteed by `region.validate` above, so this lookup
                    // cannot fail with OutOfBounds.
                    let tile = info.get_tile_info(x, y, z, plane).expect("region validated against shape");
                    if tile.byte_count() != 0 {
                        out.push(tile);
                    }
                }
            }
        }
    }
}

fn plan_stripped<P: PixelType>(info: &StrippedImageInfo<P>, region: &ImageRegion, out: &mut Vec<Tile>) {
    let s0 = region.start_y / info.rows_per_strip;
    let s1 = (region.end_y() - 1) / info.rows_per_strip;

    for plane in planes_for_region(region, info.shape.is_planar()) {
        for s in s0..=s1 {
            let tile = info.get_strip_info(s as usize, plane).expect("region validated against shape");
            if tile.byte_count() != 0 {
                out.push(tile);
            }
        }
    }
}
