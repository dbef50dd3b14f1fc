//! The image reader façade (spec §4.11): wires the planner, a read strategy, the decoder, and the
//! layout assembler into one `read_region` entry point.
//!
//! Grounded on the teacher's `tile::service::TileService`, which is the analogous "one call reads
//! a region of a slide" façade, restructured around the specification's synchronous chunk pipeline
//! instead of an async S3-backed cache lookup.

use std::sync::Mutex;

use crate::byteorder::ByteOrder;
use crate::chunk::{Tile, TileSize};
use crate::compression::Compression;
use crate::decoder::Decoder;
use crate::error::TiffError;
use crate::geometry::{ImageRegion, PixelType};
use crate::layout::{self, Coord, Layout};
use crate::planner::{self, Geometry};
use crate::predictor::Predictor;
use crate::reader::Reader;
use crate::strategy::{ChunkData, ChunkProcessor, ReadStrategy};

/// A raw pointer into a caller-owned output buffer. Tiles write disjoint regions of it
/// concurrently under the parallel strategy; the non-overlap guarantee (spec §4.10 "Ordering
/// guarantee", §5 "Output buffer: written concurrently under non-overlap invariant; no lock") is
/// what makes sharing it across worker threads sound.
struct OutputSlice {
    ptr: *mut u8,
    len: usize,
}

unsafe impl Send for OutputSlice {}
unsafe impl Sync for OutputSlice {}

impl OutputSlice {
    /// # Safety
    /// Callers across threads must only write to disjoint byte ranges of the returned slice.
    #[allow(clippy::mut_from_ref)]
    unsafe fn as_mut_slice(&self) -> &mut [u8] {
        std::slice::from_raw_parts_mut(self.ptr, self.len)
    }
}

/// Reusable state for repeated `read_region` calls against the same reader (spec §4.11 "State").
pub struct ImageReader<P: PixelType, S: ReadStrategy> {
    strategy: S,
    chunks: Vec<Tile>,
    decoder: Mutex<Decoder<P>>,
}

impl<P: PixelType, S: ReadStrategy> ImageReader<P, S> {
    pub fn new(strategy: S) -> Self {
        ImageReader { strategy, chunks: Vec::new(), decoder: Mutex::new(Decoder::new()) }
    }

    /// Read `region` out of `geometry` via `reader`, assembling it into `output` laid out as
    /// `dst_layout` (spec §4.11). `output` must be exactly
    /// `region.width * region.height * region.depth * region.num_channels * size_of::<P>()` bytes.
    pub fn read_region(
        &mut self,
        reader: &dyn Reader,
        geometry: &Geometry<P>,
        output: &mut [u8],
        region: &ImageRegion,
        dst_layout: Layout,
        order: ByteOrder,
    ) -> Result<(), TiffError> {
        planner::plan_region(geometry, region, &mut self.chunks)?;

        let compression = Compression::from_code(geometry.compression())?;
        let predictor = Predictor::from_code(geometry.predictor());
        let dst_size =
            TileSize { width: region.width, height: region.height, depth: region.depth, nsamples: region.num_channels };

        let processor = RegionProcessor {
            decoder: &self.decoder,
            geometry,
            output: OutputSlice { ptr: output.as_mut_ptr(), len: output.len() },
            dst_size,
            region: *region,
            dst_layout,
            compression,
            predictor,
            order,
        };

        self.strategy.read_chunks(reader, &self.chunks, &processor)
    }
}

struct RegionProcessor<'a, P: PixelType> {
    decoder: &'a Mutex<Decoder<P>>,
    geometry: &'a Geometry<P>,
    output: OutputSlice,
    dst_size: TileSize,
    region: ImageRegion,
    dst_layout: Layout,
    compression: Compression,
    predictor: Predictor,
    order: ByteOrder,
}

impl<P: PixelType> ChunkProcessor for RegionProcessor<'_, P> {
    fn process(&self, delivery: ChunkData<'_>) -> Result<(), TiffError> {
        for chunk in delivery.chunks {
            let Some((src_start, dst_start, extent)) = intersect_tile_with_region(self.geometry, chunk, &self.region)
            else {
                continue;
            };

            let compressed = delivery.bytes_for(chunk);

            // Serialises decoder access: the decoder's scratch buffer is single-writer (spec §5
            // "Decoder: owned by the processor; the processor serialises access via a mutex").
            // The decoder's row stride is `width * samples_per_pixel` regardless of z, and a
            // predictor's accumulation resets every row — so a depth > 1 tile's stacked z-slices
            // decode correctly by folding depth into the row count here.
            let decoded: Vec<u8> = {
                let mut decoder = self.decoder.lock().expect("decoder mutex poisoned by a panicking worker");
                decoder
                    .decode_copy(
                        compressed,
                        chunk.size.width,
                        chunk.size.height * chunk.size.depth,
                        chunk.size.nsamples,
                        self.compression,
                        self.predictor,
                        self.order,
                    )?
                    .to_vec()
            };

            let planar =
                if self.geometry.is_planar() { crate::geometry::PlanarConfig::Planar } else { crate::geometry::PlanarConfig::Chunky };

            // Safety: distinct tiles partition the region into non-overlapping output ranges
            // (spec §4.10 "Ordering guarantee"), so concurrent writers never alias.
            let output = unsafe { self.output.as_mut_slice() };
            layout::copy_tile_to_buffer(
                &decoded,
                chunk.size,
                src_start,
                output,
                self.dst_size,
                dst_start,
                extent,
                planar,
                self.dst_layout,
                std::mem::size_of::<P>(),
            );
        }
        Ok(())
    }
}

/// Intersect `tile`'s nominal bounds (clipped to the image shape) against `region`, returning the
/// source-local start, destination-local start, and shared extent, or `None` if they don't
/// overlap on some axis (e.g. a planar tile whose sample plane falls outside the region's channel
/// range).
fn intersect_tile_with_region<P: PixelType>(
    geometry: &Geometry<P>,
    tile: &Tile,
    region: &ImageRegion,
) -> Option<(Coord, Coord, Coord)> {
    let shape = geometry.shape();
    let (tx0, ty0, tz0) = geometry.tile_world_origin(tile);

    let tx1 = (tx0 + tile.size.width).min(shape.width);
    let ty1 = (ty0 + tile.size.height).min(shape.height);
    let tz1 = (tz0 + tile.size.depth).min(shape.depth);

    let ix0 = tx0.max(region.start_x);
    let ix1 = tx1.min(region.end_x());
    let iy0 = ty0.max(region.start_y);
    let iy1 = ty1.min(region.end_y());
    let iz0 = tz0.max(region.start_z);
    let iz1 = tz1.min(region.end_z());
    if ix0 >= ix1 || iy0 >= iy1 || iz0 >= iz1 {
        return None;
    }

    let (tc0, tc1) = if geometry.is_planar() {
        (tile.id.sample as u32, tile.id.sample as u32 + 1)
    } else {
        (0u32, shape.samples_per_pixel as u32)
    };
    let ic0 = tc0.max(region.start_channel as u32);
    let ic1 = tc1.min(region.end_channel() as u32);
    if ic0 >= ic1 {
        return None;
    }

    let src_start = Coord { c: ic0 - tc0, z: iz0 - tz0, y: iy0 - ty0, x: ix0 - tx0 };
    let dst_start = Coord {
        c: ic0 - region.start_channel as u32,
        z: iz0 - region.start_z,
        y: iy0 - region.start_y,
        x: ix0 - region.start_x,
    };
    let extent = Coord { c: ic1 - ic0, z: iz1 - iz0, y: iy1 - iy0, x: ix1 - ix0 };

    Some((src_start, dst_start, extent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemorySource;
    use crate::geometry::{ImageShape, PlanarConfig, SampleFormat};
    use crate::strategy::Sequential;
    use crate::tiled::TiledImageInfo;

    fn build_file(tile_bytes: &[&[u8]], tile_offsets_base: u64) -> (Vec<u8>, Vec<u64>) {
        let mut data = vec![0u8; tile_offsets_base as usize];
        let mut offsets = Vec::new();
        for tb in tile_bytes {
            offsets.push(data.len() as u64);
            data.extend_from_slice(tb);
        }
        (data, offsets)
    }

    #[test]
    fn read_region_assembles_single_tile_chunky_image() {
        // One 4x4 image, one 4x4 tile, 1 sample per pixel, no compression/predictor.
        let pixels: Vec<u8> = (0u8..16).collect();
        let (data, offsets) = build_file(&[&pixels], 0);
        let reader = MemorySource::new(data);

        let shape = ImageShape {
            width: 4,
            height: 4,
            depth: 1,
            bits_per_sample: 8,
            samples_per_pixel: 1,
            sample_format: SampleFormat::UnsignedInt,
            planar_config: PlanarConfig::Chunky,
        };
        let info: TiledImageInfo<u8> =
            TiledImageInfo::new(shape.clone(), 4, 4, None, offsets, vec![16], None, None).unwrap();
        let geometry = Geometry::Tiled(info);

        let region = shape.full_region();
        let mut output = vec![0u8; 16];
        let mut image_reader: ImageReader<u8, Sequential> = ImageReader::new(Sequential);
        image_reader
            .read_region(&reader, &geometry, &mut output, &region, Layout::DHWC, ByteOrder::Little)
            .unwrap();
        assert_eq!(output, pixels);
    }

    #[test]
    fn read_region_clips_partial_region_from_larger_tile() {
        let pixels: Vec<u8> = (0u8..16).collect(); // 4x4 tile
        let (data, offsets) = build_file(&[&pixels], 0);
        let reader = MemorySource::new(data);

        let shape = ImageShape {
            width: 4,
            height: 4,
            depth: 1,
            bits_per_sample: 8,
            samples_per_pixel: 1,
            sample_format: SampleFormat::UnsignedInt,
            planar_config: PlanarConfig::Chunky,
        };
        let info: TiledImageInfo<u8> =
            TiledImageInfo::new(shape, 4, 4, None, offsets, vec![16], None, None).unwrap();
        let geometry = Geometry::Tiled(info);

        // Ask for the bottom-right 2x2 corner: rows {2,3}, cols {2,3} -> values 10,11,14,15.
        let region = ImageRegion { start_channel: 0, start_z: 0, start_y: 2, start_x: 2, num_channels: 1, depth: 1, height: 2, width: 2 };
        let mut output = vec![0u8; 4];
        let mut image_reader: ImageReader<u8, Sequential> = ImageReader::new(Sequential);
        image_reader
            .read_region(&reader, &geometry, &mut output, &region, Layout::DHWC, ByteOrder::Little)
            .unwrap();
        assert_eq!(output, vec![10, 11, 14, 15]);
    }

    #[test]
    fn read_region_fans_in_planar_tiles() {
        // 2x2 image, 2 samples per pixel, planar: two separate 2x2 tiles.
        let plane0: Vec<u8> = vec![1, 2, 3, 4];
        let plane1: Vec<u8> = vec![10, 20, 30, 40];
        let (data, offsets) = build_file(&[&plane0, &plane1], 0);
        let reader = MemorySource::new(data);

        let shape = ImageShape {
            width: 2,
            height: 2,
            depth: 1,
            bits_per_sample: 8,
            samples_per_pixel: 2,
            sample_format: SampleFormat::UnsignedInt,
            planar_config: PlanarConfig::Planar,
        };
        let info: TiledImageInfo<u8> =
            TiledImageInfo::new(shape.clone(), 2, 2, None, offsets, vec![4, 4], None, None).unwrap();
        let geometry = Geometry::Tiled(info);

        let region = shape.full_region();
        let mut output = vec![0u8; 8];
        let mut image_reader: ImageReader<u8, Sequential> = ImageReader::new(Sequential);
        image_reader
            .read_region(&reader, &geometry, &mut output, &region, Layout::DHWC, ByteOrder::Little)
            .unwrap();
        // DHWC interleaves channel fastest: (y,x,c).
        assert_eq!(output, vec![1, 10, 2, 20, 3, 30, 4, 40]);
    }
}
