//! # tiletiff
//!
//! Partial, high-throughput reading of tiled and stripped TIFF/BigTIFF pixel data.
//!
//! This crate reads only the region of pixels a caller asks for: it parses just enough of a
//! TIFF or BigTIFF file's metadata to locate the tiles or strips that intersect a requested
//! region, then issues positioned reads, decompresses, reverses the predictor, and assembles the
//! result directly into a caller-supplied output buffer in one of three pixel layouts.
//!
//! ## Architecture
//!
//! - [`reader`] / [`backends`] — the positioned-read contract and two convenience backends.
//! - [`header`] / [`ifd`] — TIFF/BigTIFF header and IFD-chain parsing.
//! - [`tags`] / [`tag_spec`] / [`metadata`] — the tag registry, the typed value-parsing layer, and
//!   the [`declare_tag_set!`] macro that drives whole-tag-set extraction.
//! - [`geometry`] / [`tiled`] / [`strips`] — image shape, region validation, and tile/strip grid
//!   index math.
//! - [`planner`] — region → offset-sorted chunk list.
//! - [`batch`] — chunk-list coalescing for latency-sensitive backends.
//! - [`strategy`] — sequential, batched, and parallel chunk delivery.
//! - [`compression`] / [`predictor`] — decompression dispatch and predictor reversal.
//! - [`decoder`] — per-instance decode orchestration.
//! - [`layout`] — the DHWC/DCHW/CDHW copy kernels.
//! - [`image_reader`] — the façade wiring all of the above into `read_region`.

pub mod backends;
pub mod batch;
pub mod byteorder;
pub mod chunk;
pub mod compression;
pub mod decoder;
pub mod error;
pub mod geometry;
pub mod header;
pub mod ifd;
pub mod image_reader;
pub mod layout;
pub mod metadata;
pub mod planner;
pub mod predictor;
pub mod reader;
pub mod strategy;
pub mod strips;
pub mod tag_spec;
pub mod tags;
pub mod tiled;
pub mod types;

pub use batch::{BatchParams, ChunkBatch};
pub use chunk::{FileSpan, Tile, TileId, TileSize};
pub use compression::Compression;
pub use decoder::Decoder;
pub use error::{Result, TiffError};
pub use geometry::{ImageRegion, ImageShape, PixelType, PlanarConfig, SampleFormat};
pub use header::{get_first_ifd_offset, TiffFormat, TiffHeader};
pub use image_reader::ImageReader;
pub use layout::Layout;
pub use planner::{plan_region, Geometry};
pub use predictor::Predictor;
pub use reader::{ByteView, Reader};
pub use strategy::{Batched, ChunkProcessor, Parallel, ReadStrategy, Sequential};
pub use strips::StrippedImageInfo;
pub use tiled::TiledImageInfo;
