//! The TIFF tag code registry (spec §6, supplemented per SPEC_FULL.md §3.4).
//!
//! Grounded on the teacher's `format::tiff::tags::TiffTag` (the WSI-relevant subset) enriched with
//! `image-rs-image-tiff`'s `tags.rs` baseline/extension table, since neither single source alone
//! covers the full registry the specification calls for. Tag codes are plain `const u16`s rather
//! than an enum, because [`crate::tag_spec`]'s descriptor lists need `const`-evaluable codes for
//! their compile-time ascending-order check.

/// Baseline tags.
pub mod tag {
    pub const NEW_SUBFILE_TYPE: u16 = 254;
    pub const SUBFILE_TYPE: u16 = 255;
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    pub const THRESHHOLDING: u16 = 263;
    pub const CELL_WIDTH: u16 = 264;
    pub const CELL_LENGTH: u16 = 265;
    pub const FILL_ORDER: u16 = 266;
    pub const IMAGE_DESCRIPTION: u16 = 270;
    pub const MAKE: u16 = 271;
    pub const MODEL: u16 = 272;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const ORIENTATION: u16 = 274;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const MIN_SAMPLE_VALUE: u16 = 280;
    pub const MAX_SAMPLE_VALUE: u16 = 281;
    pub const X_RESOLUTION: u16 = 282;
    pub const Y_RESOLUTION: u16 = 283;
    pub const PLANAR_CONFIGURATION: u16 = 284;
    pub const FREE_OFFSETS: u16 = 288;
    pub const FREE_BYTE_COUNTS: u16 = 289;
    pub const GRAY_RESPONSE_UNIT: u16 = 290;
    pub const GRAY_RESPONSE_CURVE: u16 = 291;
    pub const RESOLUTION_UNIT: u16 = 296;
    pub const SOFTWARE: u16 = 305;
    pub const DATE_TIME: u16 = 306;
    pub const ARTIST: u16 = 315;
    pub const HOST_COMPUTER: u16 = 316;
    pub const PREDICTOR: u16 = 317;
    pub const COLOR_MAP: u16 = 320;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const SUB_IFDS: u16 = 330;
    pub const EXTRA_SAMPLES: u16 = 338;
    pub const SAMPLE_FORMAT: u16 = 339;
    pub const S_MIN_SAMPLE_VALUE: u16 = 340;
    pub const S_MAX_SAMPLE_VALUE: u16 = 341;
    pub const JPEG_TABLES: u16 = 347;
    pub const COPYRIGHT: u16 = 33_432;

    /// BigTIFF variants of the offset/byte-count tags are the same tag codes as their classic
    /// counterparts; only the *primary TIFF type* differs (`Long8`/`Ifd8` instead of `Long`). The
    /// descriptor system (§4.4) expresses this by declaring two separate [`crate::tag_spec`]
    /// entries — callers choose the BigTIFF variant of a descriptor when `TiffFormat::BigTiff`.
    pub const IMAGE_DEPTH: u16 = 32997;
    pub const TILE_DEPTH: u16 = 32998;

    // GeoTIFF / private / DNG tags carried through from the original source's tag_spec.hpp.
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const MODEL_TRANSFORMATION: u16 = 34264;
    pub const GEO_KEY_DIRECTORY: u16 = 34735;
    pub const GEO_DOUBLE_PARAMS: u16 = 34736;
    pub const GEO_ASCII_PARAMS: u16 = 34737;
    pub const ICC_PROFILE: u16 = 34675;
    pub const GDAL_NODATA: u16 = 42113;
    pub const DNG_VERSION: u16 = 50706;
    pub const CFA_REPEAT_PATTERN_DIM: u16 = 33421;
    pub const CFA_PATTERN: u16 = 33422;
}

/// Compression scheme codes (spec §6).
pub mod compression_code {
    pub const NONE: u16 = 1;
    pub const LZW: u16 = 5;
    pub const JPEG: u16 = 7;
    pub const DEFLATE: u16 = 8;
    pub const PACKBITS: u16 = 32773;
    pub const DEFLATE_ALT: u16 = 32946;
    pub const ZSTD: u16 = 50000;
    /// Alternative ZSTD code: read-compatible with [`ZSTD`], but writers should prefer it.
    pub const ZSTD_ALT: u16 = 34926;
}

/// Predictor codes (spec §6).
pub mod predictor_code {
    pub const NONE: u16 = 1;
    pub const HORIZONTAL: u16 = 2;
    pub const FLOATING_POINT: u16 = 3;
}

/// A human-readable name for a baseline tag, for error messages and logging. Unknown/private tags
/// return `None` rather than guessing.
pub fn name_for(code: u16) -> Option<&'static str> {
    use tag::*;
    Some(match code {
        c if c == NEW_SUBFILE_TYPE => "NewSubfileType",
        c if c == SUBFILE_TYPE => "SubfileType",
        c if c == IMAGE_WIDTH => "ImageWidth",
        c if c == IMAGE_LENGTH => "ImageLength",
        c if c == BITS_PER_SAMPLE => "BitsPerSample",
        c if c == COMPRESSION => "Compression",
        c if c == PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        c if c == STRIP_OFFSETS => "StripOffsets",
        c if c == SAMPLES_PER_PIXEL => "SamplesPerPixel",
        c if c == ROWS_PER_STRIP => "RowsPerStrip",
        c if c == STRIP_BYTE_COUNTS => "StripByteCounts",
        c if c == PLANAR_CONFIGURATION => "PlanarConfiguration",
        c if c == PREDICTOR => "Predictor",
        c if c == TILE_WIDTH => "TileWidth",
        c if c == TILE_LENGTH => "TileLength",
        c if c == TILE_OFFSETS => "TileOffsets",
        c if c == TILE_BYTE_COUNTS => "TileByteCounts",
        c if c == SUB_IFDS => "SubIFDs",
        c if c == SAMPLE_FORMAT => "SampleFormat",
        c if c == JPEG_TABLES => "JPEGTables",
        c if c == IMAGE_DEPTH => "ImageDepth",
        c if c == TILE_DEPTH => "TileDepth",
        _ => return None,
    })
}
