//! Image shape and region geometry (spec §4.5).
//!
//! Grounded on the teacher's `format::tiff::pyramid::PyramidLevel`, which carries width/height/
//! samples-per-pixel/bit-depth for one pyramid level; generalised here into the full shape record
//! (depth, planar configuration, sample format) and the half-open region box the specification
//! requires, since the teacher has no tiled-region abstraction of its own.

use crate::error::TiffError;
use crate::tags::tag;
use crate::tag_spec::TagValue;

/// Sample encoding (spec §3 "Image shape").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    UnsignedInt,
    SignedInt,
    IEEEFloat,
    Undefined,
}

impl SampleFormat {
    /// Map the file's `SampleFormat` tag value (TIFF 6.0 §23) to the domain enum. Unknown codes
    /// map to `Undefined` rather than failing, matching the tag's own "3/4 = void/reserved" intent.
    pub fn from_tag_value(code: u16) -> SampleFormat {
        match code {
            1 => SampleFormat::UnsignedInt,
            2 => SampleFormat::SignedInt,
            3 => SampleFormat::IEEEFloat,
            _ => SampleFormat::Undefined,
        }
    }
}

/// Sample interleaving (spec §3 "Image shape").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanarConfig {
    /// Samples of one pixel are contiguous (the common case).
    Chunky,
    /// Each sample occupies its own contiguous plane.
    Planar,
}

impl PlanarConfig {
    pub fn from_tag_value(code: u16) -> PlanarConfig {
        if code == 2 {
            PlanarConfig::Planar
        } else {
            PlanarConfig::Chunky
        }
    }
}

/// Width, height, depth, sample layout of one TIFF page (spec §3 "Image shape", §4.5).
#[derive(Debug, Clone)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
    pub sample_format: SampleFormat,
    pub planar_config: PlanarConfig,
}

impl ImageShape {
    /// Build a shape from already-extracted tag values (spec §4.5 bullet list): requires
    /// `ImageWidth`/`ImageLength`/`BitsPerSample`, validates `BitsPerSample` is uniform across
    /// samples and matches `SamplesPerPixel` in length, and defaults `ImageDepth = 1`,
    /// `PlanarConfiguration = Chunky`, `SampleFormat = UnsignedInt`.
    pub fn new(
        width: u32,
        height: u32,
        depth: Option<u32>,
        bits_per_sample: &[u16],
        samples_per_pixel: Option<u16>,
        sample_format: Option<u16>,
        planar_config: Option<u16>,
    ) -> Result<ImageShape, TiffError> {
        let samples_per_pixel = samples_per_pixel.unwrap_or(1);
        if bits_per_sample.len() != samples_per_pixel as usize {
            return Err(TiffError::InvalidTag {
                tag: tag::BITS_PER_SAMPLE,
                message: format!(
                    "BitsPerSample has {} entries, expected SamplesPerPixel = {}",
                    bits_per_sample.len(),
                    samples_per_pixel
                ),
            });
        }
        let first = *bits_per_sample.first().ok_or_else(|| TiffError::InvalidTag {
            tag: tag::BITS_PER_SAMPLE,
            message: "BitsPerSample is empty".to_string(),
        })?;
        if bits_per_sample.iter().any(|&b| b != first) {
            return Err(TiffError::UnsupportedFeature(
                "heterogeneous BitsPerSample across samples is not supported".to_string(),
            ));
        }

        Ok(ImageShape {
            width,
            height,
            depth: depth.unwrap_or(1),
            bits_per_sample: first,
            samples_per_pixel,
            sample_format: sample_format.map(SampleFormat::from_tag_value).unwrap_or(SampleFormat::UnsignedInt),
            planar_config: planar_config.map(PlanarConfig::from_tag_value).unwrap_or(PlanarConfig::Chunky),
        })
    }

    #[inline]
    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    #[inline]
    pub fn is_multi_channel(&self) -> bool {
        self.samples_per_pixel > 1
    }

    #[inline]
    pub fn is_planar(&self) -> bool {
        matches!(self.planar_config, PlanarConfig::Planar)
    }

    /// Total pixel count (width × height × depth), ignoring channels.
    pub fn total_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }

    /// Total scalar element count (pixels × samples per pixel).
    pub fn total_elements(&self) -> u64 {
        self.total_pixels() * self.samples_per_pixel as u64
    }

    /// A region covering the entire shape.
    pub fn full_region(&self) -> ImageRegion {
        ImageRegion {
            start_channel: 0,
            start_z: 0,
            start_y: 0,
            start_x: 0,
            num_channels: self.samples_per_pixel,
            depth: self.depth,
            height: self.height,
            width: self.width,
        }
    }

    /// Whether `region` fits entirely inside this shape (spec §4.5: "half-open ... all four
    /// end-points inside the shape; start_channel < samples_per_pixel").
    pub fn contains_region(&self, region: &ImageRegion) -> bool {
        region.num_channels > 0
            && region.depth > 0
            && region.height > 0
            && region.width > 0
            && region.start_channel < self.samples_per_pixel
            && region.start_channel as u32 + region.num_channels as u32 <= self.samples_per_pixel as u32
            && region.start_z + region.depth <= self.depth
            && region.start_y + region.height <= self.height
            && region.start_x + region.width <= self.width
    }

    /// Check that `(bits_per_sample, sample_format)` matches the caller's chosen pixel type
    /// exactly (spec §4.5 `validate_pixel_type<T>()`).
    pub fn validate_pixel_type<T: PixelType>(&self) -> Result<(), TiffError> {
        if self.bits_per_sample as usize != T::BITS || self.sample_format != T::SAMPLE_FORMAT {
            return Err(TiffError::UnsupportedFeature(format!(
                "pixel type mismatch: image is {}-bit {:?}, requested type is {}-bit {:?}",
                self.bits_per_sample,
                self.sample_format,
                T::BITS,
                T::SAMPLE_FORMAT
            )));
        }
        Ok(())
    }
}

/// A concrete in-memory pixel representation a caller decodes into. Implemented for the scalar
/// types the decoder and layout assembler operate over.
pub trait PixelType: Copy + Default + TagValue + Send + Sync {
    const BITS: usize;
    const SAMPLE_FORMAT: SampleFormat;
}

macro_rules! impl_pixel_type {
    ($($t:ty, $bits:expr, $fmt:expr);+ $(;)?) => {
        $(impl PixelType for $t {
            const BITS: usize = $bits;
            const SAMPLE_FORMAT: SampleFormat = $fmt;
        })+
    };
}

impl_pixel_type! {
    u8,  8,  SampleFormat::UnsignedInt;
    u16, 16, SampleFormat::UnsignedInt;
    u32, 32, SampleFormat::UnsignedInt;
    i8,  8,  SampleFormat::SignedInt;
    i16, 16, SampleFormat::SignedInt;
    i32, 32, SampleFormat::SignedInt;
    f32, 32, SampleFormat::IEEEFloat;
    f64, 64, SampleFormat::IEEEFloat;
}

/// Half-open 4-axis box over an [`ImageShape`] (spec §3 "Image region").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRegion {
    pub start_channel: u16,
    pub start_z: u32,
    pub start_y: u32,
    pub start_x: u32,
    pub num_channels: u16,
    pub depth: u32,
    pub height: u32,
    pub width: u32,
}

impl ImageRegion {
    /// Validate this region against `shape`: non-empty on every axis, all four end-points inside
    /// the shape, `start_channel < samples_per_pixel` (spec §4.5).
    pub fn validate(&self, shape: &ImageShape) -> Result<(), TiffError> {
        if shape.contains_region(self) {
            Ok(())
        } else {
            Err(TiffError::OutOfBounds(format!(
                "region {self:?} does not fit within shape {width}x{height}x{depth}x{channels}",
                width = shape.width,
                height = shape.height,
                depth = shape.depth,
                channels = shape.samples_per_pixel
            )))
        }
    }

    #[inline]
    pub fn end_x(&self) -> u32 {
        self.start_x + self.width
    }

    #[inline]
    pub fn end_y(&self) -> u32 {
        self.start_y + self.height
    }

    #[inline]
    pub fn end_z(&self) -> u32 {
        self.start_z + self.depth
    }

    #[inline]
    pub fn end_channel(&self) -> u16 {
        self.start_channel + self.num_channels
    }
}
