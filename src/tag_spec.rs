//! The tag descriptor system (spec §4.4): how a raw [`RawTagEntry`] is turned into a typed domain
//! value.
//!
//! The specification's compile-time variant binds `(tag code, primary TIFF type, domain value
//! type)` triples at compile time. Per the design note in spec §9 ("languages with strong generics
//! can keep the compile-time variant; others should pick the table form"), Rust's trait system lets
//! us keep both: [`TagValue`] is a compile-time-checked trait binding a domain type to its primary
//! [`TiffType`] and accepted alternates, and [`crate::metadata::declare_tag_set`] is the
//! data-driven table that lists `(code, type)` pairs per tag set. This generalises the teacher's
//! `format::tiff::values::ValueReader`, which reads one fixed field at a time, into the
//! type-promotion and container-reading rules spec §4.4 requires.

use crate::byteorder::{ByteOrder, Rational, SRational};
use crate::error::TiffError;
use crate::header::TiffFormat;
use crate::ifd::RawTagEntry;
use crate::reader::Reader;
use crate::types::TiffType;

/// A string tag value (Ascii or Undefined). Truncated at the first NUL on read; `raw_len` is the
/// total byte count the file declared, including anything past the truncation point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TiffString {
    pub text: String,
    pub raw_len: usize,
}

/// Fetch the bytes backing a tag's value, resolving external storage via a positioned read.
fn value_bytes<'a>(
    reader: &'a dyn Reader,
    entry: &'a RawTagEntry,
    format: TiffFormat,
    order: ByteOrder,
    byte_len: usize,
    scratch: &'a mut Vec<u8>,
) -> Result<&'a [u8], TiffError> {
    // Inline iff count * sizeof(primary-type) <= inline-limit (spec §3/§4.4); `byte_len` here is
    // exactly that product.
    if byte_len <= format.inline_limit() {
        Ok(&entry.value_bytes[..byte_len])
    } else {
        let offset = entry.external_offset(format, order);
        let view = reader.read(offset, byte_len)?;
        *scratch = view.data().to_vec();
        Ok(scratch.as_slice())
    }
}

/// A domain value type a tag descriptor can bind to.
///
/// Implementors declare their on-wire primary type and accepted promotion types; [`parse_entry`]
/// performs the inline/external decision, byte-swap, and promotion cast described in spec §4.4.
pub trait TagValue: Sized {
    /// The TIFF type this domain type is declared against.
    const PRIMARY_TYPE: TiffType;
    /// Additional file types accepted at read time and cast to the domain type. Rational
    /// implementations must leave this empty (spec: "Rational types do not declare alternate
    /// types").
    const ALTERNATES: &'static [TiffType] = &[];

    fn parse_entry(
        reader: &dyn Reader,
        entry: &RawTagEntry,
        format: TiffFormat,
        order: ByteOrder,
    ) -> Result<Self, TiffError>;
}

fn resolve_type(entry: &RawTagEntry, primary: TiffType, alternates: &[TiffType]) -> Result<TiffType, TiffError> {
    let file_type = TiffType::from_u16(entry.field_type).ok_or_else(|| TiffError::InvalidTagType {
        tag: entry.tag,
        found: entry.field_type,
        expected: primary.to_u16(),
    })?;
    if file_type == primary || alternates.contains(&file_type) {
        Ok(file_type)
    } else {
        Err(TiffError::InvalidTagType { tag: entry.tag, found: file_type.to_u16(), expected: primary.to_u16() })
    }
}

/// Read one reference-typed (unsigned) integer word of `ty`'s width from `bytes`, byte-swapping as
/// needed, and return it widened to `u64`.
fn read_uint_word(bytes: &[u8], ty: TiffType, order: ByteOrder) -> u64 {
    match ty {
        TiffType::Byte | TiffType::Undefined => bytes[0] as u64,
        TiffType::Short => order.read_u16(bytes) as u64,
        TiffType::Long | TiffType::Ifd => order.read_u32(bytes) as u64,
        TiffType::Long8 | TiffType::Ifd8 => order.read_u64(bytes),
        _ => 0,
    }
}

/// Signed counterpart of [`read_uint_word`].
fn read_sint_word(bytes: &[u8], ty: TiffType, order: ByteOrder) -> i64 {
    match ty {
        TiffType::SByte => bytes[0] as i8 as i64,
        TiffType::SShort => order.read_u16(bytes) as i16 as i64,
        TiffType::SLong => order.read_u32(bytes) as i32 as i64,
        TiffType::SLong8 => order.read_u64(bytes) as i64,
        _ => 0,
    }
}

macro_rules! impl_unsigned_scalar {
    ($($t:ty, $primary:expr, [$($alt:expr),*]);+ $(;)?) => {
        $(
            impl TagValue for $t {
                const PRIMARY_TYPE: TiffType = $primary;
                const ALTERNATES: &'static [TiffType] = &[$($alt),*];

                fn parse_entry(
                    reader: &dyn Reader,
                    entry: &RawTagEntry,
                    format: TiffFormat,
                    order: ByteOrder,
                ) -> Result<Self, TiffError> {
                    if entry.count != 1 {
                        return Err(TiffError::InvalidTag {
                            tag: entry.tag,
                            message: format!("scalar tag requires count == 1, found {}", entry.count),
                        });
                    }
                    let ty = resolve_type(entry, Self::PRIMARY_TYPE, Self::ALTERNATES)?;
                    let size = ty.size();
                    let mut scratch = Vec::new();
                    let bytes = value_bytes(reader, entry, format, order, size, &mut scratch)?;
                    Ok(read_uint_word(bytes, ty, order) as $t)
                }
            }
        )+
    };
}

macro_rules! impl_signed_scalar {
    ($($t:ty, $primary:expr, [$($alt:expr),*]);+ $(;)?) => {
        $(
            impl TagValue for $t {
                const PRIMARY_TYPE: TiffType = $primary;
                const ALTERNATES: &'static [TiffType] = &[$($alt),*];

                fn parse_entry(
                    reader: &dyn Reader,
                    entry: &RawTagEntry,
                    format: TiffFormat,
                    order: ByteOrder,
                ) -> Result<Self, TiffError> {
                    if entry.count != 1 {
                        return Err(TiffError::InvalidTag {
                            tag: entry.tag,
                            message: format!("scalar tag requires count == 1, found {}", entry.count),
                        });
                    }
                    let ty = resolve_type(entry, Self::PRIMARY_TYPE, Self::ALTERNATES)?;
                    let size = ty.size();
                    let mut scratch = Vec::new();
                    let bytes = value_bytes(reader, entry, format, order, size, &mut scratch)?;
                    Ok(read_sint_word(bytes, ty, order) as $t)
                }
            }
        )+
    };
}

// Unsigned integer domain scalars. `Long`-typed entries may promote into a `Short` domain field
// (numeric narrowing is the caller's responsibility, as spec §4.4 "Tie-breaks" notes); `Short`
// fields may promote into `Long`/`Long8` domain fields.
impl_unsigned_scalar! {
    u8,  TiffType::Byte,  [];
    u16, TiffType::Short, [TiffType::Byte, TiffType::Long];
    u32, TiffType::Long,  [TiffType::Short, TiffType::Byte, TiffType::Long8];
    u64, TiffType::Long8, [TiffType::Long, TiffType::Short, TiffType::Byte];
}

impl_signed_scalar! {
    i8,  TiffType::SByte,  [];
    i16, TiffType::SShort, [TiffType::SByte];
    i32, TiffType::SLong,  [TiffType::SShort, TiffType::SByte, TiffType::SLong8];
    i64, TiffType::SLong8, [TiffType::SLong, TiffType::SShort, TiffType::SByte];
}

impl TagValue for f32 {
    const PRIMARY_TYPE: TiffType = TiffType::Float;

    fn parse_entry(
        reader: &dyn Reader,
        entry: &RawTagEntry,
        format: TiffFormat,
        order: ByteOrder,
    ) -> Result<Self, TiffError> {
        if entry.count != 1 {
            return Err(TiffError::InvalidTag { tag: entry.tag, message: "scalar tag requires count == 1".into() });
        }
        let _ = resolve_type(entry, Self::PRIMARY_TYPE, Self::ALTERNATES)?;
        let mut scratch = Vec::new();
        let bytes = value_bytes(reader, entry, format, order, 4, &mut scratch)?;
        let raw = order.read_u32(bytes);
        Ok(f32::from_bits(raw))
    }
}

impl TagValue for f64 {
    const PRIMARY_TYPE: TiffType = TiffType::Double;

    fn parse_entry(
        reader: &dyn Reader,
        entry: &RawTagEntry,
        format: TiffFormat,
        order: ByteOrder,
    ) -> Result<Self, TiffError> {
        if entry.count != 1 {
            return Err(TiffError::InvalidTag { tag: entry.tag, message: "scalar tag requires count == 1".into() });
        }
        let _ = resolve_type(entry, Self::PRIMARY_TYPE, Self::ALTERNATES)?;
        let mut scratch = Vec::new();
        let bytes = value_bytes(reader, entry, format, order, 8, &mut scratch)?;
        let raw = order.read_u64(bytes);
        Ok(f64::from_bits(raw))
    }
}

impl TagValue for Rational {
    const PRIMARY_TYPE: TiffType = TiffType::Rational;
    // Rational domains reject every alternate (spec §4.4, §8 testable property).

    fn parse_entry(
        reader: &dyn Reader,
        entry: &RawTagEntry,
        format: TiffFormat,
        order: ByteOrder,
    ) -> Result<Self, TiffError> {
        if entry.count != 1 {
            return Err(TiffError::InvalidTag {
                tag: entry.tag,
                message: format!("rational tag requires count == 1, found {}", entry.count),
            });
        }
        let _ = resolve_type(entry, Self::PRIMARY_TYPE, Self::ALTERNATES)?;
        let mut scratch = Vec::new();
        let bytes = value_bytes(reader, entry, format, order, 8, &mut scratch)?;
        Ok(Rational { numerator: order.read_u32(&bytes[0..4]), denominator: order.read_u32(&bytes[4..8]) })
    }
}

impl TagValue for SRational {
    const PRIMARY_TYPE: TiffType = TiffType::SRational;

    fn parse_entry(
        reader: &dyn Reader,
        entry: &RawTagEntry,
        format: TiffFormat,
        order: ByteOrder,
    ) -> Result<Self, TiffError> {
        if entry.count != 1 {
            return Err(TiffError::InvalidTag {
                tag: entry.tag,
                message: format!("rational tag requires count == 1, found {}", entry.count),
            });
        }
        let _ = resolve_type(entry, Self::PRIMARY_TYPE, Self::ALTERNATES)?;
        let mut scratch = Vec::new();
        let bytes = value_bytes(reader, entry, format, order, 8, &mut scratch)?;
        Ok(SRational {
            numerator: order.read_u32(&bytes[0..4]) as i32,
            denominator: order.read_u32(&bytes[4..8]) as i32,
        })
    }
}

impl TagValue for TiffString {
    // Strings bind to Ascii or Undefined only; neither is expressed via the generic promotion
    // list because the check is "is this type one of the two", not "cast this numeric type".
    const PRIMARY_TYPE: TiffType = TiffType::Ascii;

    fn parse_entry(
        reader: &dyn Reader,
        entry: &RawTagEntry,
        format: TiffFormat,
        order: ByteOrder,
    ) -> Result<Self, TiffError> {
        let file_type = TiffType::from_u16(entry.field_type).ok_or_else(|| TiffError::InvalidTagType {
            tag: entry.tag,
            found: entry.field_type,
            expected: TiffType::Ascii.to_u16(),
        })?;
        if !matches!(file_type, TiffType::Ascii | TiffType::Undefined) {
            return Err(TiffError::InvalidTagType {
                tag: entry.tag,
                found: file_type.to_u16(),
                expected: TiffType::Ascii.to_u16(),
            });
        }
        if entry.count == 0 {
            return Ok(TiffString::default());
        }
        let byte_len = entry.count as usize;
        let mut scratch = Vec::new();
        let bytes = value_bytes(reader, entry, format, order, byte_len, &mut scratch)?;
        let nul_at = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = String::from_utf8_lossy(&bytes[..nul_at]).into_owned();
        Ok(TiffString { text, raw_len: bytes.len() })
    }
}

/// Narrowing/widening cast from the 64-bit-wide word the container parser reads into a concrete
/// scalar domain type. Kept as its own trait (rather than a blanket numeric cast) so the container
/// parser never has to reach for `unsafe`.
pub trait FromWidened {
    fn from_widened(value: i128) -> Self;
}

macro_rules! impl_from_widened {
    ($($t:ty),+) => {
        $(impl FromWidened for $t {
            fn from_widened(value: i128) -> Self {
                value as $t
            }
        })+
    };
}

impl_from_widened!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Container of scalar values, e.g. `BitsPerSample`'s per-sample array.
impl<T> TagValue for Vec<T>
where
    T: TagValue + FromWidened + Copy,
{
    const PRIMARY_TYPE: TiffType = T::PRIMARY_TYPE;
    const ALTERNATES: &'static [TiffType] = T::ALTERNATES;

    fn parse_entry(
        reader: &dyn Reader,
        entry: &RawTagEntry,
        format: TiffFormat,
        order: ByteOrder,
    ) -> Result<Self, TiffError> {
        let ty = resolve_type(entry, Self::PRIMARY_TYPE, Self::ALTERNATES)?;
        let count = entry.count as usize;
        if count == 0 {
            return Ok(Vec::new());
        }
        let byte_len = count * ty.size();
        let mut scratch = Vec::new();
        let bytes = value_bytes(reader, entry, format, order, byte_len, &mut scratch)?;

        let mut out = Vec::with_capacity(count);
        for chunk in bytes.chunks_exact(ty.size()) {
            let widened = if matches!(
                ty,
                TiffType::SByte | TiffType::SShort | TiffType::SLong | TiffType::SLong8
            ) {
                read_sint_word(chunk, ty, order) as i128
            } else {
                read_uint_word(chunk, ty, order) as i128
            };
            out.push(cast_scalar::<T>(widened));
        }
        Ok(out)
    }
}

/// Cast a widened integer into a scalar [`TagValue`] domain type, sharing the same numeric range
/// the scalar parsers themselves produce.
fn cast_scalar<T: FromWidened>(widened: i128) -> T {
    T::from_widened(widened)
}

/// Container of rational values (spec §4.4: "one external read of `2 × count × component_size`").
#[derive(Debug, Clone, Default)]
pub struct RationalVec(pub Vec<Rational>);

impl TagValue for RationalVec {
    const PRIMARY_TYPE: TiffType = TiffType::Rational;

    fn parse_entry(
        reader: &dyn Reader,
        entry: &RawTagEntry,
        format: TiffFormat,
        order: ByteOrder,
    ) -> Result<Self, TiffError> {
        let _ = resolve_type(entry, Self::PRIMARY_TYPE, Self::ALTERNATES)?;
        let count = entry.count as usize;
        let byte_len = count * 8;
        let mut scratch = Vec::new();
        let bytes = value_bytes(reader, entry, format, order, byte_len, &mut scratch)?;
        let mut out = Vec::with_capacity(count);
        for pair in bytes.chunks_exact(8) {
            out.push(Rational { numerator: order.read_u32(&pair[0..4]), denominator: order.read_u32(&pair[4..8]) });
        }
        Ok(RationalVec(out))
    }
}
