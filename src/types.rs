//! The TIFF data-type code table.
//!
//! Grounded on the teacher's `format::tiff::tags::FieldType`, generalised from the WSI-relevant
//! subset (`Byte/Ascii/Short/Long/Long8/Undefined`) to the full TIFF 6.0 + BigTIFF type set the
//! specification requires, since the extraction engine needs every promotion target.

/// On-wire TIFF field type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
    Ifd = 13,
    Long8 = 16,
    SLong8 = 17,
    Ifd8 = 18,
}

impl TiffType {
    /// Fixed on-wire size, in bytes, of a single value of this type.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            TiffType::Byte | TiffType::Ascii | TiffType::SByte | TiffType::Undefined => 1,
            TiffType::Short | TiffType::SShort => 2,
            TiffType::Long | TiffType::SLong | TiffType::Float | TiffType::Ifd => 4,
            TiffType::Rational
            | TiffType::SRational
            | TiffType::Double
            | TiffType::Long8
            | TiffType::SLong8
            | TiffType::Ifd8 => 8,
        }
    }

    /// Parse a raw field-type code from an IFD entry. `None` for unknown codes.
    pub const fn from_u16(code: u16) -> Option<TiffType> {
        Some(match code {
            1 => TiffType::Byte,
            2 => TiffType::Ascii,
            3 => TiffType::Short,
            4 => TiffType::Long,
            5 => TiffType::Rational,
            6 => TiffType::SByte,
            7 => TiffType::Undefined,
            8 => TiffType::SShort,
            9 => TiffType::SLong,
            10 => TiffType::SRational,
            11 => TiffType::Float,
            12 => TiffType::Double,
            13 => TiffType::Ifd,
            16 => TiffType::Long8,
            17 => TiffType::SLong8,
            18 => TiffType::Ifd8,
            _ => return None,
        })
    }

    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Whether this type is one of the two rational kinds, which never accept promotion.
    pub const fn is_rational(self) -> bool {
        matches!(self, TiffType::Rational | TiffType::SRational)
    }
}

/// Free function form of [`TiffType::size`], named to match the specification's operation list.
#[inline]
pub const fn tiff_type_size(t: TiffType) -> usize {
    t.size()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_table_matches_spec() {
        assert_eq!(TiffType::Byte.size(), 1);
        assert_eq!(TiffType::Ascii.size(), 1);
        assert_eq!(TiffType::SByte.size(), 1);
        assert_eq!(TiffType::Undefined.size(), 1);
        assert_eq!(TiffType::Short.size(), 2);
        assert_eq!(TiffType::SShort.size(), 2);
        assert_eq!(TiffType::Long.size(), 4);
        assert_eq!(TiffType::SLong.size(), 4);
        assert_eq!(TiffType::Float.size(), 4);
        assert_eq!(TiffType::Ifd.size(), 4);
        assert_eq!(TiffType::Rational.size(), 8);
        assert_eq!(TiffType::SRational.size(), 8);
        assert_eq!(TiffType::Double.size(), 8);
        assert_eq!(TiffType::Long8.size(), 8);
        assert_eq!(TiffType::SLong8.size(), 8);
        assert_eq!(TiffType::Ifd8.size(), 8);
    }

    #[test]
    fn roundtrip_code() {
        for code in [1u16, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 16, 17, 18] {
            let t = TiffType::from_u16(code).unwrap();
            assert_eq!(t.to_u16(), code);
        }
        assert!(TiffType::from_u16(14).is_none());
    }
}
