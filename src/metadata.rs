//! The metadata extractor (spec §4.4): the two-pointer merge of a sorted tag specification against
//! a sorted IFD.
//!
//! Grounded on the teacher's `format::tiff::validation` (which walks an IFD looking for specific
//! required tags) generalised into the data-driven "extract against a table" routine spec §9
//! recommends, expressed here as a declarative macro so each caller-declared struct gets its own
//! two-pointer extraction without runtime reflection.

use crate::ifd::{Ifd, RawTagEntry};

/// Advance `cursor` past entries whose tag precedes `code`, then report a hit or a miss — the
/// shared primitive behind every generated `extract` function's per-field lookup (spec §4.4 step
/// 3: "advance the file cursor over tags whose codes precede the current target, then
/// match-or-miss").
pub fn find_tag<'e>(entries: &'e [RawTagEntry], cursor: &mut usize, code: u16) -> Option<&'e RawTagEntry> {
    while *cursor < entries.len() && entries[*cursor].tag < code {
        *cursor += 1;
    }
    if *cursor < entries.len() && entries[*cursor].tag == code {
        let e = &entries[*cursor];
        *cursor += 1;
        Some(e)
    } else {
        None
    }
}

/// Resolve the entry slice to walk for one extraction: sorted as-is in strict mode (a violation
/// silently degrades to "some tags miss", per spec), or sorted once into an owned copy in lenient
/// mode.
pub fn resolve_entries<'e>(ifd: &'e Ifd, lenient: bool, sorted_storage: &'e mut Vec<RawTagEntry>) -> &'e [RawTagEntry] {
    if lenient && !ifd.is_sorted() {
        *sorted_storage = ifd.entries.clone();
        sorted_storage.sort_by_key(|e| e.tag);
        sorted_storage
    } else {
        &ifd.entries
    }
}

/// Declares a typed tag set: a struct with one field per tag descriptor, plus a generated
/// `extract` associated function implementing spec §4.4's two-pointer merge.
///
/// Field syntax is `required $name: $Type = $code` or `optional $name: $Type = $code`; the
/// generated struct stores required fields as `$Type` and optional fields as `Option<$Type>`. Tag
/// codes must be given in strictly ascending order — this is asserted at compile time (spec §4.4:
/// "a tag specification is an ordered list of descriptors ... sorted by tag code ... a compile-time
/// check").
#[macro_export]
macro_rules! declare_tag_set {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $req:ident $field:ident : $ty:ty = $code:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $vis $field: $crate::declare_tag_set!(@field_type $req $ty), )+
        }

        impl $name {
            const __CODES: &'static [u16] = &[ $($code),+ ];

            const __SORTED_CHECK: () = {
                let codes = Self::__CODES;
                let mut i = 1;
                while i < codes.len() {
                    assert!(codes[i - 1] < codes[i], "tag codes in a declare_tag_set! must be strictly ascending");
                    i += 1;
                }
            };

            /// Run the extraction procedure (spec §4.4) against one IFD.
            pub fn extract(
                ifd: &$crate::ifd::Ifd,
                header: &$crate::header::TiffHeader,
                reader: &dyn $crate::reader::Reader,
                lenient: bool,
            ) -> Result<Self, $crate::error::TiffError> {
                #[allow(clippy::let_unit_value)]
                let _ = Self::__SORTED_CHECK;

                let mut sorted_storage = Vec::new();
                let entries = $crate::metadata::resolve_entries(ifd, lenient, &mut sorted_storage);
                let mut cursor = 0usize;

                $(
                    let $field = $crate::declare_tag_set!(
                        @parse $req, $field, $ty, $code, entries, cursor, header, reader
                    );
                )+

                Ok(Self { $( $field: $field? ),+ })
            }

            /// Number of defined tags: required tags always count, optional tags count only when
            /// present (spec §4.4 "Operations exposed to callers").
            pub fn num_defined_tags(&self) -> usize {
                let mut n = 0usize;
                $( n += $crate::declare_tag_set!(@count $req, self.$field); )+
                n
            }
        }
    };

    (@field_type required $ty:ty) => { $ty };
    (@field_type optional $ty:ty) => { Option<$ty> };

    (@count required, $e:expr) => { 1usize };
    (@count optional, $e:expr) => { if $e.is_some() { 1usize } else { 0usize } };

    (@parse required, $field:ident, $ty:ty, $code:expr, $entries:expr, $cursor:expr, $header:expr, $reader:expr) => {
        match $crate::metadata::find_tag($entries, &mut $cursor, $code) {
            Some(entry) => <$ty as $crate::tag_spec::TagValue>::parse_entry($reader, entry, $header.format, $header.byte_order),
            None => Err($crate::error::TiffError::InvalidTag {
                tag: $code,
                message: "required tag missing from IFD".to_string(),
            }),
        }
    };

    (@parse optional, $field:ident, $ty:ty, $code:expr, $entries:expr, $cursor:expr, $header:expr, $reader:expr) => {
        Result::<Option<$ty>, $crate::error::TiffError>::Ok(
            match $crate::metadata::find_tag($entries, &mut $cursor, $code) {
                Some(entry) => <$ty as $crate::tag_spec::TagValue>::parse_entry($reader, entry, $header.format, $header.byte_order).ok(),
                None => None,
            }
        )
    };
}
