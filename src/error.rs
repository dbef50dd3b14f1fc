//! The crate-wide error type.
//!
//! Every fallible operation in the core pipeline returns `Result<T, TiffError>`. There is no
//! implicit failure channel and no panic-based error reporting outside of asserted preconditions
//! in the layout assembler (see [`crate::layout`]), which are documented as caller contracts rather
//! than recoverable errors.

use thiserror::Error;

/// Discriminated error surface for the core read pipeline.
///
/// Mirrors the specification's error taxonomy. There is no `Success` variant: a successful
/// operation is represented by `Ok(_)`, not by a member of this enum.
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// The requested resource (file, page) does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A positioned read failed for a reason other than end-of-file.
    #[error("read error: {0}")]
    ReadError(String),

    /// A write failed. Only reachable from the PackBits test encoder in this crate.
    #[error("write error: {0}")]
    WriteError(String),

    /// The TIFF/BigTIFF header is malformed: bad byte-order mark, bad magic, bad offset width, or
    /// non-zero reserved field.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A value did not conform to its expected on-wire encoding (bad PackBits stream, bad batch
    /// invariant, unsorted IFD in strict mode, ...).
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A required tag was missing, or a tag's count/type made it unreadable as declared.
    #[error("invalid tag {tag}: {message}")]
    InvalidTag { tag: u16, message: String },

    /// The file's declared type for a tag could not be promoted to the descriptor's primary type.
    #[error("invalid tag type for tag {tag}: found {found}, expected {expected}")]
    InvalidTagType { tag: u16, found: u16, expected: u16 },

    /// A requested feature (compression scheme, heterogeneous `BitsPerSample`, ...) is not
    /// supported.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A region, tile index, or buffer size fell outside valid bounds.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    /// An allocation or buffer-sizing operation failed.
    #[error("memory error: {0}")]
    MemoryError(String),

    /// A read returned fewer bytes than requested; treated as end-of-file, not partial success.
    #[error("unexpected end of file: expected {expected} bytes at offset {offset}, file is {size}")]
    UnexpectedEndOfFile {
        offset: u64,
        expected: u64,
        size: u64,
    },

    /// An IFD index was requested beyond the page count or the caller's max-page bound.
    #[error("invalid page index {index}: {message}")]
    InvalidPageIndex { index: usize, message: String },

    /// A compression codec's internal decode step failed.
    #[error("compression error: {0}")]
    CompressionError(String),

    /// The underlying I/O transport failed.
    #[error("I/O error: {0}")]
    IOError(String),

    /// A caller supplied an invalid argument (e.g. zero-size batch span).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was invoked in a state that does not support it.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<std::io::Error> for TiffError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => TiffError::UnexpectedEndOfFile {
                offset: 0,
                expected: 0,
                size: 0,
            },
            _ => TiffError::IOError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TiffError>;
