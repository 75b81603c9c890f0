//! Codec error types
//!
//! Every decode failure is a corrupt record: the bytes handed to the decoder
//! do not describe exactly one well-formed value.

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Document codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Unexpected end of input at byte {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: u64,
        remaining: usize,
    },

    #[error("Unknown type tag 0x{tag:02x} at byte {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("Invalid boolean byte 0x{byte:02x} at byte {offset}")]
    InvalidBool { byte: u8, offset: usize },

    #[error("Invalid UTF-8 in string at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Duplicate map key '{key}' at byte {offset}")]
    DuplicateKey { key: String, offset: usize },

    #[error("Nesting deeper than {max} levels at byte {offset}")]
    DepthExceeded { max: usize, offset: usize },

    #[error("{count} trailing bytes after top-level value")]
    TrailingBytes { count: usize },

    #[error("Top-level value is a {found}, expected a map")]
    NotAMap { found: &'static str },

    #[error("Length {len} does not fit in a u32 prefix")]
    LengthOverflow { len: usize },

    #[error("Unsupported JSON number: {0}")]
    UnsupportedNumber(String),
}

impl CodecError {
    /// Stable error code string
    pub fn code(&self) -> &'static str {
        "HOARD_CORRUPT_RECORD"
    }
}
