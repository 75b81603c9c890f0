//! Document codec for hoardbase
//!
//! Serializes nested documents into a self-describing binary form and back.
//! Every value carries a one-byte kind tag, so decoding needs no schema.
//!
//! ```text
//! 0x00 null
//! 0x01 bool    u8 (0 | 1)
//! 0x02 int     i64 LE
//! 0x03 uint    u64 LE
//! 0x04 float   f64 bits, u64 LE
//! 0x05 string  u32 LE byte length, UTF-8 bytes
//! 0x06 array   u32 LE count, values
//! 0x07 map     u32 LE count, (u32 LE key length, key, value)*
//! ```
//!
//! `decode(encode(v)) == v` for every value. Decoding rejects unknown tags,
//! prefixes that overrun the input, and trailing bytes.

mod decoder;
mod encoder;
mod errors;
mod value;

pub use decoder::{decode, decode_map};
pub use encoder::{encode, encode_into, encode_map};
pub use errors::{CodecError, CodecResult};
pub use value::{Map, Value};

pub(crate) const TAG_NULL: u8 = 0x00;
pub(crate) const TAG_BOOL: u8 = 0x01;
pub(crate) const TAG_INT: u8 = 0x02;
pub(crate) const TAG_UINT: u8 = 0x03;
pub(crate) const TAG_FLOAT: u8 = 0x04;
pub(crate) const TAG_STRING: u8 = 0x05;
pub(crate) const TAG_ARRAY: u8 = 0x06;
pub(crate) const TAG_MAP: u8 = 0x07;

/// Maximum nesting of arrays and maps accepted by the decoder
pub const MAX_DEPTH: usize = 128;
