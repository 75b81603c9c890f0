//! Value decoder
//!
//! Decoding is strict: the input must hold exactly one value. Length and
//! count prefixes are checked against the remaining input before anything is
//! allocated, so garbled prefixes fail fast instead of allocating.

use super::errors::{CodecError, CodecResult};
use super::value::{Map, Value};
use super::{
    MAX_DEPTH, TAG_ARRAY, TAG_BOOL, TAG_FLOAT, TAG_INT, TAG_MAP, TAG_NULL, TAG_STRING, TAG_UINT,
};

/// Decodes exactly one value from `bytes`.
pub fn decode(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.read_value(0)?;
    decoder.finish()?;
    Ok(value)
}

/// Decodes exactly one value and requires it to be a map.
pub fn decode_map(bytes: &[u8]) -> CodecResult<Map> {
    match decode(bytes)? {
        Value::Map(map) => Ok(map),
        other => Err(CodecError::NotAMap { found: other.kind() }),
    }
}

struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn finish(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            count => Err(CodecError::TrailingBytes { count }),
        }
    }

    fn take(&mut self, n: u64) -> CodecResult<&'a [u8]> {
        if n > self.remaining() as u64 {
            return Err(CodecError::Truncated {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += n as usize;
        Ok(&self.bytes[start..self.pos])
    }

    fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_8(&mut self) -> CodecResult<[u8; 8]> {
        let mut out = [0u8; 8];
        out.copy_from_slice(self.take(8)?);
        Ok(out)
    }

    fn read_u32(&mut self) -> CodecResult<u32> {
        let mut out = [0u8; 4];
        out.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(out))
    }

    /// Reads an element count. Every element takes at least one byte, so a
    /// count above the remaining length cannot be valid.
    fn read_count(&mut self) -> CodecResult<usize> {
        let offset = self.pos;
        let count = self.read_u32()?;
        if count as u64 > self.remaining() as u64 {
            return Err(CodecError::Truncated {
                offset,
                needed: count as u64,
                remaining: self.remaining(),
            });
        }
        Ok(count as usize)
    }

    fn read_string(&mut self) -> CodecResult<String> {
        let len = self.read_u32()?;
        let offset = self.pos;
        let raw = self.take(len as u64)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8 { offset })
    }

    fn read_value(&mut self, depth: usize) -> CodecResult<Value> {
        let offset = self.pos;
        let tag = self.read_u8()?;
        match tag {
            TAG_NULL => Ok(Value::Null),
            TAG_BOOL => {
                let byte_offset = self.pos;
                match self.read_u8()? {
                    0 => Ok(Value::Bool(false)),
                    1 => Ok(Value::Bool(true)),
                    byte => Err(CodecError::InvalidBool {
                        byte,
                        offset: byte_offset,
                    }),
                }
            }
            TAG_INT => Ok(Value::Int(i64::from_le_bytes(self.read_8()?))),
            TAG_UINT => Ok(Value::UInt(u64::from_le_bytes(self.read_8()?))),
            TAG_FLOAT => Ok(Value::Float(f64::from_bits(u64::from_le_bytes(
                self.read_8()?,
            )))),
            TAG_STRING => Ok(Value::String(self.read_string()?)),
            TAG_ARRAY => {
                self.check_depth(depth, offset)?;
                let count = self.read_count()?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_value(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            TAG_MAP => {
                self.check_depth(depth, offset)?;
                Ok(Value::Map(self.read_map_body(depth)?))
            }
            tag => Err(CodecError::UnknownTag { tag, offset }),
        }
    }

    fn read_map_body(&mut self, depth: usize) -> CodecResult<Map> {
        let count = self.read_count()?;
        let mut map = Map::with_capacity(count);
        for _ in 0..count {
            let key_offset = self.pos;
            let key = self.read_string()?;
            if map.contains_key(&key) {
                return Err(CodecError::DuplicateKey {
                    key,
                    offset: key_offset,
                });
            }
            let value = self.read_value(depth + 1)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn check_depth(&self, depth: usize, offset: usize) -> CodecResult<()> {
        if depth >= MAX_DEPTH {
            return Err(CodecError::DepthExceeded {
                max: MAX_DEPTH,
                offset,
            });
        }
        Ok(())
    }
}
