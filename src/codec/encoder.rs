//! Value encoder
//!
//! Each value is written as a one-byte tag followed by its payload. Integers
//! are little-endian; strings, arrays and maps carry a u32 length or count
//! prefix. Map entries are written in insertion order.
//!
//! The encoder enforces the same nesting limit as the decoder, so anything
//! it produces can be read back.

use super::errors::{CodecError, CodecResult};
use super::value::{Map, Value};
use super::{
    MAX_DEPTH, TAG_ARRAY, TAG_BOOL, TAG_FLOAT, TAG_INT, TAG_MAP, TAG_NULL, TAG_STRING, TAG_UINT,
};

/// Encodes a value into a fresh buffer.
pub fn encode(value: &Value) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    encode_into(value, &mut buf)?;
    Ok(buf)
}

/// Encodes a map as the top-level value.
pub fn encode_map(map: &Map) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    write_map(map, 0, &mut buf)?;
    Ok(buf)
}

/// Appends the encoding of `value` to `buf`.
///
/// Fails with `DepthExceeded` when arrays and maps nest deeper than
/// [`MAX_DEPTH`]; `buf` may then hold a partial encoding.
pub fn encode_into(value: &Value, buf: &mut Vec<u8>) -> CodecResult<()> {
    write_value(value, 0, buf)
}

fn write_value(value: &Value, depth: usize, buf: &mut Vec<u8>) -> CodecResult<()> {
    match value {
        Value::Null => buf.push(TAG_NULL),
        Value::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(u8::from(*b));
        }
        Value::Int(i) => {
            buf.push(TAG_INT);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        Value::UInt(u) => {
            buf.push(TAG_UINT);
            buf.extend_from_slice(&u.to_le_bytes());
        }
        Value::Float(f) => {
            buf.push(TAG_FLOAT);
            buf.extend_from_slice(&f.to_bits().to_le_bytes());
        }
        Value::String(s) => {
            buf.push(TAG_STRING);
            write_str(s, buf)?;
        }
        Value::Array(items) => {
            check_depth(depth, buf)?;
            buf.push(TAG_ARRAY);
            write_len(items.len(), buf)?;
            for item in items {
                write_value(item, depth + 1, buf)?;
            }
        }
        Value::Map(map) => write_map(map, depth, buf)?,
    }
    Ok(())
}

fn write_map(map: &Map, depth: usize, buf: &mut Vec<u8>) -> CodecResult<()> {
    check_depth(depth, buf)?;
    buf.push(TAG_MAP);
    write_len(map.len(), buf)?;
    for (key, value) in map.iter() {
        write_str(key, buf)?;
        write_value(value, depth + 1, buf)?;
    }
    Ok(())
}

fn check_depth(depth: usize, buf: &[u8]) -> CodecResult<()> {
    if depth >= MAX_DEPTH {
        return Err(CodecError::DepthExceeded {
            max: MAX_DEPTH,
            offset: buf.len(),
        });
    }
    Ok(())
}

fn write_str(s: &str, buf: &mut Vec<u8>) -> CodecResult<()> {
    write_len(s.len(), buf)?;
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_len(len: usize, buf: &mut Vec<u8>) -> CodecResult<()> {
    let len32 = u32::try_from(len).map_err(|_| CodecError::LengthOverflow { len })?;
    buf.extend_from_slice(&len32.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_layouts() {
        assert_eq!(encode(&Value::Null).unwrap(), vec![TAG_NULL]);
        assert_eq!(encode(&Value::Bool(true)).unwrap(), vec![TAG_BOOL, 1]);

        let int = encode(&Value::Int(-2)).unwrap();
        assert_eq!(int[0], TAG_INT);
        assert_eq!(&int[1..], &(-2i64).to_le_bytes());

        let float = encode(&Value::Float(0.5)).unwrap();
        assert_eq!(float[0], TAG_FLOAT);
        assert_eq!(&float[1..], &0.5f64.to_bits().to_le_bytes());
    }

    #[test]
    fn test_string_is_length_prefixed() {
        let bytes = encode(&Value::from("héllo")).unwrap();
        assert_eq!(bytes[0], TAG_STRING);
        assert_eq!(&bytes[1..5], &6u32.to_le_bytes());
        assert_eq!(&bytes[5..], "héllo".as_bytes());
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let map = Map::new().with("b", 1).with("a", 2);
        let bytes = encode_map(&map).unwrap();

        assert_eq!(bytes[0], TAG_MAP);
        assert_eq!(&bytes[1..5], &2u32.to_le_bytes());
        // first key length + "b"
        assert_eq!(&bytes[5..9], &1u32.to_le_bytes());
        assert_eq!(bytes[9], b'b');
    }

    #[test]
    fn test_encode_map_matches_encode_of_value() {
        let map = Map::new().with("x", vec![Value::Int(1), Value::Null]);
        assert_eq!(
            encode_map(&map).unwrap(),
            encode(&Value::Map(map.clone())).unwrap()
        );
    }

    fn nested_arrays(levels: usize) -> Value {
        let mut value = Value::Int(1);
        for _ in 0..levels {
            value = Value::Array(vec![value]);
        }
        value
    }

    #[test]
    fn test_depth_limit_matches_decoder() {
        let deepest = nested_arrays(MAX_DEPTH);
        let bytes = encode(&deepest).unwrap();
        assert_eq!(super::super::decode(&bytes).unwrap(), deepest);

        let err = encode(&nested_arrays(MAX_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, CodecError::DepthExceeded { max: MAX_DEPTH, .. }));
    }

    #[test]
    fn test_depth_counts_map_levels() {
        // The top-level map is level one
        let map = Map::new().with("deep", nested_arrays(MAX_DEPTH));
        assert!(matches!(
            encode_map(&map).unwrap_err(),
            CodecError::DepthExceeded { .. }
        ));

        let map = Map::new().with("deep", nested_arrays(MAX_DEPTH - 1));
        assert!(encode_map(&map).is_ok());
    }

    #[test]
    fn test_deterministic() {
        let map = Map::new().with("k", "v").with("n", 3.25);
        assert_eq!(encode_map(&map).unwrap(), encode_map(&map).unwrap());
    }
}
