//! Record frame format
//!
//! A collection file is a sequence of frames in append order:
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, whole frame including this field)
//! +------------------+
//! | Payload          | (encoded document)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over length + payload)
//! +------------------+
//! ```

use std::io;

use super::checksum::{compute_checksum, compute_checksum_parts};

/// Bytes of framing around every payload
pub const FRAME_OVERHEAD: usize = 4 + 4;

/// Largest payload a frame can carry
pub const MAX_PAYLOAD_LEN: usize = u32::MAX as usize - FRAME_OVERHEAD;

/// Framing for one encoded document.
pub struct RecordFrame;

impl RecordFrame {
    /// Total on-disk size of a frame carrying `payload_len` bytes
    pub fn frame_len(payload_len: usize) -> usize {
        payload_len + FRAME_OVERHEAD
    }

    /// Appends a framed payload to `out`.
    ///
    /// Callers must keep `payload.len()` within [`MAX_PAYLOAD_LEN`].
    pub fn write_into(payload: &[u8], out: &mut Vec<u8>) {
        let frame_length = Self::frame_len(payload.len()) as u32;
        let length_bytes = frame_length.to_le_bytes();
        let checksum = compute_checksum_parts(&[&length_bytes, payload]);

        out.reserve(frame_length as usize);
        out.extend_from_slice(&length_bytes);
        out.extend_from_slice(payload);
        out.extend_from_slice(&checksum.to_le_bytes());
    }

    /// Serializes a framed payload into a fresh buffer.
    pub fn serialize(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        Self::write_into(payload, &mut out);
        out
    }

    /// Parses the frame at the start of `data`, verifying its checksum.
    ///
    /// Returns the payload and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(&[u8], usize)> {
        if data.len() < FRAME_OVERHEAD {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Frame too short",
            ));
        }

        let frame_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if frame_length < FRAME_OVERHEAD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid frame length: {}", frame_length),
            ));
        }

        if data.len() < frame_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Frame truncated: expected {} bytes, got {}",
                    frame_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = frame_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = compute_checksum(&data[0..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        Ok((&data[4..checksum_offset], frame_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip() {
        let frame = RecordFrame::serialize(b"document bytes");
        let (payload, consumed) = RecordFrame::deserialize(&frame).unwrap();

        assert_eq!(payload, b"document bytes");
        assert_eq!(consumed, frame.len());
        assert_eq!(frame.len(), RecordFrame::frame_len(14));
    }

    #[test]
    fn test_consumes_only_first_frame() {
        let mut buf = Vec::new();
        RecordFrame::write_into(b"one", &mut buf);
        RecordFrame::write_into(b"two", &mut buf);

        let (first, consumed) = RecordFrame::deserialize(&buf).unwrap();
        assert_eq!(first, b"one");
        let (second, _) = RecordFrame::deserialize(&buf[consumed..]).unwrap();
        assert_eq!(second, b"two");
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut frame = RecordFrame::serialize(b"some payload");
        let mid = frame.len() / 2;
        frame[mid] ^= 0xFF;

        let err = RecordFrame::deserialize(&frame).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let frame = RecordFrame::serialize(b"some payload");
        let err = RecordFrame::deserialize(&frame[..frame.len() - 1]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_length_below_overhead_rejected() {
        let mut frame = RecordFrame::serialize(b"x");
        frame[0..4].copy_from_slice(&3u32.to_le_bytes());
        let err = RecordFrame::deserialize(&frame).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
