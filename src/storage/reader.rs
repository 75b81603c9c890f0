//! Frame reader with strict corruption detection
//!
//! Two access paths:
//! - sequential scan from the start of a collection file (open-time recovery)
//! - positional reads of a single frame (lookup by identifier)
//!
//! Every frame is checksum-verified. Any malformed frame is a corruption
//! error; there is no skipping and no repair.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{RecordFrame, FRAME_OVERHEAD};

/// A frame read during a scan, with its position in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFrame {
    /// Byte offset of the frame start
    pub offset: u64,
    /// Total frame length on disk
    pub frame_len: u32,
    /// Verified payload bytes
    pub payload: Vec<u8>,
}

/// Sequential reader over a collection file.
pub struct StorageReader {
    storage_path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl StorageReader {
    /// Opens a collection file for scanning.
    pub fn open(storage_path: &Path) -> StorageResult<Self> {
        let file = File::open(storage_path).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to open storage file: {}", storage_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            storage_path: storage_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Returns the storage file path.
    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Returns the file size observed at open.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Reads the next frame.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(frame))` if a frame was read
    /// - `Ok(None)` at end of file
    /// - `Err(HOARD_DATA_CORRUPTION)` for truncated, oversized or
    ///   checksum-failing frames
    pub fn read_next(&mut self) -> StorageResult<Option<ScannedFrame>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;

        if remaining < FRAME_OVERHEAD as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated storage: {} bytes remaining, minimum frame size is {}",
                    remaining, FRAME_OVERHEAD
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read frame length: {}", e),
            )
        })?;
        let frame_length = u32::from_le_bytes(len_buf) as u64;

        if frame_length < FRAME_OVERHEAD as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("Invalid frame length: {}", frame_length),
            ));
        }

        if frame_length > remaining {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Frame length {} exceeds remaining file size {}",
                    frame_length, remaining
                ),
            ));
        }

        let mut frame_buf = vec![0u8; frame_length as usize];
        frame_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut frame_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read frame body: {}", e),
            )
        })?;

        let (payload, consumed) = RecordFrame::deserialize(&frame_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        let frame = ScannedFrame {
            offset: self.current_offset,
            frame_len: consumed as u32,
            payload: payload.to_vec(),
        };
        self.current_offset += consumed as u64;

        Ok(Some(frame))
    }

    /// Reads all remaining frames. Any corruption fails the whole read.
    pub fn read_all(&mut self) -> StorageResult<Vec<ScannedFrame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.read_next()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Reads and verifies the frame at `offset` through a shared file handle.
    ///
    /// Uses positional I/O, so concurrent callers do not contend on a cursor.
    pub fn read_frame_at(file: &File, offset: u64, frame_len: u32) -> StorageResult<Vec<u8>> {
        let mut frame_buf = vec![0u8; frame_len as usize];
        read_exact_at(file, &mut frame_buf, offset).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                StorageError::corruption_at_offset(offset, "Frame extends past end of file")
            } else {
                StorageError::read_failed(format!("Failed to read frame at {}", offset), e)
            }
        })?;

        let (payload, consumed) = RecordFrame::deserialize(&frame_buf)
            .map_err(|e| StorageError::corruption_at_offset(offset, e.to_string()))?;

        if consumed != frame_len as usize {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "Frame length {} does not match indexed length {}",
                    consumed, frame_len
                ),
            ));
        }

        Ok(payload.to_vec())
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                let rest = buf;
                buf = &mut rest[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
