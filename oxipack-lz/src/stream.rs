//! Framed LZ77 + Huffman stream.
//!
//! # Frame Format
//!
//! All integers are little-endian.
//!
//! ```text
//! +----------------+-----------+---------------+--------------+---------------+
//! | originalLength | CRC-32    | metaLength    | code table   | Huffman bits  |
//! | u32            | u32       | u16           | metaLength B | rest of frame |
//! +----------------+-----------+---------------+--------------+---------------+
//! ```
//!
//! The CRC-32 covers the original (uncompressed) bytes. The Huffman stage
//! codes the serialized token stream described in [`crate::tokens`].

use crate::lz77::Lz77Encoder;
use crate::tokens::{replay_tokens, serialize_tokens};
use oxipack_core::crc::Crc32;
use oxipack_core::error::{PackError, Result};
use oxipack_core::traits::CompressionLevel;
use oxipack_huffman::{CodeTable, decode as huffman_decode, encode as huffman_encode};

/// Size of the fixed frame header.
pub const FRAME_HEADER_SIZE: usize = 10;

/// Fixed part of a stream frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Length of the uncompressed data.
    pub original_length: u32,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Length of the serialized code table.
    pub meta_length: u16,
}

impl FrameHeader {
    /// Parse the header at the start of `frame`.
    pub fn parse(frame: &[u8]) -> Result<Self> {
        let header = frame.get(..FRAME_HEADER_SIZE).ok_or_else(|| {
            PackError::corrupt_stream(
                frame.len() as u64,
                format!("stream frame shorter than {FRAME_HEADER_SIZE}-byte header"),
            )
        })?;

        Ok(Self {
            original_length: u32::from_le_bytes([header[0], header[1], header[2], header[3]]),
            crc32: u32::from_le_bytes([header[4], header[5], header[6], header[7]]),
            meta_length: u16::from_le_bytes([header[8], header[9]]),
        })
    }

    /// Serialize the header.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut bytes = [0u8; FRAME_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.original_length.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.crc32.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.meta_length.to_le_bytes());
        bytes
    }
}

/// Compress `data` into one stream frame.
pub fn compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    compress_with_progress(data, level, &mut |_| Ok(()))
}

/// Compress `data`, reporting consumed input bytes through `progress`.
///
/// An error from `progress` (typically [`PackError::Cancelled`]) stops the
/// matcher and is returned unchanged.
pub fn compress_with_progress(
    data: &[u8],
    level: CompressionLevel,
    progress: &mut dyn FnMut(u64) -> Result<()>,
) -> Result<Vec<u8>> {
    let original_length = u32::try_from(data.len()).map_err(|_| {
        PackError::encoding_failure(format!(
            "stream input of {} bytes exceeds the 4 GiB frame limit",
            data.len()
        ))
    })?;

    let tokens = Lz77Encoder::new(level).compress(data, progress)?;
    let serialized = serialize_tokens(&tokens);
    let encoded = huffman_encode(&serialized, level)?;

    let meta = encoded.table.to_meta();
    let meta_length = u16::try_from(meta.len())
        .map_err(|_| PackError::encoding_failure("code table does not fit in the frame"))?;

    let header = FrameHeader {
        original_length,
        crc32: Crc32::compute(data),
        meta_length,
    };

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + meta.len() + encoded.bits.len());
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(&meta);
    frame.extend_from_slice(&encoded.bits);
    Ok(frame)
}

/// Decompress one stream frame.
///
/// Fails with [`PackError::CorruptStream`] on a truncated frame, an invalid
/// code table or token stream, a length mismatch, or a CRC-32 mismatch.
pub fn decompress(frame: &[u8]) -> Result<Vec<u8>> {
    let header = FrameHeader::parse(frame)?;
    let meta_end = FRAME_HEADER_SIZE + usize::from(header.meta_length);
    let meta = frame.get(FRAME_HEADER_SIZE..meta_end).ok_or_else(|| {
        PackError::corrupt_stream(FRAME_HEADER_SIZE as u64, "truncated code table")
    })?;

    let table = CodeTable::from_meta(meta)?;
    let serialized = huffman_decode(&table, &frame[meta_end..])?;

    let expected = header.original_length as usize;
    let data = replay_tokens(&serialized, expected)?;

    if data.len() != expected {
        return Err(PackError::corrupt_stream(
            meta_end as u64,
            format!("stream decoded to {} bytes, header says {expected}", data.len()),
        ));
    }

    let actual = Crc32::compute(&data);
    if actual != header.crc32 {
        return Err(PackError::corrupt_stream(
            4,
            format!(
                "CRC-32 mismatch: expected {:08x}, got {actual:08x}",
                header.crc32
            ),
        ));
    }

    Ok(data)
}
