//! Bit-level I/O operations for the codecs.
//!
//! This module provides `BitReader` and `BitWriter` for reading and writing
//! data at the bit level, which is what variable-length Huffman codes need.
//!
//! # Bit Ordering
//!
//! OxiPack uses MSB-first (Most Significant Bit first) ordering: the first
//! bit written lands in bit 7 of the first byte. A code written as `0b110`
//! with length 3 therefore reads back as the bits `1`, `1`, `0` in stream
//! order, which is the order a Huffman tree is walked from the root.
//!
//! # Example
//!
//! ```
//! use oxipack_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0b1100, 4);
//! let bytes = writer.flush();
//! assert_eq!(bytes, vec![0b1011_1000]);
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
//! ```

use crate::error::{PackError, Result};

/// MSB-first bit writer backed by an in-memory buffer.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    /// Completed output bytes.
    output: Vec<u8>,
    /// Bit buffer (MSB-first, low `bits_in_buffer` bits are valid).
    buffer: u64,
    /// Number of valid bits in buffer (always < 8 between calls).
    bits_in_buffer: u8,
    /// Total bits written.
    total_bits_written: u64,
}

impl BitWriter {
    /// Create a new, empty `BitWriter`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with room for `bytes` output bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            output: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.total_bits_written
    }

    /// Append the low `count` bits of `value`, most significant first.
    ///
    /// # Arguments
    ///
    /// * `value` - The bits to write
    /// * `count` - Number of bits to write (0-32)
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32, "Cannot write more than 32 bits at once");
        let count = count.min(32);

        if count == 0 {
            return;
        }

        let mask = if count == 32 {
            u32::MAX
        } else {
            (1u32 << count).wrapping_sub(1)
        };

        self.buffer = (self.buffer << count) | u64::from(value & mask);
        self.bits_in_buffer += count;
        self.total_bits_written += u64::from(count);

        // Flush complete bytes (from MSB side)
        while self.bits_in_buffer >= 8 {
            let byte = (self.buffer >> (self.bits_in_buffer - 8)) as u8;
            self.output.push(byte);
            self.bits_in_buffer -= 8;
        }
        self.buffer &= (1u64 << self.bits_in_buffer) - 1;
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u32::from(bit), 1);
    }

    /// Write a code of up to 64 bits.
    pub fn write_code(&mut self, bits: u64, length: u8) {
        debug_assert!(length <= 64, "Cannot write more than 64 bits at once");
        if length > 32 {
            self.write_bits((bits >> 32) as u32, length - 32);
            self.write_bits(bits as u32, 32);
        } else {
            self.write_bits(bits as u32, length);
        }
    }

    /// Write whole bytes, honouring the current bit alignment.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bits_in_buffer == 0 {
            self.output.extend_from_slice(bytes);
            self.total_bits_written += bytes.len() as u64 * 8;
        } else {
            for &byte in bytes {
                self.write_bits(u32::from(byte), 8);
            }
        }
    }

    /// Pad to the next byte boundary with zero bits.
    pub fn align_to_byte(&mut self) {
        if self.bits_in_buffer > 0 {
            let padding = 8 - self.bits_in_buffer;
            self.write_bits(0, padding);
        }
    }

    /// Pad the final partial byte with zero bits and return the bytes.
    pub fn flush(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.output
    }
}

/// MSB-first bit reader over a byte slice.
///
/// The reader never touches bytes beyond the slice; asking for more bits
/// than remain fails with [`PackError::OutOfData`] and leaves the cursor
/// where it was.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// Input data.
    data: &'a [u8],
    /// Cursor in bits from the start of `data`.
    position: u64,
}

impl<'a> BitReader<'a> {
    /// Create a new MSB-first bit reader.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Total bits in the underlying slice.
    pub fn total_bits(&self) -> u64 {
        self.data.len() as u64 * 8
    }

    /// Bits consumed so far.
    pub fn bit_position(&self) -> u64 {
        self.position
    }

    /// Bits left to read.
    pub fn bits_remaining(&self) -> u64 {
        self.total_bits() - self.position
    }

    /// Read up to 32 bits, first bit read ends up most significant.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of bits to read (0-32)
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");
        let count = count.min(32);

        if count == 0 {
            return Ok(0);
        }

        let available = self.bits_remaining();
        if available < u64::from(count) {
            return Err(PackError::out_of_data(u32::from(count), available));
        }

        let mut value = 0u64;
        let mut left = count;
        while left > 0 {
            let byte = self.data[(self.position / 8) as usize];
            let offset = (self.position % 8) as u8;
            let in_byte = 8 - offset;
            let take = in_byte.min(left);

            let shifted = byte >> (in_byte - take);
            let bits = shifted & (((1u16 << take) - 1) as u8);

            value = (value << take) | u64::from(bits);
            left -= take;
            self.position += u64::from(take);
        }

        Ok(value as u32)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read a full byte at the current bit position.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Skip to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        let remainder = self.position % 8;
        if remainder > 0 {
            self.position += 8 - remainder;
        }
    }

    /// Check that everything left is zero padding inside the final byte.
    pub fn remaining_is_padding(&self) -> bool {
        let remaining = self.bits_remaining();
        if remaining >= 8 {
            return false;
        }
        if remaining == 0 {
            return true;
        }
        let last = self.data[self.data.len() - 1];
        let mask = ((1u16 << remaining) - 1) as u8;
        last & mask == 0
    }
}
