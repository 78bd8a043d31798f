//! # OxiPack Core
//!
//! Core components for the OxiPack compression engine.
//!
//! This crate provides the fundamental building blocks shared by every codec
//! and container in the workspace:
//!
//! - [`bitstream`]: MSB-first bit-level I/O for variable-length codes
//! - [`crc`]: CRC-32 checksum used by the stream frame trailer
//! - [`traits`]: The [`EntryCodec`] seam, [`CompressionLevel`] and algorithm tags
//! - [`entry`]: Input files and archive entry metadata
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! OxiPack is layered the same way as its sibling archivers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Surface                                             │
//! │     HTTP transport, CLI                                 │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Orchestration + Container                           │
//! │     request state machine, tar / tgz / solid layouts   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Huffman, RLE, LZ77 stream (LZ77 + Huffman)         │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader/BitWriter, CRC-32, errors                │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxipack_core::bitstream::{BitReader, BitWriter};
//! use oxipack_core::crc::Crc32;
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0xABC, 12);
//! let bytes = writer.flush();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(12).unwrap(), 0xABC);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod entry;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use crc::Crc32;
pub use entry::{ArchiveEntry, CodecTag, InputFile, sanitize_name};
pub use error::{ErrorKind, PackError, Result};
pub use traits::{
    Algorithm, CompressionLevel, ContainerLayout, EncodedBlock, EntryCodec, PROGRESS_INTERVAL,
    Pipeline,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitReader, BitWriter};
    pub use crate::entry::{ArchiveEntry, CodecTag, InputFile};
    pub use crate::error::{ErrorKind, PackError, Result};
    pub use crate::traits::{Algorithm, CompressionLevel, EncodedBlock, EntryCodec};
}
