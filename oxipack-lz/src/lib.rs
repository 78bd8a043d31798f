//! # OxiPack LZ
//!
//! GZIP-like stream codec: LZ77 dictionary matching followed by a Huffman
//! stage, wrapped in a small frame with the original length and a CRC-32.
//!
//! This is the codec behind the `tar`, `tgz` and `rar` container paths. It
//! runs as one sequential pass over the whole container payload, so matches
//! can reach across entry boundaries.
//!
//! ## Example
//!
//! ```rust
//! use oxipack_core::CompressionLevel;
//! use oxipack_lz::{compress, decompress};
//!
//! let original = b"Hello, World! Hello, World!";
//! let frame = compress(original, CompressionLevel::DEFAULT).unwrap();
//! assert_eq!(decompress(&frame).unwrap(), original);
//! ```
//!
//! ## Compression Levels
//!
//! - Level 1-3: 4 KiB window, short hash chains
//! - Level 4-6: 16 KiB window, lazy matching from level 5
//! - Level 7-9: 32 KiB window, long chains, Huffman pair merging

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod lz77;
pub mod stream;
pub mod tokens;

// Re-exports
pub use lz77::{Lz77Encoder, Lz77Token, MatcherParams};
pub use stream::{FrameHeader, compress, compress_with_progress, decompress};
