//! # OxiPack Huffman
//!
//! Pure Rust Huffman coding for single entries.
//!
//! ## Features
//!
//! - Deterministic tree construction: equal weights are merged in insertion
//!   order, so the same input always yields the same code
//! - An explicit end-of-stream symbol, so no separate length field is needed
//! - Optional pair merging at levels 7-9: frequent two-byte sequences get
//!   their own symbols when that makes the output smaller
//!
//! ## Example
//!
//! ```rust
//! use oxipack_core::CompressionLevel;
//! use oxipack_huffman::{decode, encode};
//!
//! let data = b"abracadabra abracadabra";
//! let encoded = encode(data, CompressionLevel::DEFAULT).unwrap();
//! let decoded = decode(&encoded.table, &encoded.bits).unwrap();
//! assert_eq!(&decoded, data);
//! ```
//!
//! ## Symbols
//!
//! | Range     | Meaning            |
//! |-----------|--------------------|
//! | 0-255     | literal byte       |
//! | 256       | end of stream      |
//! | 257-320   | merged byte pair   |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod pairs;
pub mod tree;

// Re-exports
pub use codec::{
    Code, CodeTable, HuffmanCodec, HuffmanEncoded, decode, encode, encode_with_pairs,
    encode_with_progress,
};
pub use pairs::PairAlphabet;
pub use tree::{END_OF_STREAM, FrequencyTable, HuffmanTree, build_tree};
