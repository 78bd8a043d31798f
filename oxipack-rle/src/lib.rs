//! # OxiPack RLE
//!
//! Run-length encoding with a per-entry escape marker.
//!
//! The escape marker is the least frequent byte of the input, so for most
//! data it never occurs and the encoding adds no overhead for bytes that are
//! not part of a run.
//!
//! ## Example
//!
//! ```rust
//! use oxipack_core::{CompressionLevel, EntryCodec};
//! use oxipack_rle::RleCodec;
//!
//! let block = RleCodec.encode(b"aaaabbbcc", CompressionLevel::FAST).unwrap();
//! assert_eq!(RleCodec.decode(&block).unwrap(), b"aaaabbbcc");
//! ```
//!
//! ## Levels
//!
//! - Level 1-5: runs only
//! - Level 6-9: runs plus repeated two-byte printable patterns (`"ababab"`)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;

pub use codec::{
    RleCodec, choose_escape, decode_with_escape, encode, encode_with_escape,
    encode_with_escape_progress,
};
