//! Core traits and selectors for compression.
//!
//! The public surface keeps the five algorithm tags the upload form offers
//! (`huffman`, `rle`, `tar`, `tgz`, `rar`). Internally a tag resolves to a
//! [`Pipeline`]: either an [`EntryCodec`] applied to each file on its own, or
//! a [`ContainerLayout`] compressed as one stream.

use crate::entry::CodecTag;
use crate::error::{PackError, Result};
use std::fmt;
use std::str::FromStr;

/// Output of an [`EntryCodec`]: side metadata plus the coded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedBlock {
    /// Codec metadata needed to decode (code table, escape marker, ...).
    pub meta: Vec<u8>,
    /// Coded payload.
    pub data: Vec<u8>,
}

impl EncodedBlock {
    /// Total serialized size of metadata and payload.
    pub fn len(&self) -> usize {
        self.meta.len() + self.data.len()
    }

    /// Whether both parts are empty.
    pub fn is_empty(&self) -> bool {
        self.meta.is_empty() && self.data.is_empty()
    }
}

/// Input bytes a codec consumes between two progress reports.
pub const PROGRESS_INTERVAL: usize = 64 * 1024;

/// A codec that encodes one file independently of every other file.
///
/// Implemented by the Huffman and run-length codecs. Implementations must be
/// shareable across worker threads.
pub trait EntryCodec: Send + Sync {
    /// Tag recorded for entries produced by this codec.
    fn tag(&self) -> CodecTag;

    /// Encode `data` at the given level.
    fn encode(&self, data: &[u8], level: CompressionLevel) -> Result<EncodedBlock> {
        self.encode_with_progress(data, level, &mut |_| Ok(()))
    }

    /// Encode `data`, reporting input bytes consumed so far.
    ///
    /// `progress` is called about every [`PROGRESS_INTERVAL`] bytes with a
    /// non-decreasing count, and last with `data.len()`. An error it returns
    /// aborts the encode.
    fn encode_with_progress(
        &self,
        data: &[u8],
        level: CompressionLevel,
        progress: &mut dyn FnMut(u64) -> Result<()>,
    ) -> Result<EncodedBlock>;

    /// Decode a block produced by [`EntryCodec::encode`].
    fn decode(&self, block: &EncodedBlock) -> Result<Vec<u8>>;
}

/// Compression level, always within 1-9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Default compression (balanced).
    pub const DEFAULT: Self = Self(5);
    /// Best compression (slowest).
    pub const BEST: Self = Self(9);

    /// Create a level, clamping into 1-9.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, 9))
    }

    /// Parse a level from text (form field, CLI flag).
    ///
    /// Any integer is accepted and clamped; anything else is an
    /// [`PackError::InvalidRequest`].
    pub fn parse(text: &str) -> Result<Self> {
        let value: i64 = text
            .trim()
            .parse()
            .map_err(|_| PackError::invalid_request(format!("invalid level: {text:?}")))?;
        Ok(Self::new(value.clamp(1, 9) as u8))
    }

    /// Get the level value.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<CompressionLevel> for u8 {
    fn from(level: CompressionLevel) -> Self {
        level.0
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The algorithm tag a caller selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Per-file Huffman coding.
    Huffman,
    /// Per-file run-length encoding.
    Rle,
    /// Tar-style tuples, whole-stream compressed.
    Tar,
    /// Same layout as tar, distinct name.
    Tgz,
    /// Solid archive: directory then raw concatenation, compressed once.
    Rar,
}

/// Container layout for whole-archive algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerLayout {
    /// `{nameLength, name, originalSize, rawBytes}` tuples.
    Tar,
    /// Raw concatenation of every entry.
    Solid,
}

/// What an [`Algorithm`] resolves to internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Encode each entry on its own with the given codec.
    PerEntry(CodecTag),
    /// Lay entries out in a container and stream-compress it once.
    Container(ContainerLayout),
}

impl Algorithm {
    /// Every tag, in the order the upload form lists them.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Huffman,
        Algorithm::Rle,
        Algorithm::Tar,
        Algorithm::Rar,
        Algorithm::Tgz,
    ];

    /// Lower-case tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Huffman => "huffman",
            Self::Rle => "rle",
            Self::Tar => "tar",
            Self::Tgz => "tgz",
            Self::Rar => "rar",
        }
    }

    /// File extension used for archives produced with this tag.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Huffman => "huf",
            Self::Rle => "rle",
            Self::Tar => "tar",
            Self::Tgz => "tgz",
            Self::Rar => "rar",
        }
    }

    /// Resolve into a codec or container pipeline.
    pub fn pipeline(&self) -> Pipeline {
        match self {
            Self::Huffman => Pipeline::PerEntry(CodecTag::Huffman),
            Self::Rle => Pipeline::PerEntry(CodecTag::Rle),
            Self::Tar | Self::Tgz => Pipeline::Container(ContainerLayout::Tar),
            Self::Rar => Pipeline::Container(ContainerLayout::Solid),
        }
    }

    /// Output filename for an archive with the given identifier.
    pub fn output_name(&self, id: &str) -> String {
        format!("{}_compressed_{}.{}", self.name(), id, self.extension())
    }

    /// Guess the algorithm from an archive file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        Self::ALL.into_iter().find(|a| a.extension() == ext)
    }
}

impl FromStr for Algorithm {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == tag)
            .ok_or_else(|| PackError::invalid_request(format!("unsupported algorithm: {s:?}")))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
