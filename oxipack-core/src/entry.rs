//! Input files and archive entry metadata.
//!
//! [`InputFile`] is what a caller submits; [`ArchiveEntry`] is what a
//! container directory records about each file it holds.

use crate::error::{PackError, Result};
use std::path::{Component, Path};

/// Maximum entry name length (the directory stores it as a `u16`).
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Codec applied to an entry's stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecTag {
    /// Raw bytes, no per-entry coding.
    #[default]
    Stored,
    /// Huffman-coded with an inline code table.
    Huffman,
    /// Run-length encoded with an inline escape marker.
    Rle,
    /// Part of a whole-archive LZ77 stream.
    Stream,
}

impl CodecTag {
    /// Get the codec name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stored => "Stored",
            Self::Huffman => "Huffman",
            Self::Rle => "RLE",
            Self::Stream => "LZ77",
        }
    }
}

impl std::fmt::Display for CodecTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A named file submitted for compression.
///
/// Immutable once built; the orchestrator owns it for the duration of one
/// request and drops it once the archive is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    bytes: Vec<u8>,
}

impl InputFile {
    /// Create an input file.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// File name as submitted.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Take the contents, dropping the name.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// One entry of a container directory.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArchiveEntry {
    /// Entry name.
    pub name: String,
    /// Size of the original file.
    pub original_size: u64,
    /// Offset of the entry's bytes inside the archive payload.
    pub stored_offset: u64,
    /// Number of payload bytes belonging to this entry.
    pub stored_size: u64,
    /// Codec the stored bytes went through.
    pub codec: CodecTag,
}

impl ArchiveEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, original_size: u64, codec: CodecTag) -> Self {
        Self {
            name: name.into(),
            original_size,
            stored_offset: 0,
            stored_size: 0,
            codec,
        }
    }

    /// Set where the entry lives in the payload.
    pub fn with_storage(mut self, offset: u64, size: u64) -> Self {
        self.stored_offset = offset;
        self.stored_size = size;
        self
    }

    /// Compression ratio (stored / original), 0.0 for empty entries.
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.stored_size as f64 / self.original_size as f64
        }
    }

    /// Validate that the name is safe to extract relative to a directory.
    pub fn validate_path(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(PackError::corrupt_archive("empty entry name"));
        }
        let path = Path::new(&self.name);
        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(PackError::corrupt_archive(format!(
                        "unsafe entry name: {}",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Reduce a submitted filename to a safe, flat entry name.
///
/// Directory components are dropped (only the final component is kept),
/// control characters and NULs become `_`. Names that end up empty or
/// longer than [`MAX_NAME_LEN`] are rejected.
pub fn sanitize_name(name: &str) -> Result<String> {
    let base = name
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty() && *part != "." && *part != "..")
        .unwrap_or("");

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().to_string();

    if cleaned.is_empty() {
        return Err(PackError::invalid_request(format!(
            "invalid file name: {name:?}"
        )));
    }
    if cleaned.len() > MAX_NAME_LEN {
        return Err(PackError::invalid_request(format!(
            "file name longer than {MAX_NAME_LEN} bytes"
        )));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_input_file() {
        let file = InputFile::new("a.txt", b"hello".to_vec());
        assert_eq!(file.name(), "a.txt");
        assert_eq!(file.size(), 5);
        assert_eq!(file.into_bytes(), b"hello");
    }

    #[test]
    fn test_entry_ratio() {
        let entry = ArchiveEntry::new("x", 200, CodecTag::Huffman).with_storage(0, 50);
        assert!((entry.compression_ratio() - 0.25).abs() < f64::EPSILON);
        assert_eq!(ArchiveEntry::new("e", 0, CodecTag::Stored).compression_ratio(), 0.0);
    }

    #[test]
    fn test_validate_path() {
        assert!(ArchiveEntry::new("dir/file.txt", 1, CodecTag::Stored).validate_path().is_ok());
        assert!(ArchiveEntry::new("../etc/passwd", 1, CodecTag::Stored).validate_path().is_err());
        assert!(ArchiveEntry::new("/abs", 1, CodecTag::Stored).validate_path().is_err());
        assert!(ArchiveEntry::new("", 1, CodecTag::Stored).validate_path().is_err());
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_name("C:\\Users\\me\\notes.txt").unwrap(), "notes.txt");
        assert_eq!(sanitize_name("dir/sub/").unwrap(), "sub");
        assert_eq!(sanitize_name("bad\0name").unwrap(), "bad_name");

        let err = sanitize_name("../").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(sanitize_name("").is_err());
    }

    #[test]
    fn test_codec_display() {
        assert_eq!(CodecTag::Rle.to_string(), "RLE");
        assert_eq!(CodecTag::default(), CodecTag::Stored);
    }
}
