//! # OxiPack Archive
//!
//! Multi-file containers for OxiPack.
//!
//! Every algorithm tag maps onto one of two container families:
//!
//! - **Per-entry** (`huffman`, `rle`): each file is encoded on its own and
//!   the results are listed one after another, see [`per_entry`]
//! - **Whole-stream** (`tar`, `tgz`, `rar`): a directory followed by one
//!   LZ77 + Huffman stream over all files, see [`container`]
//!
//! ## Example
//!
//! ```rust
//! use oxipack_archive::{pack, unpack};
//! use oxipack_core::{Algorithm, CompressionLevel, InputFile};
//!
//! let files = vec![
//!     InputFile::new("x", b"hello".to_vec()),
//!     InputFile::new("y", b"world".to_vec()),
//! ];
//! let archive = pack(Algorithm::Rar, &files, CompressionLevel::DEFAULT).unwrap();
//! assert_eq!(unpack(Algorithm::Rar, &archive).unwrap(), files);
//! ```
//!
//! ## Format Detection
//!
//! Archives carry no magic bytes. Callers pass the [`Algorithm`] explicitly
//! or derive it from the file name with [`Algorithm::from_file_name`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
mod bytes;
pub mod container;
pub mod per_entry;

use oxipack_core::entry::{ArchiveEntry, CodecTag, InputFile};
use oxipack_core::error::{PackError, Result};
use oxipack_core::traits::{Algorithm, CompressionLevel, EntryCodec, Pipeline};
use oxipack_huffman::HuffmanCodec;
use oxipack_rle::RleCodec;

// Re-exports
pub use archive::Archive;
pub use container::{ContainerReader, ContainerWriter};
pub use per_entry::{EntryRecord, read_entries, write_entries};

static HUFFMAN: HuffmanCodec = HuffmanCodec;
static RLE: RleCodec = RleCodec;

/// The per-entry codec for a tag, if it has one.
pub fn entry_codec(tag: CodecTag) -> Option<&'static dyn EntryCodec> {
    match tag {
        CodecTag::Huffman => Some(&HUFFMAN),
        CodecTag::Rle => Some(&RLE),
        CodecTag::Stored | CodecTag::Stream => None,
    }
}

fn require_codec(tag: CodecTag) -> Result<&'static dyn EntryCodec> {
    entry_codec(tag)
        .ok_or_else(|| PackError::encoding_failure(format!("no per-entry codec for {tag}")))
}

/// Pack `files` with `algorithm`.
pub fn pack(algorithm: Algorithm, files: &[InputFile], level: CompressionLevel) -> Result<Vec<u8>> {
    pack_with_progress(algorithm, files, level, &mut |_| Ok(()))
}

/// Pack `files`, reporting cumulative input bytes processed.
///
/// Files are encoded one after another and report progress while each one
/// is coded; an error from `progress` aborts.
pub fn pack_with_progress(
    algorithm: Algorithm,
    files: &[InputFile],
    level: CompressionLevel,
    progress: &mut dyn FnMut(u64) -> Result<()>,
) -> Result<Vec<u8>> {
    match algorithm.pipeline() {
        Pipeline::PerEntry(tag) => {
            let codec = require_codec(tag)?;
            let mut done = 0u64;
            let mut records = Vec::with_capacity(files.len());
            for file in files {
                let block =
                    codec.encode_with_progress(file.bytes(), level, &mut |n| progress(done + n))?;
                records.push(EntryRecord::new(file.name(), block));
                done += file.size();
            }
            write_entries(&records)
        }
        Pipeline::Container(layout) => {
            ContainerWriter::new(layout, level).write_with_progress(files, progress)
        }
    }
}

/// Unpack an archive produced with `algorithm` into its files, in order.
pub fn unpack(algorithm: Algorithm, data: &[u8]) -> Result<Vec<InputFile>> {
    match algorithm.pipeline() {
        Pipeline::PerEntry(tag) => {
            per_entry::decode_entries(require_codec(tag)?, &read_entries(data)?)
        }
        Pipeline::Container(layout) => {
            Ok(ContainerReader::new(layout, data)?.read_archive()?.into_files())
        }
    }
}

/// List the entries of an archive.
///
/// Whole-stream containers are listed from the directory alone. Per-entry
/// containers have no separate directory, so each entry is decoded to learn
/// its original size.
pub fn list_entries(algorithm: Algorithm, data: &[u8]) -> Result<Vec<ArchiveEntry>> {
    match algorithm.pipeline() {
        Pipeline::PerEntry(tag) => {
            per_entry::describe_entries(require_codec(tag)?, &read_entries(data)?)
        }
        Pipeline::Container(layout) => Ok(ContainerReader::new(layout, data)?.entries().to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_codec_lookup() {
        assert_eq!(entry_codec(CodecTag::Huffman).map(|c| c.tag()), Some(CodecTag::Huffman));
        assert_eq!(entry_codec(CodecTag::Rle).map(|c| c.tag()), Some(CodecTag::Rle));
        assert!(entry_codec(CodecTag::Stream).is_none());
    }

    #[test]
    fn test_rle_example() {
        let files = vec![InputFile::new("a.txt", b"aaaabbbcc".to_vec())];
        let data = pack(Algorithm::Rle, &files, CompressionLevel::FAST).unwrap();
        assert_eq!(unpack(Algorithm::Rle, &data).unwrap(), files);
    }

    #[test]
    fn test_list_per_entry() {
        let files = vec![
            InputFile::new("one", vec![b'1'; 300]),
            InputFile::new("two", b"two".to_vec()),
        ];
        let data = pack(Algorithm::Huffman, &files, CompressionLevel::DEFAULT).unwrap();
        let entries = list_entries(Algorithm::Huffman, &data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].original_size, 300);
        assert_eq!(entries[0].codec, CodecTag::Huffman);
        assert!(entries[0].stored_size < 300);
        assert_eq!(entries[1].name, "two");
    }

    #[test]
    fn test_progress_reaches_total() {
        let files = vec![
            InputFile::new("a", vec![1u8; 40]),
            InputFile::new("b", vec![2u8; 60]),
        ];
        for algorithm in Algorithm::ALL {
            let mut last = 0;
            pack_with_progress(algorithm, &files, CompressionLevel::DEFAULT, &mut |done| {
                assert!(done >= last);
                last = done;
                Ok(())
            })
            .unwrap();
            assert_eq!(last, 100, "{algorithm}");
        }
    }

    #[test]
    fn test_per_entry_progress_within_file() {
        let size = oxipack_core::traits::PROGRESS_INTERVAL * 3;
        let files = vec![
            InputFile::new("small", b"tiny".to_vec()),
            InputFile::new("large", (0..size).map(|i| (i % 200) as u8).collect::<Vec<_>>()),
        ];
        for algorithm in [Algorithm::Huffman, Algorithm::Rle] {
            let mut seen = Vec::new();
            pack_with_progress(algorithm, &files, CompressionLevel::FAST, &mut |done| {
                seen.push(done);
                Ok(())
            })
            .unwrap();

            let inside = seen.iter().filter(|&&d| d > 4 && d < size as u64 + 4).count();
            assert!(inside >= 2, "{algorithm}: {seen:?}");
            assert_eq!(seen.last(), Some(&(size as u64 + 4)));
        }
    }
}
