//! Whole-stream containers: `tar`, `tgz` and solid (`rar`).
//!
//! # Layout
//!
//! ```text
//! [directory][stream frame]
//! ```
//!
//! The directory (see [`directory`]) lists every entry's name and original
//! size. The stream frame (see [`oxipack_lz::stream`]) compresses one
//! payload built from all entries:
//!
//! - [`ContainerLayout::Tar`]: `{nameLength:u16, name, originalSize:u32, rawBytes}` per entry
//! - [`ContainerLayout::Solid`]: the raw bytes of every entry, back to back
//!
//! Readers check the directory against the frame's declared length before
//! decoding anything.

pub mod directory;

use crate::archive::Archive;
use crate::bytes::{ByteReader, put_len32, put_name};
use directory::{read_directory, write_directory};
use oxipack_core::entry::{ArchiveEntry, InputFile};
use oxipack_core::error::{PackError, Result};
use oxipack_core::traits::{CompressionLevel, ContainerLayout};
use oxipack_lz::stream::{FrameHeader, compress_with_progress, decompress};

/// Writes a container in one sequential pass.
#[derive(Debug, Clone, Copy)]
pub struct ContainerWriter {
    layout: ContainerLayout,
    level: CompressionLevel,
}

impl ContainerWriter {
    /// Create a writer.
    pub fn new(layout: ContainerLayout, level: CompressionLevel) -> Self {
        Self { layout, level }
    }

    /// Write `files` in order.
    pub fn write(&self, files: &[InputFile]) -> Result<Vec<u8>> {
        self.write_with_progress(files, &mut |_| Ok(()))
    }

    /// Write `files`, reporting progress in input bytes.
    ///
    /// `progress` sees how many of the files' bytes the stream codec has
    /// consumed; container framing is not counted.
    pub fn write_with_progress(
        &self,
        files: &[InputFile],
        progress: &mut dyn FnMut(u64) -> Result<()>,
    ) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_directory(files, &mut out)?;

        let payload = build_payload(self.layout, files)?;
        let input_total: u64 = files.iter().map(InputFile::size).sum();
        let payload_len = payload.len() as u64;

        let frame = compress_with_progress(&payload, self.level, &mut |done| {
            progress(scale(done, input_total, payload_len))
        })?;

        out.extend_from_slice(&frame);
        Ok(out)
    }
}

fn build_payload(layout: ContainerLayout, files: &[InputFile]) -> Result<Vec<u8>> {
    let raw: usize = files.iter().map(|f| f.bytes().len()).sum();
    match layout {
        ContainerLayout::Tar => {
            let framing: usize = files.iter().map(|f| 6 + f.name().len()).sum();
            let mut payload = Vec::with_capacity(raw + framing);
            for file in files {
                put_name(&mut payload, file.name())?;
                put_len32(&mut payload, file.bytes().len(), "entry")?;
                payload.extend_from_slice(file.bytes());
            }
            Ok(payload)
        }
        ContainerLayout::Solid => {
            let mut payload = Vec::with_capacity(raw);
            for file in files {
                payload.extend_from_slice(file.bytes());
            }
            Ok(payload)
        }
    }
}

/// Map `done` of `of` payload bytes onto `total` input bytes.
fn scale(done: u64, total: u64, of: u64) -> u64 {
    if of == 0 {
        return total;
    }
    (u128::from(done.min(of)) * u128::from(total) / u128::from(of)) as u64
}

/// Payload length a directory implies for a layout.
fn expected_payload_len(layout: ContainerLayout, entries: &[ArchiveEntry]) -> u64 {
    entries
        .iter()
        .map(|e| match layout {
            ContainerLayout::Tar => 6 + e.name.len() as u64 + e.original_size,
            ContainerLayout::Solid => e.original_size,
        })
        .sum()
}

/// Reads a container; the directory is parsed and validated up front.
#[derive(Debug, Clone)]
pub struct ContainerReader<'a> {
    layout: ContainerLayout,
    entries: Vec<ArchiveEntry>,
    frame: &'a [u8],
}

impl<'a> ContainerReader<'a> {
    /// Parse the directory and check it against the stream frame header.
    pub fn new(layout: ContainerLayout, data: &'a [u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        let entries = read_directory(&mut reader)?;
        let frame = reader.rest();

        let header = FrameHeader::parse(frame).map_err(|_| {
            PackError::corrupt_archive(format!(
                "missing stream frame after directory at offset {}",
                reader.position()
            ))
        })?;

        let expected = expected_payload_len(layout, &entries);
        if expected != u64::from(header.original_length) {
            return Err(PackError::corrupt_archive(format!(
                "directory declares {expected} payload bytes, stream frame holds {}",
                header.original_length
            )));
        }

        Ok(Self {
            layout,
            entries,
            frame,
        })
    }

    /// Layout being read.
    pub fn layout(&self) -> ContainerLayout {
        self.layout
    }

    /// Directory entries, offsets relative to the raw payload.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Decode the stream and split it into entries.
    pub fn read_archive(&self) -> Result<Archive> {
        let payload = decompress(self.frame)?;
        match self.layout {
            ContainerLayout::Solid => Archive::new(self.entries.clone(), payload),
            ContainerLayout::Tar => {
                let raw = self.strip_tuples(&payload)?;
                Archive::new(self.entries.clone(), raw)
            }
        }
    }

    /// Check every tuple header against the directory and keep the raw bytes.
    fn strip_tuples(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut reader = ByteReader::new(payload);
        let raw_len: u64 = self.entries.iter().map(|e| e.original_size).sum();
        let mut raw = Vec::with_capacity(raw_len as usize);

        for entry in &self.entries {
            let name = reader.read_name()?;
            let size = u64::from(reader.read_u32("entry size")?);
            if name != entry.name || size != entry.original_size {
                return Err(PackError::corrupt_archive(format!(
                    "tuple {name} ({size} bytes) does not match directory entry {} ({} bytes)",
                    entry.name, entry.original_size
                )));
            }
            raw.extend_from_slice(reader.read_bytes(size as usize, "entry data")?);
        }

        if !reader.is_empty() {
            return Err(PackError::corrupt_archive(format!(
                "{} unexpected bytes after the last entry",
                reader.remaining()
            )));
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_core::ErrorKind;

    fn files() -> Vec<InputFile> {
        vec![
            InputFile::new("x", b"hello".to_vec()),
            InputFile::new("y", b"world".to_vec()),
        ]
    }

    #[test]
    fn test_solid_roundtrip() {
        let data = ContainerWriter::new(ContainerLayout::Solid, CompressionLevel::DEFAULT)
            .write(&files())
            .unwrap();
        let reader = ContainerReader::new(ContainerLayout::Solid, &data).unwrap();
        assert_eq!(reader.entries().len(), 2);

        let archive = reader.read_archive().unwrap();
        assert_eq!(archive.into_files(), files());
    }

    #[test]
    fn test_tar_payload_layout() {
        let payload = build_payload(ContainerLayout::Tar, &files()).unwrap();
        assert_eq!(&payload[..11], &[1, 0, b'x', 5, 0, 0, 0, b'h', b'e', b'l', b'l']);
        assert_eq!(payload.len(), 2 * (2 + 1 + 4 + 5));
    }

    #[test]
    fn test_tar_roundtrip() {
        let data = ContainerWriter::new(ContainerLayout::Tar, CompressionLevel::BEST)
            .write(&files())
            .unwrap();
        let archive = ContainerReader::new(ContainerLayout::Tar, &data)
            .unwrap()
            .read_archive()
            .unwrap();
        assert_eq!(archive.extract_by_name("x"), Some(&b"hello"[..]));
        assert_eq!(archive.payload(), b"helloworld");
    }

    #[test]
    fn test_layout_mismatch_fails_fast() {
        let data = ContainerWriter::new(ContainerLayout::Solid, CompressionLevel::DEFAULT)
            .write(&files())
            .unwrap();
        let err = ContainerReader::new(ContainerLayout::Tar, &data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptArchive);
    }

    #[test]
    fn test_progress_scaled_to_input() {
        let mut reports = Vec::new();
        ContainerWriter::new(ContainerLayout::Tar, CompressionLevel::FAST)
            .write_with_progress(&files(), &mut |done| {
                reports.push(done);
                Ok(())
            })
            .unwrap();
        assert_eq!(reports.last().copied(), Some(10));
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(0, 100, 200), 0);
        assert_eq!(scale(100, 100, 200), 50);
        assert_eq!(scale(300, 100, 200), 100);
        assert_eq!(scale(0, 7, 0), 7);
    }
}
