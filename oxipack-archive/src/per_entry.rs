//! Multi-file container for per-entry codecs (Huffman, RLE).
//!
//! # Layout
//!
//! ```text
//! [entryCount:u32]
//! per entry: [nameLength:u16][name][encodedLength:u32][metaLength:u16][meta][encodedBytes]
//! ```
//!
//! `meta` is the codec's side data: the serialized code table for Huffman,
//! the escape marker for RLE.

use crate::bytes::{ByteReader, put_len32, put_name};
use oxipack_core::entry::{ArchiveEntry, InputFile};
use oxipack_core::error::{PackError, Result};
use oxipack_core::traits::{EncodedBlock, EntryCodec};

/// Smallest possible record: one-byte name, empty meta and data.
pub const MIN_RECORD_SIZE: usize = 2 + 1 + 4 + 2;

/// One encoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Entry name.
    pub name: String,
    /// Codec output.
    pub block: EncodedBlock,
    /// Offset of the record's meta within the container (0 when writing).
    pub offset: u64,
}

impl EntryRecord {
    /// Create a record for writing.
    pub fn new(name: impl Into<String>, block: EncodedBlock) -> Self {
        Self {
            name: name.into(),
            block,
            offset: 0,
        }
    }

    /// Decode the record with `codec`.
    pub fn decode(&self, codec: &dyn EntryCodec) -> Result<InputFile> {
        Ok(InputFile::new(self.name.clone(), codec.decode(&self.block)?))
    }
}

/// Serialize records in order.
pub fn write_entries(records: &[EntryRecord]) -> Result<Vec<u8>> {
    let size: usize = records
        .iter()
        .map(|r| MIN_RECORD_SIZE + r.name.len() + r.block.len())
        .sum();
    let mut out = Vec::with_capacity(4 + size);

    put_len32(&mut out, records.len(), "entry count")?;
    for record in records {
        put_name(&mut out, &record.name)?;
        put_len32(&mut out, record.block.data.len(), "encoded entry")?;
        let meta_len = u16::try_from(record.block.meta.len()).map_err(|_| {
            PackError::encoding_failure(format!("codec metadata for {} exceeds 64 KiB", record.name))
        })?;
        out.extend_from_slice(&meta_len.to_le_bytes());
        out.extend_from_slice(&record.block.meta);
        out.extend_from_slice(&record.block.data);
    }
    Ok(out)
}

/// Parse records without decoding them.
pub fn read_entries(data: &[u8]) -> Result<Vec<EntryRecord>> {
    let mut reader = ByteReader::new(data);
    let count = reader.read_u32("entry count")? as usize;
    if count.saturating_mul(MIN_RECORD_SIZE) > reader.remaining() {
        return Err(PackError::corrupt_archive(format!(
            "container declares {count} entries but only {} bytes follow",
            reader.remaining()
        )));
    }

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let name = reader.read_name()?;
        let encoded_len = reader.read_u32("encoded length")? as usize;
        let meta_len = usize::from(reader.read_u16("meta length")?);
        let offset = reader.position() as u64;
        let meta = reader.read_bytes(meta_len, "codec metadata")?.to_vec();
        let data = reader.read_bytes(encoded_len, "encoded entry")?.to_vec();
        records.push(EntryRecord {
            name,
            block: EncodedBlock { meta, data },
            offset,
        });
    }

    if !reader.is_empty() {
        return Err(PackError::corrupt_archive(format!(
            "{} unexpected bytes after the last entry",
            reader.remaining()
        )));
    }
    Ok(records)
}

/// Decode every record.
pub fn decode_entries(codec: &dyn EntryCodec, records: &[EntryRecord]) -> Result<Vec<InputFile>> {
    records.iter().map(|r| r.decode(codec)).collect()
}

/// Describe every record, decoding each to learn its original size.
pub fn describe_entries(codec: &dyn EntryCodec, records: &[EntryRecord]) -> Result<Vec<ArchiveEntry>> {
    records
        .iter()
        .map(|r| {
            let original = codec.decode(&r.block)?.len() as u64;
            Ok(ArchiveEntry::new(r.name.clone(), original, codec.tag())
                .with_storage(r.offset, r.block.len() as u64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_core::ErrorKind;

    fn block(meta: &[u8], data: &[u8]) -> EncodedBlock {
        EncodedBlock {
            meta: meta.to_vec(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_layout() {
        let out = write_entries(&[EntryRecord::new("a", block(&[9], b"xy"))]).unwrap();
        assert_eq!(out, vec![1, 0, 0, 0, 1, 0, b'a', 2, 0, 0, 0, 1, 0, 9, b'x', b'y']);

        let records = read_entries(&out).unwrap();
        assert_eq!(records[0].name, "a");
        assert_eq!(records[0].block, block(&[9], b"xy"));
        assert_eq!(records[0].offset, 13);
    }

    #[test]
    fn test_entry_larger_than_remaining() {
        let mut out = write_entries(&[EntryRecord::new("a", block(&[9], b"xy"))]).unwrap();
        out[7] = 50;
        let err = read_entries(&out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptArchive);
    }

    #[test]
    fn test_trailing_bytes() {
        let mut out = write_entries(&[EntryRecord::new("a", block(&[], b""))]).unwrap();
        out.push(0);
        assert_eq!(read_entries(&out).unwrap_err().kind(), ErrorKind::CorruptArchive);
    }

    #[test]
    fn test_implausible_count() {
        let err = read_entries(&[0, 0, 0, 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptArchive);
    }
}
