//! Container directory: `[entryCount:u32][nameLength:u16, name, originalSize:u32]*`.

use crate::bytes::{ByteReader, put_len32, put_name};
use oxipack_core::entry::{ArchiveEntry, CodecTag, InputFile};
use oxipack_core::error::{PackError, Result};

/// Smallest directory record: length field, a one-byte name and the size.
pub const MIN_RECORD_SIZE: usize = 2 + 1 + 4;

/// Append the directory for `files`.
pub fn write_directory(files: &[InputFile], out: &mut Vec<u8>) -> Result<()> {
    put_len32(out, files.len(), "entry count")?;
    for file in files {
        put_name(out, file.name())?;
        put_len32(out, file.bytes().len(), "entry")?;
    }
    Ok(())
}

/// Read a directory, assigning each entry its offset in the raw payload.
///
/// The entry count is checked against the bytes left before any record is
/// allocated, so a corrupt count cannot trigger a huge allocation.
pub(crate) fn read_directory(reader: &mut ByteReader<'_>) -> Result<Vec<ArchiveEntry>> {
    let count = reader.read_u32("entry count")? as usize;
    if count.saturating_mul(MIN_RECORD_SIZE) > reader.remaining() {
        return Err(PackError::corrupt_archive(format!(
            "directory declares {count} entries but only {} bytes follow",
            reader.remaining()
        )));
    }

    let mut entries = Vec::with_capacity(count);
    let mut offset = 0u64;
    for _ in 0..count {
        let name = reader.read_name()?;
        let size = u64::from(reader.read_u32("entry size")?);
        entries.push(ArchiveEntry::new(name, size, CodecTag::Stream).with_storage(offset, size));
        offset += size;
    }
    Ok(entries)
}
