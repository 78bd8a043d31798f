//! Decoded view of a container archive.

use oxipack_core::entry::{ArchiveEntry, InputFile};
use oxipack_core::error::{PackError, Result};

/// Ordered entries plus the raw payload they index into.
///
/// Built only through [`Archive::new`], which checks that the entries tile
/// the payload exactly: offsets in order, in bounds, non-overlapping, and
/// summing to the payload length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
    payload: Vec<u8>,
}

impl Archive {
    /// Validate and assemble an archive.
    pub fn new(entries: Vec<ArchiveEntry>, payload: Vec<u8>) -> Result<Self> {
        let mut expected_offset = 0u64;
        for entry in &entries {
            if entry.stored_offset != expected_offset {
                return Err(PackError::corrupt_archive(format!(
                    "entry {} starts at {}, expected {expected_offset}",
                    entry.name, entry.stored_offset
                )));
            }
            expected_offset = expected_offset
                .checked_add(entry.stored_size)
                .ok_or_else(|| PackError::corrupt_archive("entry sizes overflow"))?;
            if expected_offset > payload.len() as u64 {
                return Err(PackError::corrupt_archive(format!(
                    "entry {} declares {} bytes, more than the remaining payload",
                    entry.name, entry.stored_size
                )));
            }
        }
        if expected_offset != payload.len() as u64 {
            return Err(PackError::corrupt_archive(format!(
                "entries cover {expected_offset} bytes, payload has {}",
                payload.len()
            )));
        }
        Ok(Self { entries, payload })
    }

    /// Entries in archive order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Raw payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes of one entry.
    pub fn extract(&self, entry: &ArchiveEntry) -> Result<&[u8]> {
        let start = entry.stored_offset as usize;
        let end = start.saturating_add(entry.stored_size as usize);
        self.payload.get(start..end).ok_or_else(|| {
            PackError::corrupt_archive(format!("entry {} lies outside the payload", entry.name))
        })
    }

    /// Bytes of the first entry called `name`.
    pub fn extract_by_name(&self, name: &str) -> Option<&[u8]> {
        let entry = self.entries.iter().find(|e| e.name == name)?;
        self.extract(entry).ok()
    }

    /// Split into named files, in archive order.
    pub fn into_files(self) -> Vec<InputFile> {
        let mut payload = self.payload;
        let mut files = Vec::with_capacity(self.entries.len());
        // Split from the back so each split is a cheap truncate.
        for entry in self.entries.into_iter().rev() {
            let bytes = payload.split_off(entry.stored_offset as usize);
            files.push(InputFile::new(entry.name, bytes));
        }
        files.reverse();
        files
    }
}
