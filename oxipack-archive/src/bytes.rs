//! Little-endian field helpers shared by the container layouts.

use oxipack_core::entry::MAX_NAME_LEN;
use oxipack_core::error::{PackError, Result};

/// Bounds-checked cursor over a container.
///
/// Every read past the end is a [`PackError::CorruptArchive`] naming the
/// field and offset.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn read_bytes(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(PackError::corrupt_archive(format!(
                "truncated {field} at offset {}: need {len} bytes, {} remain",
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn read_u16(&mut self, field: &str) -> Result<u16> {
        let b = self.read_bytes(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_u32(&mut self, field: &str) -> Result<u32> {
        let b = self.read_bytes(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// `nameLength:u16` followed by that many UTF-8 bytes.
    pub(crate) fn read_name(&mut self) -> Result<String> {
        let offset = self.pos;
        let len = usize::from(self.read_u16("name length")?);
        let bytes = self.read_bytes(len, "entry name")?;
        if bytes.is_empty() {
            return Err(PackError::corrupt_archive(format!(
                "empty entry name at offset {offset}"
            )));
        }
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            PackError::corrupt_archive(format!("entry name at offset {offset} is not UTF-8"))
        })
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

/// Append `nameLength:u16` and the name.
pub(crate) fn put_name(out: &mut Vec<u8>, name: &str) -> Result<()> {
    let len = u16::try_from(name.len()).map_err(|_| {
        PackError::invalid_request(format!("entry name longer than {MAX_NAME_LEN} bytes"))
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

/// Append a `u32` length, rejecting values that do not fit.
pub(crate) fn put_len32(out: &mut Vec<u8>, len: usize, what: &str) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        PackError::invalid_request(format!("{what} of {len} bytes exceeds the 4 GiB field"))
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_core::ErrorKind;

    #[test]
    fn test_name_roundtrip() {
        let mut out = Vec::new();
        put_name(&mut out, "notes.txt").unwrap();
        put_len32(&mut out, 42, "size").unwrap();

        let mut reader = ByteReader::new(&out);
        assert_eq!(reader.read_name().unwrap(), "notes.txt");
        assert_eq!(reader.read_u32("size").unwrap(), 42);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_truncated_field() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        let err = reader.read_u32("entry count").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptArchive);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_bad_names() {
        let mut reader = ByteReader::new(&[0, 0]);
        assert!(reader.read_name().is_err());

        let mut reader = ByteReader::new(&[2, 0, 0xFF, 0xFE]);
        assert_eq!(reader.read_name().unwrap_err().kind(), ErrorKind::CorruptArchive);
    }
}
