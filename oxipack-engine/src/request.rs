//! Compression requests and their up-front validation.

use oxipack_core::entry::{InputFile, MAX_NAME_LEN};
use oxipack_core::error::{PackError, Result};
use oxipack_core::traits::{Algorithm, CompressionLevel};

/// Files plus the settings to compress them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    /// Files in submission order.
    pub files: Vec<InputFile>,
    /// Selected algorithm.
    pub algorithm: Algorithm,
    /// Level, already clamped to 1-9.
    pub level: CompressionLevel,
}

impl CompressionRequest {
    /// Create a request.
    pub fn new(files: Vec<InputFile>, algorithm: Algorithm, level: CompressionLevel) -> Self {
        Self {
            files,
            algorithm,
            level,
        }
    }

    /// Build a request from textual form fields.
    ///
    /// Unknown algorithm tags and non-numeric levels are
    /// [`PackError::InvalidRequest`]; numeric levels are clamped.
    pub fn from_fields(files: Vec<InputFile>, algorithm: &str, level: &str) -> Result<Self> {
        Ok(Self::new(
            files,
            algorithm.parse()?,
            CompressionLevel::parse(level)?,
        ))
    }

    /// Summed size of all files.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(InputFile::size).sum()
    }

    /// Check the request before any work starts.
    ///
    /// Returns the total input size on success.
    pub fn validate(&self, max_payload_bytes: u64) -> Result<u64> {
        if self.files.is_empty() {
            return Err(PackError::invalid_request("no files submitted"));
        }

        for file in &self.files {
            if file.name().is_empty() {
                return Err(PackError::invalid_request("file with an empty name"));
            }
            if file.name().len() > MAX_NAME_LEN {
                return Err(PackError::invalid_request(format!(
                    "file name longer than {MAX_NAME_LEN} bytes"
                )));
            }
        }

        let total = self.total_bytes();
        if total > max_payload_bytes {
            return Err(PackError::payload_too_large(total, max_payload_bytes));
        }
        Ok(total)
    }
}
