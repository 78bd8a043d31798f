//! Error types for OxiPack operations.
//!
//! Every failure in the workspace is a [`PackError`]. Each variant maps onto
//! exactly one [`ErrorKind`], which is what request state machines record and
//! what the transport layer turns into a status code.

use std::fmt;
use std::io;
use thiserror::Error;

/// The main error type for OxiPack operations.
#[derive(Debug, Error)]
pub enum PackError {
    /// The request was rejected before any work began.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Why the request was rejected.
        message: String,
    },

    /// Aggregate input size exceeds the configured ceiling.
    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Total submitted bytes.
        size: u64,
        /// Configured ceiling.
        limit: u64,
    },

    /// A bit stream ended before the requested number of bits.
    #[error("Out of data: needed {needed} bits, {available} remaining")]
    OutOfData {
        /// Bits requested.
        needed: u32,
        /// Bits left in the stream.
        available: u64,
    },

    /// A codec stream is structurally invalid.
    #[error("Corrupt stream at offset {offset}: {message}")]
    CorruptStream {
        /// Byte or bit offset where the problem was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// A container directory or payload is inconsistent.
    #[error("Corrupt archive: {message}")]
    CorruptArchive {
        /// Description of the inconsistency.
        message: String,
    },

    /// An internal invariant was violated while encoding.
    #[error("Encoding failure: {message}")]
    EncodingFailure {
        /// Description of the violated invariant.
        message: String,
    },

    /// Unknown, already retrieved or evicted archive identifier.
    #[error("Archive not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// The request was cancelled before completion.
    #[error("Request cancelled")]
    Cancelled,

    /// I/O error from an underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for OxiPack operations.
pub type Result<T> = std::result::Result<T, PackError>;

/// Coarse classification of a [`PackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`PackError::InvalidRequest`].
    InvalidRequest,
    /// See [`PackError::PayloadTooLarge`].
    PayloadTooLarge,
    /// See [`PackError::OutOfData`].
    OutOfData,
    /// See [`PackError::CorruptStream`].
    CorruptStream,
    /// See [`PackError::CorruptArchive`].
    CorruptArchive,
    /// See [`PackError::EncodingFailure`].
    EncodingFailure,
    /// See [`PackError::NotFound`].
    NotFound,
    /// See [`PackError::Cancelled`].
    Cancelled,
    /// See [`PackError::Io`].
    Io,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::PayloadTooLarge => "payload_too_large",
            Self::OutOfData => "out_of_data",
            Self::CorruptStream => "corrupt_stream",
            Self::CorruptArchive => "corrupt_archive",
            Self::EncodingFailure => "encoding_failure",
            Self::NotFound => "not_found",
            Self::Cancelled => "cancelled",
            Self::Io => "io",
        }
    }

    /// Whether the failure was caused by the caller's input rather than the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest | Self::PayloadTooLarge | Self::NotFound | Self::Cancelled
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PackError {
    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a payload too large error.
    pub fn payload_too_large(size: u64, limit: u64) -> Self {
        Self::PayloadTooLarge { size, limit }
    }

    /// Create an out of data error.
    pub fn out_of_data(needed: u32, available: u64) -> Self {
        Self::OutOfData { needed, available }
    }

    /// Create a corrupt stream error.
    pub fn corrupt_stream(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptStream {
            offset,
            message: message.into(),
        }
    }

    /// Create a corrupt archive error.
    pub fn corrupt_archive(message: impl Into<String>) -> Self {
        Self::CorruptArchive {
            message: message.into(),
        }
    }

    /// Create an encoding failure error.
    pub fn encoding_failure(message: impl Into<String>) -> Self {
        Self::EncodingFailure {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Self::OutOfData { .. } => ErrorKind::OutOfData,
            Self::CorruptStream { .. } => ErrorKind::CorruptStream,
            Self::CorruptArchive { .. } => ErrorKind::CorruptArchive,
            Self::EncodingFailure { .. } => ErrorKind::EncodingFailure,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Re-label a bit stream underrun inside a codec payload as stream corruption.
    ///
    /// Codecs read their own framing with [`crate::BitReader`]; running out of
    /// bits there means the encoded stream is truncated.
    pub fn into_stream_error(self, offset: u64) -> Self {
        match self {
            Self::OutOfData { needed, available } => Self::corrupt_stream(
                offset,
                format!("stream truncated: needed {needed} bits, {available} remaining"),
            ),
            other => other,
        }
    }
}
