//! Error types for mdpack core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while staging or packing a dictionary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Output sink error.
    #[error("storage error: {0}")]
    Storage(#[from] mdpack_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Staging store (SQLite) error.
    #[error("staging store error: {0}")]
    Staging(#[from] rusqlite::Error),

    /// An entry's payload could not be produced from its source.
    ///
    /// Either the source is missing or unreadable, or the declared size
    /// matches no candidate payload. The staged data is inconsistent and
    /// the write is aborted.
    #[error("cannot resolve record for key {key:?}: {message}")]
    SourceResolution {
        /// Key of the entry being resolved.
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// Text could not be represented in the configured encoding.
    #[error("encoding error: {message}")]
    Encoding {
        /// Description of the failure.
        message: String,
    },

    /// A staging batch failed to commit.
    ///
    /// Batches committed before the failure stay committed.
    #[error("staging batch failed after {committed_batches} committed batches: {message}")]
    StagingIntegrity {
        /// Number of batches that were committed before the failure.
        committed_batches: u64,
        /// Description of the failure.
        message: String,
    },

    /// Invalid or unsupported on-disk format.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Checksum mismatch detected while reading a block.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },
}

impl CoreError {
    /// Creates a source resolution error.
    pub fn source_resolution(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceResolution {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a staging integrity error.
    pub fn staging_integrity(committed_batches: u64, message: impl Into<String>) -> Self {
        Self::StagingIntegrity {
            committed_batches,
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
