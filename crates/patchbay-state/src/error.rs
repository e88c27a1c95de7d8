//! Error types for snapshot and persistence operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from snapshot encoding, decoding, and the persistence channels.
#[derive(Debug, Error)]
pub enum StateError {
    /// The read channel holds no saved state. Absence, not failure; callers
    /// treat it as a no-op.
    #[error("no saved workspace state")]
    NoSavedState,

    /// A persisted snapshot did not parse.
    #[error("failed to decode workspace state: {0}")]
    Decode(#[source] serde_json::Error),

    /// A snapshot could not be serialized.
    #[error("failed to serialize workspace state: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A state parameter payload could not be compressed.
    #[error("failed to compress workspace state: {reason}")]
    Compress {
        /// Description of the compression failure.
        reason: String,
    },

    /// A state parameter payload could not be expanded.
    #[error("failed to decompress workspace state: {reason}")]
    Decompress {
        /// Description of the decompression failure.
        reason: String,
    },

    /// A state parameter was not valid URL-safe base64.
    #[error("invalid state parameter encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::CreateDir {
            path: path.into(),
            source,
        }
    }
}
