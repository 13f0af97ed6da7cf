/// Errors from the peers.dat decoding layer.
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or decoding a peers database.
#[derive(Debug, Error)]
pub enum PeersError {
    /// The peers file path was missing or empty.
    #[error("Invalid peers file '{path}'")]
    InvalidPath {
        /// The path as given on the command line.
        path: String,
    },

    /// Flags that cannot be combined.
    #[error("Invalid arguments: {message}")]
    InvalidArgument {
        /// What was wrong with the command line.
        message: String,
    },

    /// The peers file could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The text output file could not be opened or written.
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Input ended before a field could be read.
    #[error("Unexpected end of data at offset {offset} reading {context}")]
    Truncated {
        /// Byte offset where the read started.
        offset: usize,
        /// Which field was being read.
        context: &'static str,
    },

    /// The file declares a format this decoder does not understand.
    #[error(
        "Unsupported peers.dat format {format} (requires format >= {lowest_compatible}, supported <= {supported})"
    )]
    UnsupportedFormat {
        /// Format byte stored in the file.
        format: u8,
        /// Lowest reader format able to decode the file.
        lowest_compatible: i16,
        /// Newest format this decoder knows.
        supported: u8,
    },

    /// The data violates a structural rule of the format.
    #[error("Corrupt peers.dat at offset {offset}: {reason}")]
    Corrupt {
        /// Byte offset close to the violation.
        offset: usize,
        /// Human-readable description.
        reason: String,
    },

    /// The trailing SHA256d checksum does not match the file contents.
    #[error("Checksum mismatch: file says {expected}, contents hash to {actual}")]
    ChecksumMismatch {
        /// Hex checksum stored in the file.
        expected: String,
        /// Hex checksum computed from the contents.
        actual: String,
    },

    /// Output could not be serialized as JSON.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PeersError {
    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPath { .. } | Self::InvalidArgument { .. } | Self::Json(_) => 1,
            Self::Write { .. } => 2,
            Self::Read { .. } => 3,
            Self::Truncated { .. } | Self::UnsupportedFormat { .. } | Self::Corrupt { .. } => 4,
            Self::ChecksumMismatch { .. } => 5,
        }
    }

    /// Machine-readable error code (snake_case) for the JSON error envelope.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath { .. } | Self::InvalidArgument { .. } => "invalid_argument",
            Self::Read { .. } => "read_failed",
            Self::Write { .. } => "write_failed",
            Self::Truncated { .. } => "truncated",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Corrupt { .. } => "corrupt",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
            Self::Json(_) => "json",
        }
    }
}
