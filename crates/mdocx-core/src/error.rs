//! Hard conversion failures.

use std::fmt;
use std::time::Duration;

/// Machine-readable code carried by every [`ConversionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmptyInput,
    TranscodeFailed,
    InvalidFile,
    NotFound,
    Timeout,
    WriteFailed,
}

impl ErrorCode {
    /// Stable string form, suitable for logs and API responses.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyInput => "EmptyInput",
            Self::TranscodeFailed => "TranscodeFailed",
            Self::InvalidFile => "InvalidFile",
            Self::NotFound => "NotFound",
            Self::Timeout => "Timeout",
            Self::WriteFailed => "WriteFailed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conversion that produced no output.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Input was empty or whitespace only.
    #[error("input is empty")]
    EmptyInput,
    /// Markup serialization failed for the whole document.
    #[error("transcoding failed: {0}")]
    TranscodeFailed(String),
    /// Input bytes are not a readable document package.
    #[error("invalid file: {0}")]
    InvalidFile(String),
    /// A required document part is missing.
    #[error("not found: {0}")]
    NotFound(String),
    /// The call deadline expired while rendering diagrams.
    #[error("conversion timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// The output package could not be written.
    #[error("failed to write document: {0}")]
    WriteFailed(String),
}

impl ConversionError {
    /// Machine-readable code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyInput => ErrorCode::EmptyInput,
            Self::TranscodeFailed(_) => ErrorCode::TranscodeFailed,
            Self::InvalidFile(_) => ErrorCode::InvalidFile,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::WriteFailed(_) => ErrorCode::WriteFailed,
        }
    }
}
