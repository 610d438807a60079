//! Error types for the extraction and transcoding stages.

use std::str::Utf8Error;

/// Failure to read a document package.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// Input is not a readable ZIP package.
    #[error("not a document package: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required part is absent from the package.
    #[error("missing part: {0}")]
    MissingPart(String),

    /// Part I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parse error.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Encoding error during XML parsing.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] Utf8Error),
}

/// Failure to serialize the cleaned tree as markup.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("element nesting deeper than {0} levels")]
    DepthExceeded(usize),
}
