//! Error types for document building and packaging.

/// A builder failed on one markup element.
///
/// Caught per top-level element and reported as a warning; the element is
/// skipped.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("undecodable image {src}: {message}")]
    InvalidImage { src: String, message: String },
}

/// The element tree could not be packed into a document.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to pack document: {0}")]
    Pack(String),
}
