//! Result envelope shared by both conversion directions.

use crate::ConversionWarning;

/// Counts and timings for one conversion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionMetadata {
    /// Input length in bytes.
    pub input_size: usize,
    /// Output length in bytes.
    pub output_size: usize,
    /// Wall-clock duration of the call.
    pub processing_time_ms: u64,
    /// Diagrams rendered and embedded.
    pub diagram_count: usize,
    /// Links targeting a heading in the same document.
    pub internal_link_count: usize,
    /// Links with an external scheme.
    pub external_link_count: usize,
    /// Images embedded or extracted, diagrams excluded.
    pub image_count: usize,
}

/// Image pulled out of a document when extraction to files is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// File name relative to the configured image directory.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Successful conversion output.
#[derive(Debug)]
pub struct Conversion<T> {
    pub output: T,
    pub metadata: ConversionMetadata,
    pub warnings: Vec<ConversionWarning>,
    /// Images to be written next to the output, if extraction is enabled.
    pub images: Vec<ExtractedImage>,
}

impl<T> Conversion<T> {
    /// Warnings rendered as plain strings, in emission order.
    #[must_use]
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}
