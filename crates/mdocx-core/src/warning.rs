//! Recoverable per-element problems.

use std::fmt;

/// Category of a [`ConversionWarning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// Structured extraction failed; raw text fallback was used.
    ExtractionFailed,
    /// A diagram could not be rendered; its source block was kept.
    DiagramRenderFailed,
    /// A markup construct has no document counterpart and was skipped.
    UnsupportedToken,
    /// Internal link target matches no heading.
    UnresolvedLink,
    /// Image source could not be loaded or decoded.
    ImageUnavailable,
    /// Leading metadata block could not be parsed.
    InvalidFrontMatter,
    /// A builder failed on one element; the element was skipped.
    BuildFailed,
}

impl WarningCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExtractionFailed => "ExtractionFailed",
            Self::DiagramRenderFailed => "DiagramRenderFailed",
            Self::UnsupportedToken => "UnsupportedToken",
            Self::UnresolvedLink => "UnresolvedLink",
            Self::ImageUnavailable => "ImageUnavailable",
            Self::InvalidFrontMatter => "InvalidFrontMatter",
            Self::BuildFailed => "BuildFailed",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable problem attached to a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionWarning {
    pub code: WarningCode,
    pub message: String,
    pub detail: Option<String>,
}

impl ConversionWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Ordered warning collector.
///
/// Every pushed warning is also emitted as a `tracing` event.
#[derive(Debug, Default)]
pub struct Warnings {
    items: Vec<ConversionWarning>,
}

impl Warnings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: ConversionWarning) {
        tracing::warn!(
            code = warning.code.as_str(),
            detail = warning.detail.as_deref().unwrap_or(""),
            "{}",
            warning.message
        );
        self.items.push(warning);
    }

    /// Shorthand for pushing a warning without detail.
    pub fn warn(&mut self, code: WarningCode, message: impl Into<String>) {
        self.push(ConversionWarning::new(code, message));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of warnings with the given code.
    #[must_use]
    pub fn count(&self, code: WarningCode) -> usize {
        self.items.iter().filter(|w| w.code == code).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversionWarning> {
        self.items.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ConversionWarning> {
        self.items
    }
}

impl Extend<ConversionWarning> for Warnings {
    fn extend<T: IntoIterator<Item = ConversionWarning>>(&mut self, iter: T) {
        for warning in iter {
            self.push(warning);
        }
    }
}
