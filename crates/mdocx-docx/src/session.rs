//! Per-call conversion state.

use std::collections::HashMap;

use mdocx_anchors::{AnchorMap, HeadingAnchor, bookmark_name, slugify};
use mdocx_core::{ConversionWarning, WarningCode, Warnings};
use mdocx_diagrams::{DiagramRecord, RasterLimits};

use crate::model::NumberingDefinition;

/// Caller-supplied loader for non-inline image sources (paths, URLs).
pub trait ImageSource: Send + Sync {
    /// Raw image bytes for `src`, or `None` when unavailable.
    fn load(&self, src: &str) -> Option<Vec<u8>>;
}

impl<F> ImageSource for F
where
    F: Fn(&str) -> Option<Vec<u8>> + Send + Sync,
{
    fn load(&self, src: &str) -> Option<Vec<u8>> {
        self(src)
    }
}

/// Counters reported in the conversion metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub diagrams: usize,
    pub images: usize,
    pub internal_links: usize,
    pub external_links: usize,
}

/// Mutable state threaded through the builders of one conversion call.
///
/// A fresh session is created per call, so bookmark ids and numbering
/// instances always start from zero.
pub struct ConversionSession<'a> {
    anchors: AnchorMap,
    heading_cursor: usize,
    next_bookmark_id: usize,
    numberings: Vec<NumberingDefinition>,
    diagrams: HashMap<String, DiagramRecord>,
    images: Option<&'a dyn ImageSource>,
    limits: RasterLimits,
    pub warnings: Warnings,
    pub stats: Stats,
}

impl<'a> ConversionSession<'a> {
    #[must_use]
    pub fn new(anchors: AnchorMap) -> Self {
        Self {
            anchors,
            heading_cursor: 0,
            next_bookmark_id: 0,
            numberings: Vec::new(),
            diagrams: HashMap::new(),
            images: None,
            limits: RasterLimits::default(),
            warnings: Warnings::new(),
            stats: Stats::default(),
        }
    }

    #[must_use]
    pub fn with_diagrams(mut self, diagrams: HashMap<String, DiagramRecord>) -> Self {
        self.diagrams = diagrams;
        self
    }

    #[must_use]
    pub fn with_image_source(mut self, images: Option<&'a dyn ImageSource>) -> Self {
        self.images = images;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: RasterLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn anchors(&self) -> &AnchorMap {
        &self.anchors
    }

    #[must_use]
    pub fn limits(&self) -> RasterLimits {
        self.limits
    }

    /// Anchor of the next heading in document order.
    pub fn next_heading(&mut self) -> Option<HeadingAnchor> {
        let anchor = self.anchors.get(self.heading_cursor).cloned();
        self.heading_cursor += 1;
        anchor
    }

    /// Realign the heading cursor after a skipped element.
    pub fn set_heading_cursor(&mut self, position: usize) {
        self.heading_cursor = position;
    }

    pub fn next_bookmark_id(&mut self) -> usize {
        let id = self.next_bookmark_id;
        self.next_bookmark_id += 1;
        id
    }

    /// Register a new list instance and return its numbering id.
    pub fn new_numbering(&mut self, ordered: bool) -> usize {
        let id = self.numberings.len() + 1;
        self.numberings.push(NumberingDefinition { id, ordered });
        id
    }

    #[must_use]
    pub fn diagram(&self, id: &str) -> Option<&DiagramRecord> {
        self.diagrams.get(id)
    }

    pub fn load_image(&self, src: &str) -> Option<Vec<u8>> {
        self.images.and_then(|images| images.load(src))
    }

    /// Bookmark name for an internal link fragment.
    ///
    /// Unknown fragments still produce a sanitized target and a warning.
    /// `None` when the fragment has no usable bookmark characters; the
    /// link is then kept as text.
    pub fn resolve_internal(&mut self, fragment: &str) -> Option<String> {
        if let Some(anchor) = self.anchors.resolve(fragment) {
            return Some(anchor.bookmark.clone());
        }
        let name = bookmark_name(&slugify(fragment));
        let message = match name {
            Some(_) => format!("no heading matches #{fragment}"),
            None => format!("no heading matches #{fragment}, link kept as text"),
        };
        self.warnings
            .push(ConversionWarning::new(WarningCode::UnresolvedLink, message));
        name
    }

    pub fn warn(&mut self, code: WarningCode, message: impl Into<String>) {
        self.warnings.warn(code, message);
    }

    pub fn into_parts(self) -> (Vec<NumberingDefinition>, Warnings, Stats) {
        (self.numberings, self.warnings, self.stats)
    }
}
