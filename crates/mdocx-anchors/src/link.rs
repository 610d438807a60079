//! Link classification.

use crate::slug::slugify;

const EXTERNAL_SCHEMES: &[&str] = &["http://", "https://", "mailto:", "ftp://"];
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".bmp"];

/// What a link target points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// Heading in the same document; holds the fragment without `#`.
    Internal(String),
    /// URL with an external scheme.
    External(String),
    /// Relative path to another document, with an optional fragment.
    Reference {
        path: String,
        fragment: Option<String>,
    },
    /// Image file or `data:image/` URI.
    Image(String),
}

impl LinkKind {
    /// Classify a link target.
    #[must_use]
    pub fn classify(href: &str) -> Self {
        let href = href.trim();
        if let Some(fragment) = href.strip_prefix('#') {
            return Self::Internal(fragment.to_owned());
        }
        let lower = href.to_ascii_lowercase();
        if EXTERNAL_SCHEMES.iter().any(|s| lower.starts_with(s)) {
            return Self::External(href.to_owned());
        }
        if lower.starts_with("data:image/") {
            return Self::Image(href.to_owned());
        }
        let (path, fragment) = match href.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment.to_owned())),
            None => (href, None),
        };
        let path_lower = path.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| path_lower.ends_with(ext)) {
            return Self::Image(href.to_owned());
        }
        Self::Reference {
            path: path.to_owned(),
            fragment,
        }
    }

    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

/// Turn a document link fragment back into a markup slug.
///
/// Bookmark-style fragments (`_Intro_Section`) lose their leading
/// underscores and use hyphens between words.
#[must_use]
pub fn fragment_to_slug(fragment: &str) -> String {
    let cleaned = fragment
        .trim_start_matches('#')
        .trim_start_matches('_')
        .replace('_', "-");
    slugify(&cleaned)
}
