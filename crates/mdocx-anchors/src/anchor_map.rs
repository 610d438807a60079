//! Unique heading anchors for one conversion pass.

use std::collections::{HashMap, HashSet};

use crate::slug::{MAX_BOOKMARK_LEN, bookmark_name, slugify, truncate_bookmark};

/// Anchor assigned to one heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingAnchor {
    /// Heading level (1-6).
    pub level: u8,
    /// Visible heading text.
    pub text: String,
    /// Unique markup anchor.
    pub slug: String,
    /// Unique document bookmark name.
    pub bookmark: String,
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    /// Markup anchor (for `#slug` links).
    pub anchor: String,
    /// Bookmark name (for document cross-references).
    pub bookmark: String,
}

/// Heading slug registry.
///
/// Slugs are unique: a repeated slug gets a numeric suffix (`intro`,
/// `intro-1`, `intro-2`), skipping suffixes already taken by a literal
/// heading. Bookmark names are unique too, with `_<n>` suffixes kept inside
/// the length limit.
#[derive(Debug, Default)]
pub struct AnchorMap {
    entries: Vec<HeadingAnchor>,
    by_slug: HashMap<String, usize>,
    slug_counts: HashMap<String, usize>,
    bookmarks: HashSet<String>,
}

impl AnchorMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a heading and return its anchor.
    pub fn insert(&mut self, level: u8, text: &str) -> &HeadingAnchor {
        let slug = self.unique_slug(&slugify(text));
        let index = self.entries.len();
        let bookmark = self.unique_bookmark(&slug, index);

        self.by_slug.insert(slug.clone(), index);
        self.bookmarks.insert(bookmark.clone());
        self.entries.push(HeadingAnchor {
            level,
            text: text.trim().to_owned(),
            slug,
            bookmark,
        });
        &self.entries[index]
    }

    fn unique_slug(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        let count = self.slug_counts.entry(base.to_owned()).or_default();
        let mut n = *count;
        let mut candidate = match n {
            0 => base.to_owned(),
            n => format!("{base}-{n}"),
        };
        while self.by_slug.contains_key(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        *self.slug_counts.entry(base.to_owned()).or_default() = n + 1;
        candidate
    }

    fn unique_bookmark(&self, slug: &str, index: usize) -> String {
        let base = bookmark_name(slug).unwrap_or_else(|| format!("heading_{}", index + 1));
        if !self.bookmarks.contains(&base) {
            return base;
        }
        (2..)
            .map(|n| {
                let suffix = format!("_{n}");
                let stem = truncate_bookmark(&base, MAX_BOOKMARK_LEN - suffix.len());
                format!("{stem}{suffix}")
            })
            .find(|candidate| !self.bookmarks.contains(candidate))
            .unwrap_or(base)
    }

    /// Look up a link fragment (without `#`).
    ///
    /// Matches the exact slug first, then the slugified fragment, then a
    /// bookmark name.
    #[must_use]
    pub fn resolve(&self, fragment: &str) -> Option<&HeadingAnchor> {
        let fragment = fragment.trim_start_matches('#');
        if let Some(&i) = self.by_slug.get(fragment) {
            return self.entries.get(i);
        }
        if let Some(&i) = self.by_slug.get(&slugify(fragment)) {
            return self.entries.get(i);
        }
        self.entries.iter().find(|e| e.bookmark == fragment)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Anchors in document order.
    pub fn iter(&self) -> impl Iterator<Item = &HeadingAnchor> {
        self.entries.iter()
    }

    /// Anchor at position `index` (document order).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HeadingAnchor> {
        self.entries.get(index)
    }

    /// Table of contents for headings up to `max_level`.
    #[must_use]
    pub fn toc(&self, max_level: u8) -> Vec<TocEntry> {
        self.entries
            .iter()
            .filter(|e| e.level <= max_level)
            .map(|e| TocEntry {
                level: e.level,
                title: e.text.clone(),
                anchor: e.slug.clone(),
                bookmark: e.bookmark.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_assigns_slug_and_bookmark() {
        let mut map = AnchorMap::new();
        let anchor = map.insert(2, "Intro Section");
        assert_eq!(anchor.slug, "intro-section");
        assert_eq!(anchor.bookmark, "intro_section");
        assert_eq!(anchor.level, 2);
        assert_eq!(anchor.text, "Intro Section");
    }

    #[test]
    fn test_duplicate_headings_get_numeric_suffix() {
        let mut map = AnchorMap::new();
        let slugs: Vec<_> = ["Setup", "Setup", "Setup"]
            .iter()
            .map(|t| map.insert(2, t).slug.clone())
            .collect();
        assert_eq!(slugs, vec!["setup", "setup-1", "setup-2"]);
        let bookmarks: Vec<_> = map.iter().map(|a| a.bookmark.as_str()).collect();
        assert_eq!(bookmarks, vec!["setup", "setup_1", "setup_2"]);
    }

    #[test]
    fn test_suffix_skips_literal_heading() {
        let mut map = AnchorMap::new();
        map.insert(2, "Setup 1");
        map.insert(2, "Setup");
        let third = map.insert(2, "Setup").slug.clone();
        assert_eq!(third, "setup-2");
    }

    #[test]
    fn test_truncated_bookmarks_stay_unique() {
        let mut map = AnchorMap::new();
        let a = map
            .insert(1, "A heading whose slug is far longer than forty characters one")
            .bookmark
            .clone();
        let b = map
            .insert(1, "A heading whose slug is far longer than forty characters two")
            .bookmark
            .clone();
        assert_ne!(a, b);
        assert!(a.len() <= MAX_BOOKMARK_LEN);
        assert!(b.len() <= MAX_BOOKMARK_LEN);
        assert!(b.ends_with("_2"));
    }

    #[test]
    fn test_non_ascii_heading_gets_fallback_bookmark() {
        let mut map = AnchorMap::new();
        let anchor = map.insert(1, "概要");
        assert_eq!(anchor.slug, "概要");
        assert_eq!(anchor.bookmark, "heading_1");
    }

    #[test]
    fn test_empty_heading_text() {
        let mut map = AnchorMap::new();
        assert_eq!(map.insert(1, "!!!").slug, "section");
        assert_eq!(map.insert(1, "").slug, "section-1");
    }

    #[test]
    fn test_resolve_variants() {
        let mut map = AnchorMap::new();
        map.insert(2, "Intro Section");

        assert_eq!(map.resolve("intro-section").unwrap().text, "Intro Section");
        assert_eq!(map.resolve("#intro-section").unwrap().text, "Intro Section");
        assert_eq!(map.resolve("Intro_Section").unwrap().text, "Intro Section");
        assert_eq!(map.resolve("intro_section").unwrap().text, "Intro Section");
        assert!(map.resolve("missing").is_none());
    }

    #[test]
    fn test_toc_respects_max_level() {
        let mut map = AnchorMap::new();
        map.insert(1, "Guide");
        map.insert(2, "Install");
        map.insert(4, "Deep Detail");
        let toc = map.toc(3);
        assert_eq!(
            toc,
            vec![
                TocEntry {
                    level: 1,
                    title: "Guide".to_owned(),
                    anchor: "guide".to_owned(),
                    bookmark: "guide".to_owned(),
                },
                TocEntry {
                    level: 2,
                    title: "Install".to_owned(),
                    anchor: "install".to_owned(),
                    bookmark: "install".to_owned(),
                },
            ]
        );
    }
}
