//! Anchors and links shared by both conversion directions.
//!
//! Markup anchors and document bookmarks must agree no matter which way a
//! document travels, so every heading identifier in the workspace comes
//! from [`slugify`] and every bookmark name from [`bookmark_name`].
//!
//! - [`AnchorMap`]: unique heading slugs for one conversion pass
//! - [`LinkKind`]: internal / external / reference / image classification
//! - [`TocEntry`]: table of contents built from the anchor map

mod anchor_map;
mod link;
mod slug;

pub use anchor_map::{AnchorMap, HeadingAnchor, TocEntry};
pub use link::{LinkKind, fragment_to_slug};
pub use slug::{MAX_BOOKMARK_LEN, bookmark_name, slugify};
