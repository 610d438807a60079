//! Loosely typed element tree shared by every pipeline stage.

use std::collections::HashMap;

/// Element in an extracted document tree.
///
/// Text follows the XML model: `text` is the content before the first
/// child, `tail` the content after this element's end tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Tag name, lowercase for HTML, prefixed (`w:p`) for OOXML.
    pub tag: String,
    pub text: String,
    pub tail: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Tag without namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.tag.rsplit_once(':').map_or(&self.tag, |(_, local)| local)
    }

    #[must_use]
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// First direct child with `tag`.
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Direct children with `tag`.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// First descendant with `tag`, depth first.
    #[must_use]
    pub fn find(&self, tag: &str) -> Option<&Node> {
        self.children
            .iter()
            .find_map(|c| if c.tag == tag { Some(c) } else { c.find(tag) })
    }

    /// Whether any descendant has one of `tags`.
    #[must_use]
    pub fn contains_any(&self, tags: &[&str]) -> bool {
        self.children
            .iter()
            .any(|c| tags.contains(&c.tag.as_str()) || c.contains_any(tags))
    }

    /// Text of this element and its descendants, without its own tail.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            if child.tag == "br" {
                out.push('\n');
            }
            child.collect_text(out);
            out.push_str(&child.tail);
        }
    }

    /// Append text after the last child, or to `text` when childless.
    pub fn append_text(&mut self, text: &str) {
        match self.children.last_mut() {
            Some(last) => last.tail.push_str(text),
            None => self.text.push_str(text),
        }
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Remove child `index` but keep its tail text in place.
    pub fn remove_child(&mut self, index: usize) -> Node {
        let mut removed = self.children.remove(index);
        let tail = std::mem::take(&mut removed.tail);
        self.insert_text_before(index, &tail);
        removed
    }

    /// Replace child `index` by its content, keeping text order.
    pub fn unwrap_child(&mut self, index: usize) {
        let mut child = self.children.remove(index);
        self.insert_text_before(index, &child.text);

        let inserted = child.children.len();
        let mut grandchildren = std::mem::take(&mut child.children);
        if let Some(last) = grandchildren.last_mut() {
            last.tail.push_str(&child.tail);
        }
        self.children.splice(index..index, grandchildren);
        if inserted == 0 {
            self.insert_text_before(index, &child.tail);
        }
    }

    /// Append `text` where it reads just before child `index`.
    fn insert_text_before(&mut self, index: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        if index == 0 {
            self.text.push_str(text);
        } else {
            self.children[index - 1].tail.push_str(text);
        }
    }

    /// Whether the element has no text and no children that carry content.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
            && self.children.iter().all(|c| {
                c.tail.trim().is_empty()
                    && !matches!(c.tag.as_str(), "img" | "br" | "hr")
                    && c.is_blank()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph() -> Node {
        Node::new("p").with_text("a ").with_children(vec![
            Node::new("span")
                .with_text("b ")
                .with_children(vec![Node::new("strong").with_text("c").with_tail(" d")])
                .with_tail(" e"),
        ])
    }

    #[test]
    fn test_text_content() {
        assert_eq!(paragraph().text_content(), "a b c d e");
        let with_break = Node::new("p")
            .with_text("x")
            .with_children(vec![Node::new("br").with_tail("y")]);
        assert_eq!(with_break.text_content(), "x\ny");
    }

    #[test]
    fn test_unwrap_child_keeps_order() {
        let mut p = paragraph();
        p.unwrap_child(0);
        assert_eq!(p.text, "a b ");
        assert_eq!(p.children.len(), 1);
        assert_eq!(p.children[0].tag, "strong");
        assert_eq!(p.children[0].tail, " d e");
        assert_eq!(p.text_content(), "a b c d e");
    }

    #[test]
    fn test_unwrap_childless() {
        let mut p = Node::new("p")
            .with_text("x")
            .with_children(vec![Node::new("span").with_text("y").with_tail("z")]);
        p.unwrap_child(0);
        assert_eq!(p.text, "xyz");
        assert!(p.children.is_empty());
    }

    #[test]
    fn test_remove_child_keeps_tail() {
        let mut p = Node::new("p").with_text("a").with_children(vec![
            Node::new("b").with_text("x").with_tail("c"),
            Node::new("i").with_text("y").with_tail("d"),
        ]);
        p.remove_child(1);
        assert_eq!(p.text_content(), "axcd");
        p.remove_child(0);
        assert_eq!(p.text, "acd");
    }

    #[test]
    fn test_is_blank() {
        assert!(Node::new("p").with_text(" \n").is_blank());
        assert!(Node::new("p").with_children(vec![Node::new("span")]).is_blank());
        assert!(!Node::new("p").with_children(vec![Node::new("img")]).is_blank());
        assert!(!paragraph().is_blank());
    }

    #[test]
    fn test_local_name() {
        assert_eq!(Node::new("w:p").local_name(), "p");
        assert_eq!(Node::new("td").local_name(), "td");
    }
}
