//! List reconstruction from flat paragraphs.
//!
//! Word processors often export list items as ordinary paragraphs that
//! carry a literal marker (`•`, `1.`, `a)`) and a left margin. Runs of two
//! or more such paragraphs are rebuilt into nested `ul`/`ol` elements: the
//! nesting level comes from the margin (one level per
//! [`ListIndentConfig::unit_pt`]) plus leading non-breaking spaces (one
//! level per [`ListIndentConfig::nbsp_per_level`]).

use std::sync::LazyLock;

use mdocx_config::ListIndentConfig;
use regex::Regex;

use crate::cleanup::declarations;
use crate::node::Node;

const BULLETS: &[char] = &[
    '•', '·', '◦', '○', '▪', '▫', '■', '□', '◆', '◇', '‣', '⁃', '–', '-', '*',
];
const UNCHECKED: char = '☐';
const CHECKED: char = '☒';

static ORDERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)*|[a-zA-Z]+)[.)]\s+").expect("invalid ordered marker regex")
});

static ROMAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^m{0,3}(?:cm|cd|d?c{0,3})(?:xc|xl|l?x{0,3})(?:ix|iv|v?i{0,3})$")
        .expect("invalid roman numeral regex")
});

/// Elements whose content is never reconstructed.
const OPAQUE: &[&str] = &["li", "ul", "ol", "pre", "code"];

/// Rebuild lists under `root` in place.
pub fn reconstruct(root: &mut Node, config: ListIndentConfig) {
    if OPAQUE.contains(&root.tag.as_str()) {
        return;
    }
    for child in &mut root.children {
        reconstruct(child, config);
    }

    let mut i = 0;
    while i < root.children.len() {
        let run = run_length(&root.children[i..], config);
        if run < 2 {
            i += 1;
            continue;
        }
        let paragraphs: Vec<Node> = root.children.drain(i..i + run).collect();
        let lists = build(paragraphs, config);
        let inserted = lists.len();
        for (offset, list) in lists.into_iter().enumerate() {
            root.children.insert(i + offset, list);
        }
        i += inserted;
    }
}

/// Number of consecutive list-like paragraphs at the start of `nodes`.
fn run_length(nodes: &[Node], config: ListIndentConfig) -> usize {
    let mut count = 0;
    for node in nodes {
        if node.tag != "p" || detect(node, config).is_none() {
            break;
        }
        count += 1;
        if !node.tail.trim().is_empty() {
            break;
        }
    }
    count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Unchecked,
    Checked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Marker {
    level: usize,
    ordered: bool,
    /// Leading characters to strip, including whitespace after the marker.
    len: usize,
    start: Option<u32>,
    task: Option<Task>,
}

fn detect(p: &Node, config: ListIndentConfig) -> Option<Marker> {
    let text = flat_text(p);
    let after_space = text.trim_start_matches(|c: char| c == '\u{a0}' || c.is_whitespace());
    let indent_len = text.len() - after_space.len();
    let nbsp = text[..indent_len].chars().filter(|&c| c == '\u{a0}').count();

    let ordered = ORDERED_RE
        .captures(after_space)
        .filter(|caps| is_ordered_marker(&caps[1]));
    let (ordered, marker_len, start, task) = if let Some(caps) = ordered {
        (true, caps[0].len(), caps[1].parse::<u32>().ok(), None)
    } else {
        let first = after_space.chars().next()?;
        let rest = &after_space[first.len_utf8()..];
        let body = rest.trim_start();
        let is_bullet = BULLETS.contains(&first) || first == UNCHECKED || first == CHECKED;
        // A marker is followed by whitespace.
        if !is_bullet || rest.len() == body.len() {
            return None;
        }
        let task = match first {
            UNCHECKED => Some(Task::Unchecked),
            CHECKED => Some(Task::Checked),
            _ => None,
        };
        (false, after_space.len() - body.len(), None, task)
    };
    if text[indent_len + marker_len..].trim().is_empty() {
        return None;
    }

    let margin_levels = margin_pt(p)
        .filter(|_| config.unit_pt > 0.0)
        .map_or(0, |pt| levels(pt / config.unit_pt));
    let nbsp_levels = nbsp.checked_div(config.nbsp_per_level).unwrap_or(0);
    Some(Marker {
        level: margin_levels + nbsp_levels,
        ordered,
        len: indent_len + marker_len,
        start,
        task,
    })
}

/// Numbers (`1`, `2.1`), letters (`a`, `aa`) and roman numerals in one case.
fn is_ordered_marker(marker: &str) -> bool {
    if marker.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    let one_case = marker.chars().all(|c| c.is_ascii_lowercase())
        || marker.chars().all(|c| c.is_ascii_uppercase());
    if !one_case {
        return false;
    }
    let mut chars = marker.chars();
    let first = chars.next();
    (marker.len() <= 3 && chars.all(|c| Some(c) == first)) || ROMAN_RE.is_match(marker)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn levels(ratio: f32) -> usize {
    ratio.round().max(0.0) as usize
}

/// Text and tails in document order, without line break markers.
fn flat_text(node: &Node) -> String {
    let mut out = node.text.clone();
    for child in &node.children {
        out.push_str(&flat_text(child));
        out.push_str(&child.tail);
    }
    out
}

/// Remove the first `len` bytes of [`flat_text`]; returns what is left over.
fn strip_leading(node: &mut Node, mut len: usize) -> usize {
    let take = len.min(node.text.len());
    node.text.drain(..take);
    len -= take;
    for child in &mut node.children {
        if len == 0 {
            break;
        }
        len = strip_leading(child, len);
        let take = len.min(child.tail.len());
        child.tail.drain(..take);
        len -= take;
    }
    len
}

/// Left margin in points from an inline style.
fn margin_pt(p: &Node) -> Option<f32> {
    let style = p.attr("style")?;
    let (_, value) = declarations(style)
        .find(|(name, _)| matches!(*name, "margin-left" | "padding-left" | "margin-inline-start"))?;
    let value = value.trim();
    if let Some(pt) = value.strip_suffix("pt") {
        pt.trim().parse().ok()
    } else if let Some(px) = value.strip_suffix("px") {
        px.trim().parse::<f32>().ok().map(|px| px * 0.75)
    } else if let Some(inches) = value.strip_suffix("in") {
        inches.trim().parse::<f32>().ok().map(|i| i * 72.0)
    } else if let Some(cm) = value.strip_suffix("cm") {
        cm.trim().parse::<f32>().ok().map(|cm| cm * 72.0 / 2.54)
    } else {
        None
    }
}

struct OpenList {
    level: usize,
    ordered: bool,
    node: Node,
}

/// Build nested lists from a run of marked paragraphs.
fn build(paragraphs: Vec<Node>, config: ListIndentConfig) -> Vec<Node> {
    let mut items = Vec::with_capacity(paragraphs.len());
    for mut p in paragraphs {
        let Some(marker) = detect(&p, config) else {
            continue;
        };
        strip_leading(&mut p, marker.len);
        drop_empty_wrappers(&mut p);
        items.push((marker, p));
    }
    let base = items.iter().map(|(m, _)| m.level).min().unwrap_or(0);

    let mut out = Vec::new();
    let mut stack: Vec<OpenList> = Vec::new();
    let mut trailing = String::new();

    for (marker, mut p) in items {
        let level = marker.level - base;
        trailing = std::mem::take(&mut p.tail);

        while stack.last().is_some_and(|top| top.level > level) {
            close(&mut stack, &mut out);
        }
        if stack
            .last()
            .is_some_and(|top| top.level == level && top.ordered != marker.ordered)
        {
            close(&mut stack, &mut out);
        }
        if stack.last().is_none_or(|top| top.level < level) {
            let mut node = Node::new(if marker.ordered { "ol" } else { "ul" });
            if let Some(start) = marker.start.filter(|&s| s != 1) {
                node.attrs.insert("start".to_owned(), start.to_string());
            }
            stack.push(OpenList {
                level,
                ordered: marker.ordered,
                node,
            });
        }

        let mut item = Node {
            tag: "li".to_owned(),
            text: p.text.trim_start().to_owned(),
            children: p.children,
            ..Node::default()
        };
        match marker.task {
            Some(Task::Checked) => {
                item.attrs.insert("data-task".to_owned(), "checked".to_owned());
            }
            Some(Task::Unchecked) => {
                item.attrs.insert("data-task".to_owned(), "unchecked".to_owned());
            }
            None => {}
        }
        if let Some(top) = stack.last_mut() {
            top.node.push(item);
        }
    }
    while !stack.is_empty() {
        close(&mut stack, &mut out);
    }
    if let Some(last) = out.last_mut() {
        last.tail = trailing;
    }
    out
}

/// Remove inline wrappers left empty after stripping a marker.
fn drop_empty_wrappers(p: &mut Node) {
    let mut i = 0;
    while i < p.children.len() {
        let child = &p.children[i];
        if matches!(child.tag.as_str(), "span" | "font" | "strong" | "em") && child.is_blank() {
            p.remove_child(i);
        } else {
            i += 1;
        }
    }
}

/// Pop the innermost list into the last item of its parent, or into `out`.
fn close(stack: &mut Vec<OpenList>, out: &mut Vec<Node>) {
    let Some(list) = stack.pop() else {
        return;
    };
    match stack.last_mut().and_then(|parent| parent.node.children.last_mut()) {
        Some(item) => item.push(list.node),
        None => out.push(list.node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_html;
    use pretty_assertions::assert_eq;

    fn rebuilt(html: &str) -> Node {
        let mut root = parse_html(html).unwrap();
        reconstruct(&mut root, ListIndentConfig::default());
        root
    }

    #[test]
    fn test_three_levels_by_margin() {
        let root = rebuilt(
            r#"<p style="margin-left:18pt">• a</p><p style="margin-left:36pt">• b</p><p style="margin-left:54pt">• c</p>"#,
        );
        assert_eq!(root.children.len(), 1);
        let ul = &root.children[0];
        assert_eq!(ul.tag, "ul");
        let a = &ul.children[0];
        assert_eq!(a.text, "a");
        let b = &a.children[0].children[0];
        assert_eq!(b.text, "b");
        let c = &b.children[0].children[0];
        assert_eq!(c.text, "c");
    }

    #[test]
    fn test_levels_by_nbsp() {
        let root = rebuilt("<p>1. one</p><p>\u{a0}\u{a0}\u{a0}\u{a0}a) sub</p><p>2. two</p>");
        let ol = &root.children[0];
        assert_eq!(ol.tag, "ol");
        assert_eq!(ol.children.len(), 2);
        assert_eq!(ol.children[0].children[0].tag, "ol");
        assert_eq!(ol.children[0].children[0].children[0].text, "sub");
        assert_eq!(ol.children[1].text, "two");
    }

    #[test]
    fn test_single_paragraph_left_alone() {
        let root = rebuilt("<p>1. Only one</p><p>Plain</p>");
        assert_eq!(root.children[0].tag, "p");
    }

    #[test]
    fn test_type_change_at_same_level() {
        let root = rebuilt("<p>• a</p><p>• b</p><p>1. c</p><p>2. d</p>");
        let tags: Vec<&str> = root.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, ["ul", "ol"]);
    }

    #[test]
    fn test_marker_inside_inline_wrapper() {
        let root = rebuilt("<p><span>• </span>first</p><p><span>• second</span></p>");
        let ul = &root.children[0];
        assert_eq!(ul.tag, "ul");
        assert_eq!(ul.children[0].text_content(), "first");
        assert_eq!(ul.children[1].text_content(), "second");
    }

    #[test]
    fn test_task_items() {
        let root = rebuilt("<p>\u{2610} todo</p><p>\u{2612} done</p>");
        let ul = &root.children[0];
        assert_eq!(ul.children[0].attr("data-task"), Some("unchecked"));
        assert_eq!(ul.children[1].attr("data-task"), Some("checked"));
        assert_eq!(ul.children[1].text, "done");
    }

    #[test]
    fn test_ordered_start_kept() {
        let root = rebuilt("<p>3. c</p><p>4. d</p>");
        assert_eq!(root.children[0].attr("start"), Some("3"));
    }

    #[test]
    fn test_existing_list_items_untouched() {
        let root = rebuilt("<ul><li><p>• a</p><p>• b</p></li></ul>");
        let li = &root.children[0].children[0];
        assert_eq!(li.children[0].tag, "p");
    }

    #[test]
    fn test_ordered_marker_forms() {
        for marker in ["1", "2.1", "a", "B", "aa", "iv", "XII", "mcm"] {
            assert!(is_ordered_marker(marker), "{marker}");
        }
        for marker in ["did", "No", "ab", "Iv", "iiii", "vx"] {
            assert!(!is_ordered_marker(marker), "{marker}");
        }
    }

    #[test]
    fn test_words_ending_sentences_are_not_markers() {
        let root = rebuilt("<p>Did. it work</p><p>did. it again</p>");
        let tags: Vec<&str> = root.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, ["p", "p"]);

        let root = rebuilt("<p>aa. first</p><p>bb. second</p>");
        assert_eq!(root.children[0].tag, "ol");
        assert_eq!(root.children[0].children[1].text, "second");
    }

    #[test]
    fn test_hyphenated_text_is_not_a_marker() {
        let config = ListIndentConfig::default();
        assert!(detect(&Node::new("p").with_text("-dash"), config).is_none());
        assert!(detect(&Node::new("p").with_text("\u{2022}"), config).is_none());
        assert!(detect(&Node::new("p").with_text("Plain text"), config).is_none());
    }
}
