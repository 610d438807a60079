//! HTML cleanup before structure reconstruction.
//!
//! Vendor markup from word processors is removed, presentational styles
//! are rewritten as semantic inline tags and whitespace is collapsed the
//! way a browser would render it.

use crate::node::Node;

/// Elements removed together with their content.
const DROPPED: &[&str] = &["head", "meta", "script", "style", "title", "xml", "link"];

/// Elements replaced by their content.
const UNWRAPPED: &[&str] = &["html", "body", "div", "section", "article", "main", "center"];

/// Inline elements merged when adjacent.
const MERGEABLE: &[&str] = &["strong", "em", "s", "u", "sup", "sub", "code"];

/// Normalize a parsed tree in place.
pub fn clean(root: &mut Node) {
    clean_node(root, false);
}

fn clean_node(node: &mut Node, in_pre: bool) {
    let in_pre = in_pre || node.tag == "pre";
    for child in &mut node.children {
        clean_node(child, in_pre);
    }

    let mut i = 0;
    while i < node.children.len() {
        let child = &mut node.children[i];
        if DROPPED.contains(&child.tag.as_str()) {
            node.remove_child(i);
            continue;
        }
        if child.tag.contains(':') {
            node.unwrap_child(i);
            continue;
        }

        strip_attributes(child);
        rename(child);
        apply_inline_styles(child);

        let child = &node.children[i];
        let unwrap = UNWRAPPED.contains(&child.tag.as_str())
            || (matches!(child.tag.as_str(), "span" | "font") && child.attrs.is_empty());
        if unwrap {
            node.unwrap_child(i);
            continue;
        }
        if child.tag == "p" && child.is_blank() && !in_pre {
            node.remove_child(i);
            continue;
        }
        i += 1;
    }

    merge_adjacent(node);
    if !in_pre {
        collapse_whitespace(node);
    }
}

fn strip_attributes(node: &mut Node) {
    // Code elements keep `class` for `language-*` hints.
    let keep_class = matches!(node.tag.as_str(), "pre" | "code");
    node.attrs.retain(|key, _| {
        (key != "class" || keep_class) && key != "lang" && !key.contains(':')
    });
    if let Some(style) = node.attrs.get("style") {
        let style = declarations(style)
            .filter(|(name, _)| !name.starts_with("mso-"))
            .map(|(name, value)| format!("{name}:{value}"))
            .collect::<Vec<_>>()
            .join(";");
        set_style(node, style);
    }
}

fn rename(node: &mut Node) {
    let tag = match node.tag.as_str() {
        "b" => "strong",
        "i" => "em",
        "strike" | "del" => "s",
        "ins" => "u",
        _ => return,
    };
    node.tag = tag.to_owned();
}

/// Rewrite `style` declarations on inline wrappers as nested semantic tags.
fn apply_inline_styles(node: &mut Node) {
    if !matches!(node.tag.as_str(), "span" | "font") {
        return;
    }
    let Some(style) = node.attrs.get("style") else {
        return;
    };

    let mut wrappers = Vec::new();
    let mut rest = Vec::new();
    for (name, value) in declarations(style) {
        let value = value.to_ascii_lowercase();
        let tag = match name {
            "text-decoration" | "text-decoration-line" if value.contains("underline") => Some("u"),
            "text-decoration" | "text-decoration-line" if value.contains("line-through") => {
                Some("s")
            }
            "vertical-align" if value == "super" => Some("sup"),
            "vertical-align" if value == "sub" => Some("sub"),
            "font-weight" if is_bold_weight(&value) => Some("strong"),
            "font-style" if value == "italic" => Some("em"),
            _ => None,
        };
        match tag {
            Some(tag) => wrappers.push(tag),
            None => rest.push(format!("{name}:{value}")),
        }
    }
    if wrappers.is_empty() {
        return;
    }

    let mut inner = Node {
        tag: wrappers.remove(0).to_owned(),
        text: std::mem::take(&mut node.text),
        tail: String::new(),
        attrs: std::collections::HashMap::new(),
        children: std::mem::take(&mut node.children),
    };
    for tag in wrappers {
        inner = Node::new(tag).with_children(vec![inner]);
    }
    node.children = vec![inner];
    set_style(node, rest.join(";"));
}

fn is_bold_weight(value: &str) -> bool {
    value == "bold" || value == "bolder" || value.parse::<u32>().is_ok_and(|w| w >= 600)
}

fn set_style(node: &mut Node, style: String) {
    if style.is_empty() {
        node.attrs.remove("style");
    } else {
        node.attrs.insert("style".to_owned(), style);
    }
}

/// `name: value` pairs of a style attribute.
pub(crate) fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        let name = name.trim();
        let value = value.trim();
        (!name.is_empty()).then_some((name, value))
    })
}

/// Merge `<strong>a</strong><strong>b</strong>` into one element.
fn merge_adjacent(node: &mut Node) {
    let mut i = 1;
    while i < node.children.len() {
        let prev = &node.children[i - 1];
        let current = &node.children[i];
        if MERGEABLE.contains(&prev.tag.as_str())
            && prev.tag == current.tag
            && prev.attrs == current.attrs
            && prev.tail.is_empty()
        {
            let current = node.children.remove(i);
            let prev = &mut node.children[i - 1];
            prev.append_text(&current.text);
            prev.children.extend(current.children);
            prev.tail = current.tail;
        } else {
            i += 1;
        }
    }
}

fn collapse_whitespace(node: &mut Node) {
    node.text = collapse(&node.text);
    for child in &mut node.children {
        child.tail = collapse(&child.tail);
    }
}

/// Collapse runs of ASCII whitespace to one space; non-breaking spaces stay.
fn collapse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
