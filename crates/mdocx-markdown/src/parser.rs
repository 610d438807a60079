//! Lenient XML/HTML parser producing a [`Node`] tree.
//!
//! Mismatched end tags close every element up to the matching open one;
//! stray end tags are ignored. In HTML mode tag names are lowercased and
//! void elements (`<br>`, `<img>`, ...) never take children.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::entities::{convert_html_entities, decode_entity};
use crate::error::ExtractError;
use crate::node::Node;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Xml,
    Html,
}

/// Parse an XML part (e.g. `word/document.xml`) under a `root` node.
pub fn parse_xml(xml: &str) -> Result<Node, ExtractError> {
    parse(xml, Mode::Xml)
}

/// Parse (X)HTML under a `root` node.
pub fn parse_html(html: &str) -> Result<Node, ExtractError> {
    parse(&convert_html_entities(html), Mode::Html)
}

fn parse(input: &str, mode: Mode) -> Result<Node, ExtractError> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut stack = vec![Node::new("root")];
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let node = element(&reader, &e, mode);
                if mode == Mode::Html && VOID_ELEMENTS.contains(&node.tag.as_str()) {
                    attach(&mut stack, node);
                } else {
                    stack.push(node);
                }
            }
            Event::Empty(e) => {
                let node = element(&reader, &e, mode);
                attach(&mut stack, node);
            }
            Event::End(e) => {
                let name = tag_name(&reader, e.name().as_ref(), mode);
                if let Some(pos) = stack.iter().rposition(|n| n.tag == name)
                    && pos > 0
                {
                    close_to(&mut stack, pos);
                }
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                append_text(&mut stack, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                append_text(&mut stack, &decode_entity(&entity));
            }
            Event::CData(e) => {
                append_text(&mut stack, &String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    close_to(&mut stack, 1);
    Ok(stack.pop().unwrap_or_default())
}

/// Pop and attach every open element at `depth` and above.
fn close_to(stack: &mut Vec<Node>, depth: usize) {
    while stack.len() > depth {
        if let Some(node) = stack.pop() {
            attach(stack, node);
        }
    }
}

fn attach(stack: &mut [Node], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.push(node);
    }
}

fn append_text(stack: &mut [Node], text: &str) {
    if let Some(node) = stack.last_mut() {
        node.append_text(text);
    }
}

fn element(reader: &Reader<&[u8]>, e: &BytesStart<'_>, mode: Mode) -> Node {
    let mut node = Node::new(tag_name(reader, e.name().as_ref(), mode));
    let attributes = match mode {
        Mode::Xml => e.attributes(),
        Mode::Html => e.html_attributes(),
    };
    for attr in attributes.flatten() {
        let key = reader.decoder().decode(attr.key.as_ref()).map_or_else(
            |_| String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            std::borrow::Cow::into_owned,
        );
        if key.starts_with("xmlns") {
            continue;
        }
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );
        let key = if mode == Mode::Html {
            key.to_ascii_lowercase()
        } else {
            key
        };
        node.attrs.insert(key, value);
    }
    node
}

fn tag_name(reader: &Reader<&[u8]>, name: &[u8], mode: Mode) -> String {
    let name = reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        std::borrow::Cow::into_owned,
    );
    match mode {
        Mode::Xml => name,
        Mode::Html => name.to_ascii_lowercase(),
    }
}
