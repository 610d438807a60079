//! List markers from `word/numbering.xml`.
//!
//! Numbered paragraphs are flattened to plain paragraphs carrying a literal
//! marker; list reconstruction restores the nesting afterwards.

use std::collections::HashMap;

use crate::node::Node;

const DEFAULT_BULLET: &str = "\u{2022}";

#[derive(Debug, Clone, PartialEq, Eq)]
struct LevelFormat {
    format: String,
    text: String,
    start: u32,
}

impl Default for LevelFormat {
    fn default() -> Self {
        Self {
            format: "bullet".to_owned(),
            text: DEFAULT_BULLET.to_owned(),
            start: 1,
        }
    }
}

/// Numbering definitions plus running counters for one extraction.
#[derive(Debug, Default)]
pub(crate) struct Numbering {
    /// `w:num` id to abstract id.
    instances: HashMap<String, String>,
    /// Abstract id to level formats by `ilvl`.
    abstracts: HashMap<String, HashMap<usize, LevelFormat>>,
    counters: HashMap<String, Vec<u32>>,
}

impl Numbering {
    pub(crate) fn from_tree(root: &Node) -> Self {
        let mut numbering = Self::default();
        let Some(defs) = root.child("w:numbering") else {
            return numbering;
        };

        for abstract_num in defs.children_named("w:abstractNum") {
            let Some(id) = abstract_num.attr("w:abstractNumId") else {
                continue;
            };
            let mut levels = HashMap::new();
            for level in abstract_num.children_named("w:lvl") {
                let ilvl = level
                    .attr("w:ilvl")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                let val = |tag: &str| level.child(tag).and_then(|n| n.attr("w:val"));
                levels.insert(
                    ilvl,
                    LevelFormat {
                        format: val("w:numFmt").unwrap_or("decimal").to_owned(),
                        text: val("w:lvlText").unwrap_or_default().to_owned(),
                        start: val("w:start").and_then(|v| v.parse().ok()).unwrap_or(1),
                    },
                );
            }
            numbering.abstracts.insert(id.to_owned(), levels);
        }

        for num in defs.children_named("w:num") {
            if let (Some(id), Some(abstract_id)) = (
                num.attr("w:numId"),
                num.child("w:abstractNumId").and_then(|n| n.attr("w:val")),
            ) {
                numbering
                    .instances
                    .insert(id.to_owned(), abstract_id.to_owned());
            }
        }
        numbering
    }

    fn level(&self, num_id: &str, ilvl: usize) -> LevelFormat {
        self.instances
            .get(num_id)
            .and_then(|a| self.abstracts.get(a))
            .and_then(|levels| levels.get(&ilvl))
            .cloned()
            .unwrap_or_default()
    }

    /// Marker text for the next paragraph of list `num_id` at `ilvl`.
    ///
    /// Returns `None` for `numId` 0 (numbering removed) and `none` formats.
    pub(crate) fn next_marker(&mut self, num_id: &str, ilvl: usize) -> Option<String> {
        if num_id == "0" {
            return None;
        }
        let level = self.level(num_id, ilvl);
        if level.format == "none" {
            return None;
        }
        if level.format == "bullet" {
            return Some(bullet_glyph(&level.text).to_owned());
        }

        let formats: Vec<LevelFormat> = (0..=ilvl).map(|l| self.level(num_id, l)).collect();
        let counters = self.counters.entry(num_id.to_owned()).or_default();
        if counters.len() <= ilvl {
            counters.resize(ilvl + 1, 0);
        }
        counters.truncate(ilvl + 1);
        counters[ilvl] = if counters[ilvl] == 0 {
            level.start
        } else {
            counters[ilvl] + 1
        };

        let mut text = if level.text.is_empty() {
            format!("%{}.", ilvl + 1)
        } else {
            level.text.clone()
        };
        for (l, format) in formats.iter().enumerate() {
            let value = counters.get(l).copied().filter(|&v| v > 0).unwrap_or(format.start);
            text = text.replace(&format!("%{}", l + 1), &format_number(value, &format.format));
        }
        Some(text)
    }
}

/// Printable glyph for a bullet level text; symbol-font code points map to `•`.
fn bullet_glyph(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !('\u{e000}'..='\u{f8ff}').contains(&c) && !c.is_alphanumeric() => text,
        (Some('o'), None) => "\u{25cb}",
        _ => DEFAULT_BULLET,
    }
}

fn format_number(value: u32, format: &str) -> String {
    match format {
        "lowerLetter" => letter(value).to_ascii_lowercase(),
        "upperLetter" => letter(value),
        "lowerRoman" => roman(value).to_ascii_lowercase(),
        "upperRoman" => roman(value),
        "decimalZero" => format!("{value:02}"),
        _ => value.to_string(),
    }
}

fn letter(value: u32) -> String {
    let index = value.saturating_sub(1);
    let c = char::from(b'A' + u8::try_from(index % 26).unwrap_or(0));
    c.to_string().repeat(usize::try_from(index / 26).unwrap_or(0) + 1)
}

fn roman(mut value: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (n, s) in TABLE {
        while value >= n {
            out.push_str(s);
            value -= n;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_xml;
    use pretty_assertions::assert_eq;

    const NUMBERING: &str = r#"<w:numbering>
        <w:abstractNum w:abstractNumId="1">
            <w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl>
            <w:lvl w:ilvl="1"><w:start w:val="1"/><w:numFmt w:val="lowerLetter"/><w:lvlText w:val="%2)"/></w:lvl>
        </w:abstractNum>
        <w:abstractNum w:abstractNumId="2">
            <w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/><w:lvlText w:val="&#61623;"/></w:lvl>
            <w:lvl w:ilvl="1"><w:numFmt w:val="bullet"/><w:lvlText w:val="&#9675;"/></w:lvl>
        </w:abstractNum>
        <w:num w:numId="1"><w:abstractNumId w:val="1"/></w:num>
        <w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
        <w:num w:numId="3"><w:abstractNumId w:val="2"/></w:num>
    </w:numbering>"#;

    fn numbering() -> Numbering {
        Numbering::from_tree(&parse_xml(NUMBERING).unwrap())
    }

    #[test]
    fn test_ordered_counters_per_instance() {
        let mut numbering = numbering();
        assert_eq!(numbering.next_marker("1", 0).as_deref(), Some("1."));
        assert_eq!(numbering.next_marker("1", 0).as_deref(), Some("2."));
        assert_eq!(numbering.next_marker("2", 0).as_deref(), Some("1."));
    }

    #[test]
    fn test_nested_level_restarts() {
        let mut numbering = numbering();
        numbering.next_marker("1", 0);
        assert_eq!(numbering.next_marker("1", 1).as_deref(), Some("a)"));
        assert_eq!(numbering.next_marker("1", 1).as_deref(), Some("b)"));
        assert_eq!(numbering.next_marker("1", 0).as_deref(), Some("2."));
        assert_eq!(numbering.next_marker("1", 1).as_deref(), Some("a)"));
    }

    #[test]
    fn test_bullets_normalize_symbol_font() {
        let mut numbering = numbering();
        assert_eq!(numbering.next_marker("3", 0).as_deref(), Some("\u{2022}"));
        assert_eq!(numbering.next_marker("3", 1).as_deref(), Some("\u{25cb}"));
    }

    #[test]
    fn test_removed_numbering() {
        assert_eq!(numbering().next_marker("0", 0), None);
    }

    #[test]
    fn test_number_formats() {
        assert_eq!(format_number(4, "lowerRoman"), "iv");
        assert_eq!(format_number(28, "upperLetter"), "BB");
        assert_eq!(format_number(3, "decimal"), "3");
    }
}
