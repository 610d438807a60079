//! Cleaned HTML tree to Markdown.
//!
//! Block elements become blocks separated by blank lines; inline content is
//! escaped so literal `*`, `_` and backticks survive. Tables are laid out
//! on a grid that honours `colspan`/`rowspan`, with spanned cells repeating
//! their text.

use std::sync::LazyLock;

use mdocx_anchors::{LinkKind, fragment_to_slug, slugify};
use regex::Regex;

use crate::cleanup::declarations;
use crate::error::TranscodeError;
use crate::node::Node;

/// Deepest element nesting accepted.
pub(crate) const MAX_DEPTH: usize = 512;

/// Largest `colspan`/`rowspan` honoured.
const MAX_SPAN: usize = 64;

/// Hard line break while inline content is assembled.
const BREAK: char = '\u{e000}';

const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "hr", "ul", "ol", "table",
    "div", "li", "dl", "figure",
];

static ORDERED_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([.)])(\s|$)").expect("invalid ordered start regex"));

/// Markdown plus the link counts seen while writing it.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Transcoded {
    pub markdown: String,
    pub internal_links: usize,
    pub external_links: usize,
}

/// Serialize a cleaned tree.
pub(crate) fn transcode(root: &Node, preserve_links: bool) -> Result<Transcoded, TranscodeError> {
    let mut transcoder = Transcoder {
        preserve_links,
        internal_links: 0,
        external_links: 0,
    };
    let blocks = transcoder.container(root, 0)?;
    Ok(Transcoded {
        markdown: blocks.join("\n\n"),
        internal_links: transcoder.internal_links,
        external_links: transcoder.external_links,
    })
}

struct Transcoder {
    preserve_links: bool,
    internal_links: usize,
    external_links: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Default)]
struct Cell {
    text: String,
    align: Option<Align>,
}

fn enter(depth: usize) -> Result<usize, TranscodeError> {
    if depth >= MAX_DEPTH {
        return Err(TranscodeError::DepthExceeded(MAX_DEPTH));
    }
    Ok(depth + 1)
}

impl Transcoder {
    /// Blocks of an element that may mix inline content and blocks.
    fn container(&mut self, node: &Node, depth: usize) -> Result<Vec<String>, TranscodeError> {
        let depth = enter(depth)?;
        let mut blocks = Vec::new();
        let mut inline = escape_text(&node.text);

        for child in &node.children {
            if BLOCK_TAGS.contains(&child.tag.as_str()) {
                push_paragraph(&mut blocks, &std::mem::take(&mut inline));
                if let Some(block) = self.block(child, depth)? {
                    blocks.push(block);
                }
            } else {
                inline.push_str(&self.inline(child, depth)?);
            }
            inline.push_str(&escape_text(&child.tail));
        }
        push_paragraph(&mut blocks, &inline);
        Ok(blocks)
    }

    fn block(&mut self, node: &Node, depth: usize) -> Result<Option<String>, TranscodeError> {
        let depth = enter(depth)?;
        let block = match node.tag.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = node.tag[1..].parse::<usize>().unwrap_or(1);
                let text = single_line(&self.inline_content(node, depth)?);
                (!text.is_empty()).then(|| format!("{} {text}", "#".repeat(level)))
            }
            "p" => {
                let text = paragraph(&self.inline_content(node, depth)?);
                (!text.is_empty()).then_some(text)
            }
            "pre" => Some(code_block(node)),
            "hr" => Some("---".to_owned()),
            "blockquote" => {
                let inner = self.container(node, depth)?.join("\n\n");
                (!inner.is_empty()).then(|| {
                    inner
                        .lines()
                        .map(|line| {
                            if line.is_empty() {
                                ">".to_owned()
                            } else {
                                format!("> {line}")
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
            }
            "ul" | "ol" => self.list(node, depth)?,
            "table" => self.table(node, depth)?,
            _ => {
                let inner = self.container(node, depth)?.join("\n\n");
                (!inner.is_empty()).then_some(inner)
            }
        };
        Ok(block)
    }

    fn inline_content(&mut self, node: &Node, depth: usize) -> Result<String, TranscodeError> {
        let mut out = escape_text(&node.text);
        for child in &node.children {
            out.push_str(&self.inline(child, depth)?);
            out.push_str(&escape_text(&child.tail));
        }
        Ok(out)
    }

    fn inline(&mut self, node: &Node, depth: usize) -> Result<String, TranscodeError> {
        let depth = enter(depth)?;
        let out = match node.tag.as_str() {
            "strong" => emphasis(&self.inline_content(node, depth)?, "**"),
            "em" => emphasis(&self.inline_content(node, depth)?, "*"),
            "s" => emphasis(&self.inline_content(node, depth)?, "~~"),
            tag @ ("u" | "sup" | "sub") => {
                let inner = self.inline_content(node, depth)?;
                if inner.trim().is_empty() {
                    inner
                } else {
                    format!("<{tag}>{inner}</{tag}>")
                }
            }
            "code" => code_span(&node.text_content()),
            "a" => self.link(node, depth)?,
            "img" => image(node),
            "br" => BREAK.to_string(),
            _ => self.inline_content(node, depth)?,
        };
        Ok(out)
    }

    fn link(&mut self, node: &Node, depth: usize) -> Result<String, TranscodeError> {
        let label = single_line(&self.inline_content(node, depth)?);
        let Some(href) = node.attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(label);
        };

        let link = match LinkKind::classify(href) {
            LinkKind::Internal(fragment) => {
                // Extracted ids are bookmark names, so the slug comes from
                // the visible text.
                let visible = node.text_content();
                let slug = if visible.trim().is_empty() {
                    fragment_to_slug(&fragment)
                } else {
                    slugify(&visible)
                };
                if slug.is_empty() {
                    return Ok(label);
                }
                self.internal_links += 1;
                let label = if label.is_empty() {
                    escape_text(&fragment)
                } else {
                    label
                };
                format!("[{label}](#{slug})")
            }
            LinkKind::External(url) => {
                if !self.preserve_links {
                    return Ok(label);
                }
                self.external_links += 1;
                let label = if label.is_empty() {
                    escape_text(&url)
                } else {
                    label
                };
                format!("[{label}]({})", destination(&url))
            }
            LinkKind::Reference { .. } | LinkKind::Image(_) => {
                let label = if label.is_empty() {
                    escape_text(href)
                } else {
                    label
                };
                format!("[{label}]({})", destination(href))
            }
        };
        Ok(link)
    }

    fn list(&mut self, list: &Node, depth: usize) -> Result<Option<String>, TranscodeError> {
        let ordered = list.tag == "ol";
        let mut number = list
            .attr("start")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);

        let mut items = Vec::new();
        for li in list.children_named("li") {
            let marker = if ordered {
                format!("{number}. ")
            } else {
                "- ".to_owned()
            };
            number += 1;
            let task = match li.attr("data-task") {
                Some("checked") => "[x] ",
                Some("unchecked") => "[ ] ",
                _ => "",
            };

            let body = self.container(li, depth)?.join("\n");
            let indent = " ".repeat(marker.len());
            let mut lines = body.lines();
            let mut item = format!("{marker}{task}{}", lines.next().unwrap_or_default());
            item.truncate(item.trim_end().len());
            for line in lines {
                item.push('\n');
                if !line.is_empty() {
                    item.push_str(&indent);
                    item.push_str(line);
                }
            }
            items.push(item);
        }
        Ok((!items.is_empty()).then(|| items.join("\n")))
    }

    fn table(&mut self, table: &Node, depth: usize) -> Result<Option<String>, TranscodeError> {
        let rows = table_rows(table);
        if rows.is_empty() {
            return Ok(None);
        }
        let has_header = rows[0].children.iter().any(|c| c.tag == "th");

        let mut grid: Vec<Vec<Option<Cell>>> = vec![Vec::new(); rows.len()];
        for (r, row) in rows.iter().enumerate() {
            let mut c = 0;
            for cell in row.children.iter().filter(|c| matches!(c.tag.as_str(), "td" | "th")) {
                while grid[r].get(c).is_some_and(Option::is_some) {
                    c += 1;
                }
                let value = Cell {
                    text: self.cell_text(cell, depth)?,
                    align: alignment(cell),
                };
                let colspan = span(cell, "colspan");
                let rowspan = span(cell, "rowspan").min(rows.len() - r);
                for spanned in &mut grid[r..r + rowspan] {
                    if spanned.len() < c + colspan {
                        spanned.resize(c + colspan, None);
                    }
                    for slot in &mut spanned[c..c + colspan] {
                        *slot = Some(value.clone());
                    }
                }
                c += colspan;
            }
        }

        let mut width = grid.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return Ok(None);
        }
        let mut cells: Vec<Vec<Cell>> = grid
            .into_iter()
            .map(|row| {
                let mut row: Vec<Cell> = row.into_iter().map(Option::unwrap_or_default).collect();
                row.resize(width, Cell::default());
                row
            })
            .collect();

        if width == 1
            && cells.len() >= 4
            && !has_header
            && let Some(columns) = reflow_columns(cells.len())
        {
            let flat: Vec<Cell> = cells.into_iter().flatten().collect();
            cells = flat.chunks(columns).map(<[Cell]>::to_vec).collect();
            width = columns;
        }

        let aligns: Vec<Option<Align>> = (0..width)
            .map(|col| cells.iter().find_map(|row| row[col].align))
            .collect();
        let mut lines = Vec::with_capacity(cells.len() + 1);
        for (i, row) in cells.iter().enumerate() {
            let texts: Vec<&str> = row.iter().map(|c| c.text.as_str()).collect();
            lines.push(format!("| {} |", texts.join(" | ")));
            if i == 0 {
                let separator: Vec<&str> = aligns
                    .iter()
                    .map(|a| match a {
                        Some(Align::Center) => ":---:",
                        Some(Align::Right) => "---:",
                        Some(Align::Left) | None => "---",
                    })
                    .collect();
                lines.push(format!("| {} |", separator.join(" | ")));
            }
        }
        Ok(Some(lines.join("\n")))
    }

    fn cell_text(&mut self, cell: &Node, depth: usize) -> Result<String, TranscodeError> {
        let text = self
            .container(cell, depth)?
            .join("<br>")
            .replace(BREAK, "<br>")
            .replace("\\\n", "<br>")
            .replace('\n', " ")
            .replace('|', "\\|");
        Ok(text.trim().to_owned())
    }
}

fn table_rows(table: &Node) -> Vec<&Node> {
    let mut rows = Vec::new();
    for child in &table.children {
        match child.tag.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(child.children_named("tr")),
            _ => {}
        }
    }
    rows
}

fn span(cell: &Node, attr: &str) -> usize {
    cell.attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

fn alignment(cell: &Node) -> Option<Align> {
    let value = cell
        .attr("style")
        .and_then(|style| declarations(style).find(|(name, _)| *name == "text-align"))
        .map(|(_, value)| value.to_ascii_lowercase())
        .or_else(|| cell.attr("align").map(str::to_ascii_lowercase))?;
    match value.as_str() {
        "center" => Some(Align::Center),
        "right" | "end" => Some(Align::Right),
        "left" | "start" => Some(Align::Left),
        _ => None,
    }
}

/// Column count for a single-column table of `rows` cells: the divisor
/// closest to the square root, `None` when no proper divisor exists.
fn reflow_columns(rows: usize) -> Option<usize> {
    #[allow(clippy::cast_precision_loss)]
    let root = (rows as f64).sqrt();
    (2..rows)
        .filter(|d| rows.is_multiple_of(*d))
        .min_by(|a, b| {
            #[allow(clippy::cast_precision_loss)]
            let (da, db) = ((*a as f64 - root).abs(), (*b as f64 - root).abs());
            da.total_cmp(&db)
        })
}

fn push_paragraph(blocks: &mut Vec<String>, inline: &str) {
    let text = paragraph(inline);
    if !text.is_empty() {
        blocks.push(text);
    }
}

/// Final paragraph text: hard breaks become `\` line ends and each line is
/// escaped where it could start a block.
fn paragraph(inline: &str) -> String {
    let trimmed = inline.trim_matches(|c: char| c == BREAK || c.is_whitespace());
    trimmed
        .split(BREAK)
        .map(|line| escape_line_start(line.trim()))
        .collect::<Vec<_>>()
        .join("\\\n")
}

fn single_line(inline: &str) -> String {
    inline
        .replace(BREAK, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap non-blank content in `marker`, keeping surrounding spaces outside.
fn emphasis(inner: &str, marker: &str) -> String {
    let core = inner.trim();
    if core.is_empty() {
        return inner.to_owned();
    }
    let lead = &inner[..inner.len() - inner.trim_start().len()];
    let trail = &inner[inner.trim_end().len()..];
    format!("{lead}{marker}{core}{marker}{trail}")
}

fn code_span(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    let fence = "`".repeat(longest_run(code, '`') + 1);
    if code.starts_with('`') || code.ends_with('`') {
        format!("{fence} {code} {fence}")
    } else {
        format!("{fence}{code}{fence}")
    }
}

fn code_block(pre: &Node) -> String {
    let text = pre.text_content();
    let code = text.trim_matches('\n');
    let language = class_language(pre)
        .or_else(|| pre.child("code").and_then(class_language))
        .unwrap_or_else(|| sniff_language(code));
    let fence = "`".repeat(longest_run(code, '`').max(2) + 1);
    format!("{fence}{language}\n{code}\n{fence}")
}

fn class_language(node: &Node) -> Option<&str> {
    node.attr("class")?.split_whitespace().find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
    })
}

/// Guess a fence language from the code itself.
pub(crate) fn sniff_language(code: &str) -> &'static str {
    let trimmed = code.trim_start();
    let has = |needle: &str| code.contains(needle);
    let upper = code.to_ascii_uppercase();

    if (trimmed.starts_with('{') || trimmed.starts_with('[')) && has("\":") {
        "json"
    } else if (has("def ") && has(":")) || (has("import ") && has("print(")) {
        "python"
    } else if has("fn ") && (has("->") || has("let ")) {
        "rust"
    } else if has("#include") {
        "c"
    } else if has("public class") || has("System.out") {
        "java"
    } else if has("function") || has("=>") || (has("const ") && has(";")) {
        "javascript"
    } else if trimmed.starts_with("#!") || trimmed.starts_with("$ ") {
        "bash"
    } else if trimmed.starts_with('<') && has("</") {
        "html"
    } else if upper.contains("SELECT ") && upper.contains(" FROM ") {
        "sql"
    } else {
        ""
    }
}

fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn image(node: &Node) -> String {
    let Some(src) = node.attr("src").filter(|s| !s.is_empty()) else {
        return String::new();
    };
    let alt = node
        .attr("alt")
        .unwrap_or_default()
        .replace(['[', ']'], "");
    format!("![{alt}]({})", destination(src))
}

/// Link destination, angle-bracketed when it contains spaces or parentheses.
fn destination(url: &str) -> String {
    if url.contains([' ', '(', ')']) {
        format!("<{url}>")
    } else {
        url.to_owned()
    }
}

/// Escape characters that would otherwise start inline markup.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a line that would otherwise read as a block marker.
fn escape_line_start(line: &str) -> String {
    if line.starts_with('#')
        || line.starts_with('>')
        || line.starts_with("- ")
        || line.starts_with("+ ")
        || line == "-"
        || line.starts_with("---")
        || line.starts_with("===")
    {
        return format!("\\{line}");
    }
    ORDERED_START_RE.replace(line, "$1\\$2$3").into_owned()
}
