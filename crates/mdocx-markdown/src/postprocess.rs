//! Line-level passes over transcoded Markdown.
//!
//! Every pass leaves fenced code untouched. In order:
//!
//! 1. Unescape periods after numbers in headings (`## 1\. Intro`)
//! 2. Inject heading anchors in the configured [`HeadingAnchorStyle`]
//! 3. Fence runs of code-looking lines that were exported as plain paragraphs
//! 4. Re-indent nested list items by their parent's marker width
//! 5. Collapse blank line runs and end with a single newline

use std::sync::LazyLock;

use mdocx_anchors::AnchorMap;
use mdocx_config::HeadingAnchorStyle;
use regex::Regex;

use crate::transcode::sniff_language;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*$").expect("invalid heading regex"));

static ESCAPED_PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\\\.").expect("invalid escaped period regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("invalid link regex"));

static INLINE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("invalid inline tag regex"));

static EMPHASIS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*+|~~|`+").expect("invalid emphasis regex"));

static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^( *)([-*+]|\d+[.)])( +)(.*)$").expect("invalid list item regex")
});

static CODE_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:def |class \w+.*:$|import |from \S+ import |fn |let |const |var |function\b|return\b|\\?#include|public |private |(?:if|for|while) ?\()",
    )
    .expect("invalid code start regex")
});

static UNESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([\\*_`#>+.\-])").expect("invalid unescape regex"));

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("invalid blank run regex"));

/// Apply every pass.
#[must_use]
pub fn postprocess(markdown: &str, anchor_style: HeadingAnchorStyle) -> String {
    let lines: Vec<String> = markdown.lines().map(str::to_owned).collect();
    let lines = unescape_heading_periods(lines);
    let lines = inject_anchors(lines, anchor_style);
    let lines = fence_code_runs(lines);
    let lines = normalize_list_indent(lines);

    let joined = lines.join("\n");
    let collapsed = BLANK_RUN_RE.replace_all(&joined, "\n\n");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Whether each line is a fence delimiter or inside a fenced block.
fn fenced(lines: &[String]) -> Vec<bool> {
    let mut mask = Vec::with_capacity(lines.len());
    let mut open: Option<(char, usize)> = None;
    for line in lines {
        let trimmed = line.trim_start();
        let fence = ['`', '~'].into_iter().find_map(|c| {
            let run = trimmed.chars().take_while(|&x| x == c).count();
            (run >= 3).then_some((c, run))
        });
        match (open, fence) {
            (None, Some(fence)) => {
                open = Some(fence);
                mask.push(true);
            }
            (Some((c, len)), Some((fc, flen)))
                if c == fc && flen >= len && trimmed.trim_end().chars().all(|x| x == c) =>
            {
                open = None;
                mask.push(true);
            }
            (Some(_), _) => mask.push(true),
            (None, None) => mask.push(false),
        }
    }
    mask
}

fn unescape_heading_periods(mut lines: Vec<String>) -> Vec<String> {
    let mask = fenced(&lines);
    for (line, fenced) in lines.iter_mut().zip(mask) {
        if !fenced && HEADING_RE.is_match(line) {
            *line = ESCAPED_PERIOD_RE.replace_all(line, "$1.").into_owned();
        }
    }
    lines
}

fn inject_anchors(mut lines: Vec<String>, style: HeadingAnchorStyle) -> Vec<String> {
    if style == HeadingAnchorStyle::None {
        return lines;
    }
    let mask = fenced(&lines);
    let mut anchors = AnchorMap::new();
    for (line, fenced) in lines.iter_mut().zip(mask) {
        if fenced {
            continue;
        }
        let Some(caps) = HEADING_RE.captures(line) else {
            continue;
        };
        let level = u8::try_from(caps[1].len()).unwrap_or(6);
        let slug = anchors.insert(level, &visible_text(&caps[2])).slug.clone();
        *line = match style {
            HeadingAnchorStyle::Inline => format!("{} {} <a id=\"{slug}\"></a>", &caps[1], &caps[2]),
            HeadingAnchorStyle::Attribute => format!("{} {} {{#{slug}}}", &caps[1], &caps[2]),
            HeadingAnchorStyle::None => continue,
        };
    }
    lines
}

/// Heading text as a reader sees it, so the slug matches the one links
/// derive from their visible text.
fn visible_text(heading: &str) -> String {
    let text = LINK_RE.replace_all(heading, "$1");
    let text = INLINE_TAG_RE.replace_all(&text, "");
    EMPHASIS_RE.replace_all(&text, "").into_owned()
}

fn looks_like_code(line: &str) -> bool {
    let t = line.trim();
    if t.is_empty() || t.contains("](") || t.starts_with('|') || t.starts_with('>') {
        return false;
    }
    if LIST_ITEM_RE.is_match(line) || HEADING_RE.is_match(line) {
        return false;
    }
    let t = t.trim_end_matches('\\');
    t.ends_with(';')
        || t.ends_with('{')
        || t == "}"
        || t == "};"
        || t.ends_with("\\*/")
        || CODE_START_RE.is_match(t)
}

/// Wrap runs of at least two code-looking lines in a fence.
///
/// Blank lines between code lines belong to the run and are dropped;
/// paragraphs exported one per line leave them behind.
fn fence_code_runs(lines: Vec<String>) -> Vec<String> {
    let mask = fenced(&lines);
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        if mask[i] || !looks_like_code(&lines[i]) {
            out.push(lines[i].clone());
            i += 1;
            continue;
        }

        let mut run = vec![i];
        let mut j = i + 1;
        while j < lines.len() && !mask[j] {
            if looks_like_code(&lines[j]) {
                run.push(j);
                j += 1;
            } else if lines[j].trim().is_empty()
                && (j + 1..lines.len())
                    .find(|&k| !lines[k].trim().is_empty())
                    .is_some_and(|k| !mask[k] && looks_like_code(&lines[k]))
            {
                j += 1;
            } else {
                break;
            }
        }

        if run.len() < 2 {
            out.push(lines[i].clone());
            i += 1;
            continue;
        }
        let code: Vec<String> = run
            .iter()
            .map(|&k| {
                let line = lines[k].trim_end();
                let line = line.strip_suffix('\\').unwrap_or(line);
                UNESCAPE_RE.replace_all(line, "$1").into_owned()
            })
            .collect();
        let body = code.join("\n");
        out.push(format!("```{}", sniff_language(&body)));
        out.extend(code);
        out.push("```".to_owned());
        i = j;
    }
    out
}

/// Indent each nested list item by its parent's content offset.
fn normalize_list_indent(lines: Vec<String>) -> Vec<String> {
    let mask = fenced(&lines);
    // (source indent, output indent, marker width) per open level.
    let mut stack: Vec<(usize, usize, usize)> = Vec::new();
    let mut out = Vec::with_capacity(lines.len());

    for (line, fenced) in lines.into_iter().zip(mask) {
        if fenced {
            out.push(line);
            continue;
        }
        if let Some(caps) = LIST_ITEM_RE.captures(&line) {
            let indent = caps[1].len();
            let marker = &caps[2];
            while stack.last().is_some_and(|&(source, _, _)| source > indent) {
                stack.pop();
            }
            let output = match stack.last() {
                Some(&(source, output, _)) if source == indent => {
                    stack.pop();
                    output
                }
                Some(&(_, output, width)) => output + width,
                None => 0,
            };
            stack.push((indent, output, marker.len() + 1));
            out.push(format!("{}{marker} {}", " ".repeat(output), &caps[4]));
            continue;
        }

        if line.trim().is_empty() {
            out.push(line);
        } else if line.starts_with(' ')
            && let Some(&(_, output, width)) = stack.last()
        {
            out.push(format!("{}{}", " ".repeat(output + width), line.trim_start()));
        } else {
            stack.clear();
            out.push(line);
        }
    }
    out
}
