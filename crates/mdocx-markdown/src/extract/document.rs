//! `word/document.xml` body to an HTML node tree.

use std::collections::HashMap;

use mdocx_core::{ConversionWarning, WarningCode};

use super::numbering::Numbering;
use super::package::{Media, Package, Relationships};
use super::styles::{ParagraphKind, StyleMap};
use crate::error::ExtractError;
use crate::node::Node;

const MONOSPACE_FONTS: &[&str] = &[
    "consolas",
    "courier",
    "courier new",
    "menlo",
    "monaco",
    "lucida console",
    "source code pro",
    "dejavu sans mono",
    "liberation mono",
];

/// Walks the body of one document.
pub(crate) struct Walker<'p, 'a> {
    pub package: &'p mut Package<'a>,
    pub styles: &'p StyleMap,
    pub numbering: &'p mut Numbering,
    pub rels: &'p Relationships,
    pub media: &'p mut Media,
    /// Left margin of one list level, in points.
    pub unit_pt: f32,
    pub warnings: Vec<ConversionWarning>,
}

enum Block {
    Paragraph(ParagraphKind, Node),
    Other(Node),
}

impl Walker<'_, '_> {
    /// Block elements of a body, table cell or content control.
    pub(crate) fn body(&mut self, container: &Node) -> Result<Vec<Node>, ExtractError> {
        let mut blocks = Vec::new();
        self.collect_blocks(container, &mut blocks)?;
        Ok(group(blocks))
    }

    fn collect_blocks(&mut self, container: &Node, out: &mut Vec<Block>) -> Result<(), ExtractError> {
        for child in &container.children {
            match child.tag.as_str() {
                "w:p" => {
                    let (kind, node) = self.paragraph(child)?;
                    out.push(Block::Paragraph(kind, node));
                }
                "w:tbl" => out.push(Block::Other(self.table(child)?)),
                "w:sdt" | "w:sdtContent" | "w:customXml" | "w:ins" => {
                    self.collect_blocks(child, out)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn paragraph(&mut self, p: &Node) -> Result<(ParagraphKind, Node), ExtractError> {
        let ppr = p.child("w:pPr");
        let mut kind = ppr
            .and_then(|ppr| ppr.child("w:pStyle"))
            .and_then(|s| s.attr("w:val"))
            .map_or(ParagraphKind::Normal, |id| self.styles.paragraph_kind(id));

        let mut node = Node::new("p");
        self.inlines(p, &mut node)?;

        if kind == ParagraphKind::Normal
            && node.is_blank()
            && ppr
                .and_then(|ppr| ppr.child("w:pBdr"))
                .is_some_and(|b| b.child("w:bottom").is_some())
        {
            kind = ParagraphKind::Rule;
        }

        match kind {
            ParagraphKind::Heading(level) => node.tag = format!("h{level}"),
            ParagraphKind::Title => node.tag = "h1".to_owned(),
            ParagraphKind::Rule => return Ok((kind, Node::new("hr"))),
            ParagraphKind::Normal | ParagraphKind::Quote | ParagraphKind::Code => {}
        }

        let mut styles = Vec::new();
        if matches!(kind, ParagraphKind::Normal | ParagraphKind::Quote) {
            let mut margin = None;
            if let Some(num_pr) = ppr.and_then(|ppr| ppr.child("w:numPr"))
                && let Some(num_id) = val(num_pr, "w:numId")
            {
                let ilvl = val(num_pr, "w:ilvl")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                if let Some(marker) = self.numbering.next_marker(num_id, ilvl) {
                    node.text = format!("{marker} {}", node.text);
                    #[allow(clippy::cast_precision_loss)]
                    let level = (ilvl + 1) as f32;
                    margin = Some(level * self.unit_pt);
                }
            }
            if margin.is_none() {
                margin = ppr.and_then(indent_pt).filter(|&pt| pt > 0.0);
            }
            if let Some(pt) = margin {
                styles.push(format!("margin-left:{pt}pt"));
            }
        }
        if let Some(align) = ppr.and_then(alignment) {
            styles.push(format!("text-align:{align}"));
        }
        if !styles.is_empty() {
            node.attrs.insert("style".to_owned(), styles.join(";"));
        }
        Ok((kind, node))
    }

    fn inlines(&mut self, container: &Node, out: &mut Node) -> Result<(), ExtractError> {
        for child in &container.children {
            match child.tag.as_str() {
                "w:r" => self.run(child, out)?,
                "w:hyperlink" => {
                    let href = child
                        .attr("r:id")
                        .and_then(|id| self.rels.get(id))
                        .map(|rel| rel.target.clone())
                        .or_else(|| child.attr("w:anchor").map(|a| format!("#{a}")));
                    let mut link = Node::new("a");
                    self.inlines(child, &mut link)?;
                    match href {
                        Some(href) => {
                            link.attrs.insert("href".to_owned(), href);
                            out.push(link);
                        }
                        None => {
                            out.append_text(&link.text);
                            out.children.extend(link.children);
                        }
                    }
                }
                "w:bookmarkStart" => {
                    if let Some(name) = child.attr("w:name")
                        && !name.starts_with('_')
                    {
                        out.push(Node::new("a").with_attr("id", name));
                    }
                }
                "w:ins" | "w:smartTag" | "w:customXml" | "w:fldSimple" | "w:sdt"
                | "w:sdtContent" => self.inlines(child, out)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn run(&mut self, r: &Node, out: &mut Node) -> Result<(), ExtractError> {
        let format = RunFormat::new(r.child("w:rPr"), self.styles);
        let mut span = Node::new(if format.code { "code" } else { "span" });

        for child in &r.children {
            match child.tag.as_str() {
                "w:t" => span.append_text(&child.text),
                "w:tab" | "w:ptab" => span.append_text("\t"),
                "w:noBreakHyphen" => span.append_text("-"),
                "w:br" | "w:cr" => {
                    if !matches!(child.attr("w:type"), Some("page" | "column")) {
                        span.push(Node::new("br"));
                    }
                }
                "w:drawing" | "w:pict" | "w:object" => {
                    if let Some(img) = self.image(child)? {
                        span.push(img);
                    }
                }
                _ => {}
            }
        }
        if span.text.is_empty() && span.children.is_empty() {
            return Ok(());
        }

        let mut node = span;
        if let Some(vertical) = format.vertical {
            node = wrap_styled(node, &format!("vertical-align:{vertical}"));
        }
        if format.strike {
            node = wrap_styled(node, "text-decoration:line-through");
        }
        if format.underline {
            node = wrap_styled(node, "text-decoration:underline");
        }
        if format.italic {
            node = Node::new("em").with_children(vec![node]);
        }
        if format.bold {
            node = Node::new("strong").with_children(vec![node]);
        }
        out.push(node);
        Ok(())
    }

    fn image(&mut self, drawing: &Node) -> Result<Option<Node>, ExtractError> {
        let rel_id = drawing
            .find("a:blip")
            .and_then(|b| b.attr("r:embed").or_else(|| b.attr("r:link")))
            .or_else(|| drawing.find("v:imagedata").and_then(|i| i.attr("r:id")));
        let Some(rel_id) = rel_id else {
            return Ok(None);
        };
        let alt = drawing
            .find("wp:docPr")
            .and_then(|d| d.attr("descr").or_else(|| d.attr("title")))
            .unwrap_or_default()
            .to_owned();

        let src = match self.rels.get(rel_id) {
            Some(rel) if rel.external => Some(rel.target.clone()),
            Some(rel) => {
                let part = Package::part_name(&rel.target);
                self.media.source(self.package, &part)?
            }
            None => None,
        };
        let Some(src) = src else {
            let warning = ConversionWarning::new(
                WarningCode::ImageUnavailable,
                "embedded image part is missing",
            )
            .with_detail(rel_id);
            self.warnings.push(warning);
            return Ok(None);
        };
        Ok(Some(
            Node::new("img").with_attr("src", src).with_attr("alt", alt),
        ))
    }

    fn table(&mut self, tbl: &Node) -> Result<Node, ExtractError> {
        let mut table = Node::new("table");
        // Grid column to (row, cell) of the cell a vertical merge started in.
        let mut merges: HashMap<usize, (usize, usize)> = HashMap::new();
        let mut first_row_emphasized = Vec::new();

        for (row_index, tr) in tbl.children_named("w:tr").enumerate() {
            let header = tr
                .child("w:trPr")
                .and_then(|p| p.child("w:tblHeader"))
                .is_some_and(is_on);
            let mut row = Node::new("tr");
            let mut col = 0;

            for tc in tr.children_named("w:tc") {
                let tcpr = tc.child("w:tcPr");
                let span = tcpr
                    .and_then(|p| val(p, "w:gridSpan"))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(1)
                    .max(1);
                let vmerge = tcpr
                    .and_then(|p| p.child("w:vMerge"))
                    .map(|m| m.attr("w:val").unwrap_or("continue"));

                if vmerge == Some("continue") {
                    if let Some(&(r, c)) = merges.get(&col)
                        && let Some(origin) = table.children.get_mut(r).and_then(|row| row.children.get_mut(c))
                    {
                        let rowspan = origin
                            .attr("rowspan")
                            .and_then(|v| v.parse::<usize>().ok())
                            .unwrap_or(1);
                        origin
                            .attrs
                            .insert("rowspan".to_owned(), (rowspan + 1).to_string());
                    }
                    col += span;
                    continue;
                }

                let mut cell = Node::new(if header { "th" } else { "td" });
                if span > 1 {
                    cell.attrs.insert("colspan".to_owned(), span.to_string());
                }
                if let Some(align) = tc
                    .child("w:p")
                    .and_then(|p| p.child("w:pPr"))
                    .and_then(alignment)
                {
                    cell.attrs
                        .insert("style".to_owned(), format!("text-align:{align}"));
                }
                cell.children = self.body(tc)?;

                if vmerge == Some("restart") {
                    merges.insert(col, (row_index, row.children.len()));
                } else {
                    merges.remove(&col);
                }
                if row_index == 0 {
                    first_row_emphasized.push(is_shaded(tcpr) || all_runs_bold(tc));
                }
                row.push(cell);
                col += span;
            }
            table.push(row);
        }

        if table.children.len() > 1
            && !first_row_emphasized.is_empty()
            && first_row_emphasized.iter().all(|&e| e)
            && let Some(first) = table.children.first_mut()
        {
            for cell in &mut first.children {
                cell.tag = "th".to_owned();
            }
        }
        Ok(table)
    }
}

/// Merge runs of code paragraphs into `pre` and quote paragraphs into
/// `blockquote`.
fn group(blocks: Vec<Block>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    let mut previous = None;

    for block in blocks {
        match block {
            Block::Paragraph(ParagraphKind::Code, p) => {
                let line = p.text_content();
                match out.last_mut() {
                    Some(pre) if previous == Some(ParagraphKind::Code) => {
                        pre.text.push('\n');
                        pre.text.push_str(&line);
                    }
                    _ => out.push(Node::new("pre").with_text(line)),
                }
                previous = Some(ParagraphKind::Code);
            }
            Block::Paragraph(ParagraphKind::Quote, mut p) => {
                p.attrs.remove("style");
                match out.last_mut() {
                    Some(quote) if previous == Some(ParagraphKind::Quote) => quote.push(p),
                    _ => out.push(Node::new("blockquote").with_children(vec![p])),
                }
                previous = Some(ParagraphKind::Quote);
            }
            Block::Paragraph(kind, p) => {
                out.push(p);
                previous = Some(kind);
            }
            Block::Other(node) => {
                out.push(node);
                previous = None;
            }
        }
    }
    out
}

#[derive(Debug, Default)]
struct RunFormat {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    code: bool,
    vertical: Option<&'static str>,
}

impl RunFormat {
    fn new(rpr: Option<&Node>, styles: &StyleMap) -> Self {
        let Some(rpr) = rpr else {
            return Self::default();
        };
        let flag = |tag: &str| rpr.child(tag).is_some_and(is_on);
        let monospace = rpr
            .child("w:rFonts")
            .and_then(|f| f.attr("w:ascii").or_else(|| f.attr("w:hAnsi")))
            .is_some_and(|font| MONOSPACE_FONTS.contains(&font.to_ascii_lowercase().as_str()));
        Self {
            bold: flag("w:b"),
            italic: flag("w:i"),
            underline: rpr
                .child("w:u")
                .is_some_and(|u| u.attr("w:val") != Some("none")),
            strike: flag("w:strike") || flag("w:dstrike"),
            code: monospace
                || val(rpr, "w:rStyle").is_some_and(|id| styles.is_code_char(id)),
            vertical: match val(rpr, "w:vertAlign") {
                Some("superscript") => Some("super"),
                Some("subscript") => Some("sub"),
                _ => None,
            },
        }
    }
}

fn wrap_styled(node: Node, style: &str) -> Node {
    Node::new("span")
        .with_attr("style", style)
        .with_children(vec![node])
}

/// `w:val` of child `tag`.
fn val<'n>(node: &'n Node, tag: &str) -> Option<&'n str> {
    node.child(tag).and_then(|c| c.attr("w:val"))
}

/// OOXML toggle property: present and not switched off.
fn is_on(node: &Node) -> bool {
    !matches!(node.attr("w:val"), Some("0" | "false" | "off"))
}

/// Left indentation of a paragraph in points.
fn indent_pt(ppr: &Node) -> Option<f32> {
    let ind = ppr.child("w:ind")?;
    let twips = ind.attr("w:left").or_else(|| ind.attr("w:start"))?;
    twips.parse::<f32>().ok().map(|t| t / 20.0)
}

fn alignment(ppr: &Node) -> Option<&'static str> {
    match val(ppr, "w:jc")? {
        "center" => Some("center"),
        "right" | "end" => Some("right"),
        _ => None,
    }
}

fn is_shaded(tcpr: Option<&Node>) -> bool {
    tcpr.and_then(|p| p.child("w:shd"))
        .and_then(|s| s.attr("w:fill"))
        .is_some_and(|fill| !fill.is_empty() && fill != "auto" && !fill.eq_ignore_ascii_case("ffffff"))
}

/// Whether every run with text in `node` is bold.
fn all_runs_bold(node: &Node) -> bool {
    let mut runs = Vec::new();
    collect_text_runs(node, &mut runs);
    !runs.is_empty()
        && runs.iter().all(|r| {
            r.child("w:rPr")
                .and_then(|p| p.child("w:b"))
                .is_some_and(is_on)
        })
}

fn collect_text_runs<'n>(node: &'n Node, out: &mut Vec<&'n Node>) {
    for child in &node.children {
        if child.tag == "w:r" {
            if child.children_named("w:t").any(|t| !t.text.trim().is_empty()) {
                out.push(child);
            }
        } else {
            collect_text_runs(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::package::tests::package;
    use crate::parser::parse_xml;
    use pretty_assertions::assert_eq;

    const NUMBERING: &str = r#"<w:numbering>
        <w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/></w:lvl></w:abstractNum>
        <w:abstractNum w:abstractNumId="2"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/><w:lvlText w:val="&#8226;"/></w:lvl>
            <w:lvl w:ilvl="1"><w:numFmt w:val="bullet"/><w:lvlText w:val="&#9675;"/></w:lvl></w:abstractNum>
        <w:num w:numId="1"><w:abstractNumId w:val="1"/></w:num>
        <w:num w:numId="2"><w:abstractNumId w:val="2"/></w:num>
    </w:numbering>"#;

    const RELS: &str = r#"<Relationships>
        <Relationship Id="rId5" Target="https://example.com" TargetMode="External"/>
        <Relationship Id="rId6" Target="media/image1.png"/>
        <Relationship Id="rId7" Target="media/missing.png"/>
    </Relationships>"#;

    fn walk(body: &str) -> (Vec<Node>, Vec<ConversionWarning>, Media) {
        let bytes = package(&[("word/media/image1.png", b"\x89PNG".as_slice())]);
        let mut package = Package::open(&bytes).unwrap();
        let styles = StyleMap::default();
        let mut numbering = Numbering::from_tree(&parse_xml(NUMBERING).unwrap());
        let rels = Relationships::from_tree(&parse_xml(RELS).unwrap());
        let mut media = Media::new(None);
        let tree = parse_xml(&format!("<w:body>{body}</w:body>")).unwrap();

        let mut walker = Walker {
            package: &mut package,
            styles: &styles,
            numbering: &mut numbering,
            rels: &rels,
            media: &mut media,
            unit_pt: 18.0,
            warnings: Vec::new(),
        };
        let nodes = walker.body(&tree.children[0]).unwrap();
        let warnings = walker.warnings;
        (nodes, warnings, media)
    }

    #[test]
    fn test_heading_with_bookmark() {
        let (nodes, _, _) = walk(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr>
                <w:bookmarkStart w:id="0" w:name="intro_section"/><w:bookmarkStart w:id="1" w:name="_GoBack"/>
                <w:r><w:t>Intro Section</w:t></w:r><w:bookmarkEnd w:id="0"/></w:p>"#,
        );
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag, "h2");
        assert_eq!(nodes[0].children[0].attr("id"), Some("intro_section"));
        assert_eq!(nodes[0].children.len(), 2);
        assert_eq!(nodes[0].text_content(), "Intro Section");
    }

    #[test]
    fn test_run_formatting() {
        let (nodes, _, _) = walk(
            r#"<w:p><w:r><w:rPr><w:b/><w:i/></w:rPr><w:t>both</w:t></w:r>
                <w:r><w:rPr><w:b w:val="0"/><w:u w:val="single"/></w:rPr><w:t>under</w:t></w:r>
                <w:r><w:rPr><w:rFonts w:ascii="Consolas"/></w:rPr><w:t>x = 1</w:t></w:r></w:p>"#,
        );
        let p = &nodes[0];
        assert_eq!(p.children[0].tag, "strong");
        assert_eq!(p.children[0].children[0].tag, "em");
        assert_eq!(p.children[1].attr("style"), Some("text-decoration:underline"));
        assert_eq!(p.children[2].tag, "code");
        assert_eq!(p.children[2].text, "x = 1");
    }

    #[test]
    fn test_numbered_paragraphs_get_marker_and_margin() {
        let (nodes, _, _) = walk(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>one</w:t></w:r></w:p>
               <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>two</w:t></w:r></w:p>
               <w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="2"/></w:numPr></w:pPr><w:r><w:t>sub</w:t></w:r></w:p>"#,
        );
        assert_eq!(nodes[0].text_content(), "1. one");
        assert_eq!(nodes[1].text_content(), "2. two");
        assert_eq!(nodes[0].attr("style"), Some("margin-left:18pt"));
        assert_eq!(nodes[2].text_content(), "\u{25cb} sub");
        assert_eq!(nodes[2].attr("style"), Some("margin-left:36pt"));
    }

    #[test]
    fn test_code_and_quote_grouping() {
        let (nodes, _, _) = walk(
            r#"<w:p><w:pPr><w:pStyle w:val="CodeBlock"/></w:pPr><w:r><w:t>fn main() {</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="CodeBlock"/></w:pPr><w:r><w:t>}</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Quote"/><w:ind w:left="720"/></w:pPr><w:r><w:t>a</w:t></w:r></w:p>
               <w:p><w:pPr><w:pStyle w:val="Quote"/></w:pPr><w:r><w:t>b</w:t></w:r></w:p>"#,
        );
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].tag, "pre");
        assert_eq!(nodes[0].text, "fn main() {\n}");
        assert_eq!(nodes[1].tag, "blockquote");
        assert_eq!(nodes[1].children.len(), 2);
        assert_eq!(nodes[1].children[0].attr("style"), None);
    }

    #[test]
    fn test_hyperlinks() {
        let (nodes, _, _) = walk(
            r#"<w:p><w:hyperlink r:id="rId5"><w:r><w:t>site</w:t></w:r></w:hyperlink>
                <w:hyperlink w:anchor="intro_section"><w:r><w:t>intro</w:t></w:r></w:hyperlink></w:p>"#,
        );
        let p = &nodes[0];
        assert_eq!(p.children[0].attr("href"), Some("https://example.com"));
        assert_eq!(p.children[1].attr("href"), Some("#intro_section"));
    }

    #[test]
    fn test_images() {
        let (nodes, warnings, media) = walk(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="1" name="Picture 1" descr="Chart"/>
                <a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="rId6"/></pic:blipFill></pic:pic></a:graphicData></a:graphic>
               </wp:inline></w:drawing></w:r>
               <w:r><w:drawing><a:blip r:embed="rId7"/></w:drawing></w:r></w:p>"#,
        );
        let img = nodes[0].find("img").unwrap();
        assert_eq!(img.attr("alt"), Some("Chart"));
        assert!(img.attr("src").unwrap().starts_with("data:image/png;base64,"));
        assert_eq!(media.count, 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::ImageUnavailable);
    }

    #[test]
    fn test_table_spans_and_shaded_header() {
        let (nodes, _, _) = walk(
            r#"<w:tbl>
                <w:tr><w:tc><w:tcPr><w:shd w:fill="D9D9D9"/></w:tcPr><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc>
                      <w:tc><w:tcPr><w:shd w:fill="D9D9D9"/></w:tcPr><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>tall</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>1</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
                      <w:tc><w:p><w:r><w:t>2</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>wide</w:t></w:r></w:p></w:tc></w:tr>
            </w:tbl>"#,
        );
        let table = &nodes[0];
        assert_eq!(table.children.len(), 4);
        assert!(table.children[0].children.iter().all(|c| c.tag == "th"));
        assert_eq!(table.children[1].children[0].attr("rowspan"), Some("2"));
        assert_eq!(table.children[2].children.len(), 1);
        let wide = &table.children[3].children[0];
        assert_eq!(wide.attr("colspan"), Some("2"));
        assert_eq!(wide.attr("style"), Some("text-align:center"));
    }

    #[test]
    fn test_unemphasized_first_row_stays_data() {
        let (nodes, _, _) = walk(
            r#"<w:tbl>
                <w:tr><w:tc><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>A</w:t></w:r></w:p></w:tc>
                      <w:tc><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:p><w:r><w:t>1</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>
            </w:tbl>"#,
        );
        assert!(nodes[0].children[0].children.iter().all(|c| c.tag == "td"));
    }

    #[test]
    fn test_empty_bordered_paragraph_is_rule() {
        let (nodes, _, _) = walk(r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single"/></w:pBdr></w:pPr></w:p>"#);
        assert_eq!(nodes[0].tag, "hr");
    }
}
