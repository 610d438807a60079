//! Table structure repair.

use crate::node::Node;

const SECTIONS: &[&str] = &["thead", "tbody", "tfoot"];

/// Repair tables in place: orphan rows and cells get a table, row groups
/// are flattened and paragraph wrappers inside cells are removed.
pub fn repair(root: &mut Node) {
    for child in &mut root.children {
        repair(child);
    }
    if root.tag == "table" {
        flatten_sections(root);
    } else if !matches!(root.tag.as_str(), "tr" | "thead" | "tbody" | "tfoot") {
        wrap_orphans(root);
    }
    if matches!(root.tag.as_str(), "td" | "th") {
        unwrap_paragraphs(root);
    }
}

/// Wrap runs of `tr` (or bare `td`/`th`) outside a table into one table.
fn wrap_orphans(node: &mut Node) {
    if !node
        .children
        .iter()
        .any(|c| matches!(c.tag.as_str(), "tr" | "td" | "th"))
    {
        return;
    }

    let children = std::mem::take(&mut node.children);
    let mut table: Option<Node> = None;
    for child in children {
        if !matches!(child.tag.as_str(), "tr" | "td" | "th") {
            if let Some(table) = table.take() {
                node.children.push(table);
            }
            node.children.push(child);
            continue;
        }
        let table = table.get_or_insert_with(|| Node::new("table"));
        if child.tag == "tr" {
            table.push(child);
        } else {
            match table.children.last_mut() {
                Some(row) if row.attr("data-orphan").is_some() => {
                    row.push(child);
                }
                _ => table.push(
                    Node::new("tr")
                        .with_attr("data-orphan", "")
                        .with_children(vec![child]),
                ),
            }
        }
    }
    if let Some(table) = table {
        node.children.push(table);
    }
    for child in &mut node.children {
        if child.tag == "table" {
            for row in &mut child.children {
                row.attrs.remove("data-orphan");
            }
        }
    }
}

/// Hoist rows out of `thead`/`tbody`/`tfoot`; `thead` cells become headers.
fn flatten_sections(table: &mut Node) {
    if !table.children.iter().any(|c| SECTIONS.contains(&c.tag.as_str())) {
        return;
    }
    let children = std::mem::take(&mut table.children);
    for child in children {
        match child.tag.as_str() {
            "thead" => {
                for mut row in child.children.into_iter().filter(|r| r.tag == "tr") {
                    for cell in &mut row.children {
                        if cell.tag == "td" {
                            cell.tag = "th".to_owned();
                        }
                    }
                    table.push(row);
                }
            }
            "tbody" | "tfoot" => {
                table
                    .children
                    .extend(child.children.into_iter().filter(|r| r.tag == "tr"));
            }
            "tr" => table.push(child),
            _ => {}
        }
    }
}

/// Replace `p` children of a cell by their content, separated by `br`.
fn unwrap_paragraphs(cell: &mut Node) {
    if cell.children.is_empty() || !cell.children.iter().all(|c| c.tag == "p") {
        return;
    }
    let paragraphs = std::mem::take(&mut cell.children);
    cell.text = cell.text.trim().to_owned();
    for (i, p) in paragraphs.into_iter().enumerate() {
        if i > 0 {
            cell.push(Node::new("br"));
        }
        cell.append_text(p.text.trim_start());
        cell.children.extend(p.children);
    }
    if let Some(last) = cell.children.last_mut() {
        last.tail = last.tail.trim_end().to_owned();
    } else {
        cell.text = cell.text.trim_end().to_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_html;
    use pretty_assertions::assert_eq;

    fn repaired(html: &str) -> Node {
        let mut root = parse_html(html).unwrap();
        repair(&mut root);
        root
    }

    #[test]
    fn test_orphan_rows_wrapped() {
        let root = repaired("<p>x</p><tr><td>a</td></tr><tr><td>b</td></tr><p>y</p>");
        let tags: Vec<&str> = root.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, ["p", "table", "p"]);
        assert_eq!(root.children[1].children.len(), 2);
    }

    #[test]
    fn test_orphan_cells_wrapped() {
        let root = repaired("<td>a</td><td>b</td>");
        let table = &root.children[0];
        assert_eq!(table.tag, "table");
        assert_eq!(table.children.len(), 1);
        assert_eq!(table.children[0].children.len(), 2);
        assert!(table.children[0].attrs.is_empty());
    }

    #[test]
    fn test_sections_flattened() {
        let root = repaired(
            "<table><thead><tr><td>H</td></tr></thead><tbody><tr><td>1</td></tr></tbody><tbody><tr><td>2</td></tr></tbody></table>",
        );
        let table = &root.children[0];
        assert_eq!(table.children.len(), 3);
        assert_eq!(table.children[0].children[0].tag, "th");
        assert_eq!(table.children[2].children[0].text, "2");
    }

    #[test]
    fn test_cell_paragraphs_unwrapped() {
        let root = repaired("<table><tr><td><p>one</p><p><b>two</b></p></td><td><p>solo</p></td></tr></table>");
        let row = &root.children[0].children[0];
        let first = &row.children[0];
        assert_eq!(first.text, "one");
        assert_eq!(first.children[0].tag, "br");
        assert_eq!(first.children[1].tag, "b");
        assert_eq!(row.children[1].text, "solo");
        assert!(row.children[1].children.is_empty());
    }
}
