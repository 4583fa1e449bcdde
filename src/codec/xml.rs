//! XML encoding: a line-oriented element tree for the kinds that
//! opt in to it.
//!
//! The document is written one element per line, so the reader is a
//! small line matcher rather than a streaming XML parser. Only the
//! documents this module writes (plus whitespace variation) are
//! accepted.

use super::scan::LineScanner;
use super::ReadMode;
use crate::table::{links_from_coded_text, links_to_coded_text, AttrTable, Cell, TableKind};
use crate::util::text;
use crate::util::Result;

const ROOT: &str = "attribute-table";

pub(crate) fn write<C: Cell>(table: &AttrTable<C>, kind: TableKind) -> Result<Vec<u8>> {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<{} kind=\"{}\">\n", ROOT, kind.registry_key()));

    out.push_str(&format!(
        "  <shape nodes=\"{}\" columns=\"{}\"/>\n",
        table.num_nodes(),
        table.num_columns()
    ));
    if !table.title.is_empty() {
        out.push_str(&format!("  <title>{}</title>\n", escape(&table.title)));
    }
    for (key, value) in table.header.iter() {
        out.push_str(&format!(
            "  <header key=\"{}\">{}</header>\n",
            escape(key),
            escape(&text::comment_to_storage(value))
        ));
    }
    for (i, meta) in table.columns().iter().enumerate() {
        out.push_str(&format!("  <column index=\"{}\">\n", i));
        out.push_str(&format!("    <name>{}</name>\n", escape(&meta.name)));
        if !meta.comment.is_empty() {
            out.push_str(&format!(
                "    <comment>{}</comment>\n",
                escape(&text::comment_to_storage(&meta.comment))
            ));
        }
        if !meta.study_links.is_empty() {
            out.push_str(&format!(
                "    <study-links>{}</study-links>\n",
                escape(&links_to_coded_text(&meta.study_links))
            ));
        }
        out.push_str("  </column>\n");
    }

    out.push_str("  <data>\n");
    let mut row = String::new();
    for v in 0..table.num_nodes() {
        row.clear();
        for c in 0..table.num_columns() {
            table.cell(v, c).write_fields(&mut row);
        }
        out.push_str(&format!("    <row>{}</row>\n", row.trim_start()));
    }
    out.push_str("  </data>\n");
    out.push_str(&format!("</{}>\n", ROOT));
    Ok(out.into_bytes())
}

pub(crate) fn read<C: Cell>(
    scan: &mut LineScanner<'_>,
    mut table: AttrTable<C>,
    kind: TableKind,
    mode: ReadMode,
) -> Result<AttrTable<C>> {
    // The declaration line may already have been consumed by sniffing.
    let (save_pos, save_line) = (scan.pos(), scan.line());
    match scan.next_line()? {
        Some(line) if line.trim_start().starts_with("<?xml") => {}
        _ => scan.seek(save_pos, save_line),
    }

    let root = require_line(scan)?;
    let root = root.trim();
    if !root.starts_with(&format!("<{}", ROOT)) {
        return Err(scan.format_error(format!("expected <{}> root element", ROOT)));
    }
    if let Some(doc_kind) = attribute(root, "kind") {
        if doc_kind != kind.registry_key() {
            return Err(scan.format_error(format!(
                "document holds a {} table, not {}",
                doc_kind,
                kind.registry_key()
            )));
        }
    }

    let mut sized = false;
    let mut column = 0usize;
    loop {
        let line = require_line(scan)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == format!("</{}>", ROOT) {
            break;
        }
        if line.starts_with("<shape") {
            let nodes = attribute(line, "nodes")
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| scan.format_error("malformed <shape> element"))?;
            let columns = attribute(line, "columns")
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| scan.format_error("malformed <shape> element"))?;
            match mode {
                ReadMode::MetadataOnly => table.set_size_metadata_only(nodes, columns),
                ReadMode::Full => table.set_size(nodes, columns)?,
            }
            sized = true;
        } else if let Some(text_value) = element_text(line, "title") {
            table.title = unescape(text_value);
        } else if line.starts_with("<header") {
            let key = attribute(line, "key")
                .ok_or_else(|| scan.format_error("<header> element without key"))?;
            let value = element_body(line)
                .ok_or_else(|| scan.format_error("malformed <header> element"))?;
            table
                .header
                .set(unescape(&key), text::comment_to_display(&unescape(value)));
        } else if line.starts_with("<column") {
            column = attribute(line, "index")
                .and_then(|v| v.parse::<usize>().ok())
                .ok_or_else(|| scan.format_error("malformed <column> element"))?;
            if !sized || column >= table.num_columns() {
                return Err(scan.format_error(format!("column index {} out of range", column)));
            }
        } else if let Some(value) = element_text(line, "name") {
            if column >= table.num_columns() {
                return Err(scan.format_error("<name> outside a <column> element"));
            }
            table.column_mut(column).name = unescape(value);
        } else if let Some(value) = element_text(line, "comment") {
            if column >= table.num_columns() {
                return Err(scan.format_error("<comment> outside a <column> element"));
            }
            table.column_mut(column).comment = text::comment_to_display(&unescape(value));
        } else if let Some(value) = element_text(line, "study-links") {
            if column >= table.num_columns() {
                return Err(scan.format_error("<study-links> outside a <column> element"));
            }
            table.column_mut(column).study_links = links_from_coded_text(&unescape(value));
        } else if line == "<data>" {
            if !sized {
                return Err(scan.format_error("<data> before <shape>"));
            }
            if mode == ReadMode::MetadataOnly {
                return Ok(table);
            }
            read_rows(scan, &mut table)?;
        } else if line == "</column>" || line == "</data>" {
            // structural close tags
        } else {
            return Err(scan.format_error(format!("unexpected element '{}'", line)));
        }
    }
    if !sized {
        return Err(scan.format_error("document has no <shape> element"));
    }
    Ok(table)
}

fn read_rows<C: Cell>(scan: &mut LineScanner<'_>, table: &mut AttrTable<C>) -> Result<()> {
    let expected = table.num_columns() * C::FIELDS;
    for v in 0..table.num_nodes() {
        let line = require_line(scan)?;
        let body = element_text(line.trim(), "row")
            .ok_or_else(|| scan.format_error(format!("expected <row> {} of {}", v, table.num_nodes())))?;
        let fields = text::tokenize(body);
        if fields.len() != expected {
            return Err(scan.format_error(format!(
                "row has {} fields, expected {}",
                fields.len(),
                expected
            )));
        }
        for c in 0..table.num_columns() {
            let start = c * C::FIELDS;
            let cell = C::parse_fields(&fields[start..start + C::FIELDS])
                .ok_or_else(|| scan.format_error("malformed cell value"))?;
            table.set_cell(v, c, cell);
        }
    }
    Ok(())
}

fn require_line<'a>(scan: &mut LineScanner<'a>) -> Result<&'a str> {
    scan.next_line()?
        .ok_or_else(|| scan.format_error("unexpected end of document"))
}

/// Extract `name="value"` from an element line.
fn attribute(line: &str, name: &str) -> Option<String> {
    let marker = format!("{}=\"", name);
    let start = line.find(&marker)? + marker.len();
    let end = line[start..].find('"')? + start;
    Some(unescape(&line[start..end]))
}

/// Match `<name>body</name>` on a single line.
fn element_text<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let rest = line.strip_prefix(open.as_str())?;
    rest.strip_suffix(close.as_str())
}

/// Body of a one-line element that carries attributes.
fn element_body(line: &str) -> Option<&str> {
    let start = line.find('>')? + 1;
    let end = line.rfind("</")?;
    if end < start {
        return None;
    }
    Some(&line[start..end])
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
