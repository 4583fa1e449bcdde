//! Comma-separated encoding for the kinds that opt in to it.
//!
//! Layout: a `csv-version` line, metadata records (`kind`, `nodes`,
//! `columns`, `title`, `header`, `column`), a bare `data` line, then
//! one record per vertex. Fields containing commas, quotes, or leading
//! whitespace are double-quoted; embedded quotes are doubled. Comments
//! keep their storage encoding so every record stays on one line.

use super::scan::LineScanner;
use super::ReadMode;
use crate::table::{links_from_coded_text, links_to_coded_text, AttrTable, Cell, TableKind};
use crate::util::text;
use crate::util::Result;

/// First field of the first record; also used for format sniffing.
pub(crate) const VERSION_KEY: &str = "csv-version";

const DATA_MARKER: &str = "data";

pub(crate) fn write<C: Cell>(table: &AttrTable<C>, kind: TableKind) -> Result<Vec<u8>> {
    let mut out = String::new();
    push_record(&mut out, &[VERSION_KEY, "1"]);
    push_record(&mut out, &["kind", kind.registry_key()]);
    push_record(&mut out, &["nodes", &table.num_nodes().to_string()]);
    push_record(&mut out, &["columns", &table.num_columns().to_string()]);
    if !table.title.is_empty() {
        push_record(&mut out, &["title", &table.title]);
    }
    for (key, value) in table.header.iter() {
        push_record(&mut out, &["header", key, &text::comment_to_storage(value)]);
    }
    for (i, meta) in table.columns().iter().enumerate() {
        let index = i.to_string();
        push_record(&mut out, &["column", &index, "name", &meta.name]);
        if !meta.comment.is_empty() {
            push_record(
                &mut out,
                &["column", &index, "comment", &text::comment_to_storage(&meta.comment)],
            );
        }
        if !meta.study_links.is_empty() {
            push_record(
                &mut out,
                &["column", &index, "study-links", &links_to_coded_text(&meta.study_links)],
            );
        }
    }

    out.push_str(DATA_MARKER);
    out.push('\n');
    let mut row = String::new();
    for v in 0..table.num_nodes() {
        row.clear();
        for c in 0..table.num_columns() {
            table.cell(v, c).write_fields(&mut row);
        }
        let fields: Vec<&str> = row.split_whitespace().collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    Ok(out.into_bytes())
}

pub(crate) fn read<C: Cell>(
    scan: &mut LineScanner<'_>,
    mut table: AttrTable<C>,
    kind: TableKind,
    mode: ReadMode,
) -> Result<AttrTable<C>> {
    let first = scan
        .next_line()?
        .ok_or_else(|| scan.format_error("empty document"))?;
    let fields = split_record(first);
    if fields.first().map(String::as_str) != Some(VERSION_KEY) {
        return Err(scan.format_error(format!("expected a '{}' record", VERSION_KEY)));
    }

    let mut nodes = None;
    let mut columns = None;
    let mut sized = false;
    loop {
        let line = scan
            .next_line()?
            .ok_or_else(|| scan.format_error(format!("missing '{}' record", DATA_MARKER)))?;
        if line.trim().is_empty() {
            continue;
        }
        if line.trim() == DATA_MARKER {
            break;
        }
        let fields = split_record(line);
        match fields[0].as_str() {
            "kind" => {
                let doc_kind = fields.get(1).map(String::as_str).unwrap_or_default();
                if doc_kind != kind.registry_key() {
                    return Err(scan.format_error(format!(
                        "document holds a {} table, not {}",
                        doc_kind,
                        kind.registry_key()
                    )));
                }
            }
            "nodes" => nodes = parse_count_field(scan, &fields)?,
            "columns" => columns = parse_count_field(scan, &fields)?,
            "title" => {
                table.title = fields.get(1).cloned().unwrap_or_default();
            }
            "header" => {
                let key = fields
                    .get(1)
                    .ok_or_else(|| scan.format_error("header record without a key"))?;
                let value = fields.get(2).map(String::as_str).unwrap_or_default();
                table.header.set(key, text::comment_to_display(value));
            }
            "column" => {
                if !sized {
                    let (n, c) = match (nodes, columns) {
                        (Some(n), Some(c)) => (n, c),
                        _ => {
                            return Err(scan.format_error(
                                "column record before the nodes/columns records",
                            ))
                        }
                    };
                    match mode {
                        ReadMode::MetadataOnly => table.set_size_metadata_only(n, c),
                        ReadMode::Full => table.set_size(n, c)?,
                    }
                    sized = true;
                }
                apply_column_record(scan, &mut table, &fields)?;
            }
            other => {
                return Err(scan.format_error(format!("unrecognized record '{}'", other)));
            }
        }
    }

    if !sized {
        let (n, c) = match (nodes, columns) {
            (Some(n), Some(c)) => (n, c),
            _ => return Err(scan.format_error("missing nodes/columns records")),
        };
        match mode {
            ReadMode::MetadataOnly => table.set_size_metadata_only(n, c),
            ReadMode::Full => table.set_size(n, c)?,
        }
    }
    if mode == ReadMode::MetadataOnly {
        return Ok(table);
    }

    let expected = table.num_columns() * C::FIELDS;
    for v in 0..table.num_nodes() {
        let line = scan.next_line()?.ok_or_else(|| {
            scan.format_error(format!("expected {} data records, found {}", table.num_nodes(), v))
        })?;
        let fields = split_record(line);
        if fields.len() != expected {
            return Err(scan.format_error(format!(
                "record has {} fields, expected {}",
                fields.len(),
                expected
            )));
        }
        let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
        for c in 0..table.num_columns() {
            let start = c * C::FIELDS;
            let cell = C::parse_fields(&refs[start..start + C::FIELDS])
                .ok_or_else(|| scan.format_error("malformed cell value"))?;
            table.set_cell(v, c, cell);
        }
    }
    Ok(table)
}

fn apply_column_record<C: Cell>(
    scan: &LineScanner<'_>,
    table: &mut AttrTable<C>,
    fields: &[String],
) -> Result<()> {
    let index: usize = fields
        .get(1)
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| scan.format_error("malformed column record"))?;
    if index >= table.num_columns() {
        return Err(scan.format_error(format!(
            "column record references column {} of {}",
            index,
            table.num_columns()
        )));
    }
    let value = fields.get(3).map(String::as_str).unwrap_or_default();
    let meta = table.column_mut(index);
    match fields.get(2).map(String::as_str) {
        Some("name") => meta.name = value.to_string(),
        Some("comment") => meta.comment = text::comment_to_display(value),
        Some("study-links") => meta.study_links = links_from_coded_text(value),
        _ => return Err(scan.format_error("malformed column record")),
    }
    Ok(())
}

fn parse_count_field(scan: &LineScanner<'_>, fields: &[String]) -> Result<Option<usize>> {
    fields
        .get(1)
        .and_then(|f| f.trim().parse().ok())
        .map(Some)
        .ok_or_else(|| scan.format_error(format!("bad count in '{}' record", fields[0])))
}

fn push_record(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote_field(field));
    }
    out.push('\n');
}

fn quote_field(field: &str) -> String {
    let needs_quotes = field.contains(',')
        || field.contains('"')
        || field.starts_with(char::is_whitespace)
        || field.ends_with(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split one CSV record, honoring double-quoted fields.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}
