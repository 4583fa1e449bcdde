//! Reader: header block, version dispatch, tagged ASCII/binary rows.

use std::fs;
use std::path::Path;

use tracing::warn;

use super::scan::LineScanner;
use super::{csv, tags, xml, check_supported, Encoding, ReadMode};
use crate::table::{
    links_from_coded_text, AttrTable, Cell, HeaderTags, Scale, TableKind,
};
use crate::util::text;
use crate::util::{Error, Result};

/// Read an attribute table from a file.
///
/// The schema version is detected from the file; the encoding comes
/// from the header block's `encoding` key (tagged ASCII when absent).
/// With [`ReadMode::MetadataOnly`] the data region is never consumed
/// and the returned table has no cell storage.
pub fn read_table<C: Cell>(
    path: impl AsRef<Path>,
    kind: TableKind,
    mode: ReadMode,
) -> Result<AttrTable<C>> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    read_table_from_slice(&data, path, kind, mode)
}

/// Read an attribute table from an in-memory file image.
pub fn read_table_from_slice<C: Cell>(
    data: &[u8],
    path: &Path,
    kind: TableKind,
    mode: ReadMode,
) -> Result<AttrTable<C>> {
    let mut scan = LineScanner::new(data, path);
    let mut table = AttrTable::new();

    read_header_block(&mut scan, &mut table.header)?;

    // The encoding key is parser-selection state, not file content.
    let encoding = match table.header.remove(HeaderTags::ENCODING_KEY).as_deref() {
        None | Some(tags::ENCODING_ASCII) => Encoding::TaggedAscii,
        Some(tags::ENCODING_BINARY) => Encoding::TaggedBinary,
        Some(tags::ENCODING_XML) => Encoding::Xml,
        Some(tags::ENCODING_CSV) => Encoding::Csv,
        Some(other) => {
            return Err(scan.format_error(format!("unrecognized encoding '{}'", other)))
        }
    };
    check_supported(kind, encoding)?;
    match encoding {
        Encoding::Xml => return xml::read(&mut scan, table, kind, mode),
        Encoding::Csv => return csv::read(&mut scan, table, kind, mode),
        Encoding::TaggedAscii | Encoding::TaggedBinary => {}
    }

    // Version detection: a file without the version tag is either an
    // XML/CSV document, the RGB legacy version-0 form, or malformed.
    let (save_pos, save_line) = (scan.pos(), scan.line());
    let first = scan
        .next_line()?
        .ok_or_else(|| scan.format_error("empty file"))?;
    let (tag, value) = text::split_tag_line(first);
    if first.trim_start().starts_with("<?xml") {
        check_supported(kind, Encoding::Xml)?;
        return xml::read(&mut scan, table, kind, mode);
    }
    if first.trim_start().starts_with(csv::VERSION_KEY) {
        check_supported(kind, Encoding::Csv)?;
        scan.seek(save_pos, save_line);
        return csv::read(&mut scan, table, kind, mode);
    }
    if tag == tags::FILE_VERSION || tag == tags::FILE_VERSION_ALIAS {
        let version: u32 = value
            .trim()
            .parse()
            .map_err(|_| scan.format_error(format!("bad version '{}'", value)))?;
        match version {
            1 | 2 => read_tagged(&mut scan, table, kind, mode, version, encoding),
            _ => Err(scan.format_error(format!("unrecognized file version {}", version))),
        }
    } else if kind.has_legacy_version0() {
        scan.seek(save_pos, save_line);
        read_version0(&mut scan, table, mode)
    } else {
        Err(scan.format_error(format!(
            "{} file is missing the '{}' tag",
            kind.name(),
            tags::FILE_VERSION
        )))
    }
}

/// Read the optional `BeginHeader` block. Rewinds when absent.
fn read_header_block(scan: &mut LineScanner<'_>, header: &mut HeaderTags) -> Result<()> {
    let (save_pos, save_line) = (scan.pos(), scan.line());
    match scan.next_line()? {
        Some(line) if line.trim() == tags::BEGIN_HEADER => {}
        _ => {
            scan.seek(save_pos, save_line);
            return Ok(());
        }
    }
    loop {
        let line = scan
            .next_line()?
            .ok_or_else(|| scan.format_error("unterminated header block"))?;
        let (mut key, value) = text::split_tag_line(line);
        key = key.strip_prefix('#').unwrap_or(key);
        if key == tags::END_HEADER {
            return Ok(());
        }
        if key == HeaderTags::COMMENT_KEY {
            header.set(key, text::comment_to_display(value));
        } else {
            header.set(key, value);
        }
    }
}

/// Header tags buffered between the version line and `tag-BEGIN-DATA`.
struct PendingTags<'a> {
    num_nodes: Option<usize>,
    num_columns: Option<usize>,
    title: Option<&'a str>,
    column_tags: Vec<(&'a str, &'a str)>,
}

/// Read a version 1 or version 2 tagged file.
fn read_tagged<C: Cell>(
    scan: &mut LineScanner<'_>,
    mut table: AttrTable<C>,
    kind: TableKind,
    mode: ReadMode,
    version: u32,
    encoding: Encoding,
) -> Result<AttrTable<C>> {
    let mut pending = PendingTags {
        num_nodes: None,
        num_columns: None,
        title: None,
        column_tags: Vec::new(),
    };

    // Tags may appear in any order before tag-BEGIN-DATA, so buffer
    // column tags until the shape is known.
    loop {
        let line = scan
            .next_line()?
            .ok_or_else(|| scan.format_error(format!("missing '{}'", tags::BEGIN_DATA)))?;
        let (tag, value) = text::split_tag_line(line);
        match tag {
            tags::BEGIN_DATA => break,
            tags::NUMBER_OF_NODES => {
                pending.num_nodes = Some(parse_count(scan, value)?);
            }
            tags::NUMBER_OF_COLUMNS => {
                if version < 2 {
                    warn!(tag, "column count tag in a version 1 file; ignored");
                } else {
                    pending.num_columns = Some(parse_count(scan, value)?);
                }
            }
            tags::FILE_TITLE => pending.title = Some(value),
            "" => {}
            _ => pending.column_tags.push((tag, value)),
        }
    }

    let num_nodes = pending
        .num_nodes
        .ok_or_else(|| scan.format_error(format!("missing '{}' tag", tags::NUMBER_OF_NODES)))?;
    let num_columns = match version {
        1 => 1,
        _ => pending.num_columns.ok_or_else(|| {
            scan.format_error(format!("missing '{}' tag", tags::NUMBER_OF_COLUMNS))
        })?,
    };

    match mode {
        ReadMode::MetadataOnly => table.set_size_metadata_only(num_nodes, num_columns),
        ReadMode::Full => table.set_size(num_nodes, num_columns)?,
    }
    if let Some(title) = pending.title {
        table.title = title.to_string();
    }
    for (tag, value) in &pending.column_tags {
        apply_column_tag(scan, &mut table, kind, tag, value)?;
    }

    if mode == ReadMode::MetadataOnly {
        return Ok(table);
    }

    match encoding {
        Encoding::TaggedAscii => read_ascii_rows(scan, &mut table, true)?,
        Encoding::TaggedBinary => read_binary_rows(scan, &mut table)?,
        _ => unreachable!("dispatched above"),
    }
    Ok(table)
}

/// Apply one buffered `tag-column-*` (or RGB channel) tag.
fn apply_column_tag<C: Cell>(
    scan: &LineScanner<'_>,
    table: &mut AttrTable<C>,
    kind: TableKind,
    tag: &str,
    value: &str,
) -> Result<()> {
    let rgb_channel = match tag {
        tags::TITLE_RED | tags::COMMENT_RED | tags::SCALE_RED => Some(0usize),
        tags::TITLE_GREEN | tags::COMMENT_GREEN | tags::SCALE_GREEN => Some(1),
        tags::TITLE_BLUE | tags::COMMENT_BLUE | tags::SCALE_BLUE => Some(2),
        _ => None,
    };
    if rgb_channel.is_some() && !kind.has_rgb_channels() {
        warn!(tag, kind = kind.name(), "RGB channel tag on a non-RGB file; ignored");
        return Ok(());
    }

    let is_column_tag = rgb_channel.is_some()
        || matches!(
            tag,
            tags::COLUMN_NAME | tags::COLUMN_COMMENT | tags::COLUMN_STUDY_META_DATA
        );
    if !is_column_tag {
        warn!(tag, "unknown header tag; ignored");
        return Ok(());
    }

    let (index, rest) = text::split_column_value(value)
        .ok_or_else(|| scan.format_error(format!("malformed '{}' tag", tag)))?;
    if index >= table.num_columns() {
        return Err(scan.format_error(format!(
            "'{}' tag references column {} of {}",
            tag,
            index,
            table.num_columns()
        )));
    }
    let meta = table.column_mut(index);
    match tag {
        tags::COLUMN_NAME => meta.name = rest.to_string(),
        tags::COLUMN_COMMENT => meta.comment = text::comment_to_display(rest),
        tags::COLUMN_STUDY_META_DATA => meta.study_links = links_from_coded_text(rest),
        tags::TITLE_RED | tags::TITLE_GREEN | tags::TITLE_BLUE => {
            meta.channels.titles[rgb_channel.unwrap()] = rest.to_string();
        }
        tags::COMMENT_RED | tags::COMMENT_GREEN | tags::COMMENT_BLUE => {
            meta.channels.comments[rgb_channel.unwrap()] = text::comment_to_display(rest);
        }
        tags::SCALE_RED | tags::SCALE_GREEN | tags::SCALE_BLUE => {
            let fields = text::tokenize(rest);
            let (min, max) = match (
                fields.first().and_then(|f| f.parse::<f32>().ok()),
                fields.get(1).and_then(|f| f.parse::<f32>().ok()),
            ) {
                (Some(min), Some(max)) => (min, max),
                _ => return Err(scan.format_error(format!("malformed '{}' tag", tag))),
            };
            meta.channels.scales[rgb_channel.unwrap()] = Scale::new(min, max);
        }
        _ => unreachable!(),
    }
    Ok(())
}

/// ASCII data rows: `vertex f f f ...`, one per vertex, in index order.
/// `with_index` is false only for the legacy version-0 form.
fn read_ascii_rows<C: Cell>(
    scan: &mut LineScanner<'_>,
    table: &mut AttrTable<C>,
    with_index: bool,
) -> Result<()> {
    let num_columns = table.num_columns();
    let leading = usize::from(with_index);
    let expected = leading + num_columns * C::FIELDS;

    for v in 0..table.num_nodes() {
        let line = scan
            .next_line()?
            .ok_or_else(|| scan.format_error(format!("expected {} data rows, found {}", table.num_nodes(), v)))?;
        let fields = text::tokenize(line);
        if fields.len() != expected {
            return Err(scan.format_error(format!(
                "row has {} fields, expected {}",
                fields.len(),
                expected
            )));
        }
        if with_index {
            let index: usize = fields[0]
                .parse()
                .map_err(|_| scan.format_error("bad vertex index"))?;
            if index != v {
                return Err(
                    scan.format_error(format!("vertex index {} out of sequence (row {})", index, v))
                );
            }
        }
        for c in 0..num_columns {
            let start = leading + c * C::FIELDS;
            let cell = C::parse_fields(&fields[start..start + C::FIELDS])
                .ok_or_else(|| scan.format_error("malformed cell value"))?;
            table.set_cell(v, c, cell);
        }
    }
    Ok(())
}

/// Binary rows start at the first byte after the newline that
/// terminates `tag-BEGIN-DATA`.
fn read_binary_rows<C: Cell>(scan: &mut LineScanner<'_>, table: &mut AttrTable<C>) -> Result<()> {
    let mut cursor = scan.remainder();
    let start = scan.pos();
    for v in 0..table.num_nodes() {
        for c in 0..table.num_columns() {
            let cell = C::read_binary(&mut cursor).map_err(|_| {
                Error::format(
                    scan.path(),
                    scan.line(),
                    format!(
                        "binary data truncated at byte {} (vertex {}, column {})",
                        start + (scan.remainder().len() - cursor.len()),
                        v,
                        c
                    ),
                )
            })?;
            table.set_cell(v, c, cell);
        }
    }
    Ok(())
}

/// Legacy version 0: headerless, one data row per line, no vertex
/// index field, single column. `N` is the number of lines.
fn read_version0<C: Cell>(
    scan: &mut LineScanner<'_>,
    mut table: AttrTable<C>,
    mode: ReadMode,
) -> Result<AttrTable<C>> {
    let (save_pos, save_line) = (scan.pos(), scan.line());
    let mut num_nodes = 0;
    while let Some(line) = scan.next_line()? {
        if !line.trim().is_empty() {
            num_nodes += 1;
        }
    }
    if num_nodes == 0 {
        return Err(scan.format_error("file has no data"));
    }

    if mode == ReadMode::MetadataOnly {
        table.set_size_metadata_only(num_nodes, 1);
        return Ok(table);
    }

    scan.seek(save_pos, save_line);
    table.set_size(num_nodes, 1)?;
    let mut v = 0;
    while let Some(line) = scan.next_line()? {
        if line.trim().is_empty() {
            continue;
        }
        let fields = text::tokenize(line);
        if fields.len() != C::FIELDS {
            return Err(scan.format_error(format!(
                "row has {} fields, expected {}",
                fields.len(),
                C::FIELDS
            )));
        }
        let cell = C::parse_fields(&fields)
            .ok_or_else(|| scan.format_error("malformed cell value"))?;
        table.set_cell(v, 0, cell);
        v += 1;
    }
    Ok(table)
}

fn parse_count(scan: &LineScanner<'_>, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| scan.format_error(format!("bad count '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Rgb;
    use std::path::Path;

    fn read_rgb(data: &str, mode: ReadMode) -> Result<AttrTable<Rgb>> {
        read_table_from_slice(data.as_bytes(), Path::new("t.RGB_paint"), TableKind::RgbPaint, mode)
    }

    #[test]
    fn test_legacy_version0_rgb() {
        let table = read_rgb("12 34 56\n78 90 100\n5 6 7\n", ReadMode::Full).unwrap();
        assert_eq!(table.num_nodes(), 3);
        assert_eq!(table.num_columns(), 1);
        assert_eq!(table.cell(0, 0), Rgb::new(12.0, 34.0, 56.0));
        assert_eq!(table.cell(1, 0), Rgb::new(78.0, 90.0, 100.0));
        assert_eq!(table.cell(2, 0), Rgb::new(5.0, 6.0, 7.0));
        // Scales stay at the byte-range default.
        assert_eq!(table.column(0).channels.scales[0], Scale::new(0.0, 255.0));
    }

    #[test]
    fn test_version0_requires_data() {
        assert!(matches!(
            read_rgb("", ReadMode::Full),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_version2_tagged_ascii() {
        let data = "\
tag-version 2
tag-number-of-nodes 2
tag-number-of-columns 2
tag-title test file
tag-column-name 0 first
tag-column-name 1 second
tag-column-comment 1 line one\\nline two
tag-BEGIN-DATA
0 1.5 2.5 3.5 4.5 5.5 6.5
1 7 8 9 10 11 12
";
        let table = read_rgb(data, ReadMode::Full).unwrap();
        assert_eq!(table.num_nodes(), 2);
        assert_eq!(table.num_columns(), 2);
        assert_eq!(table.title, "test file");
        assert_eq!(table.column(0).name, "first");
        assert_eq!(table.column(1).comment, "line one\nline two");
        assert_eq!(table.cell(0, 1), Rgb::new(4.5, 5.5, 6.5));
        assert_eq!(table.cell(1, 0), Rgb::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_metadata_only_skips_data() {
        let data = "\
tag-version 2
tag-number-of-nodes 2
tag-number-of-columns 1
tag-column-name 0 only
tag-BEGIN-DATA
garbage that would fail a full read
";
        let table = read_rgb(data, ReadMode::MetadataOnly).unwrap();
        assert_eq!(table.num_nodes(), 2);
        assert_eq!(table.num_columns(), 1);
        assert_eq!(table.column(0).name, "only");
        assert!(!table.has_data());
    }

    #[test]
    fn test_missing_required_tag() {
        let data = "tag-version 2\ntag-number-of-columns 1\ntag-BEGIN-DATA\n";
        assert!(matches!(
            read_rgb(data, ReadMode::Full),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_row_field_count_mismatch() {
        let data = "\
tag-version 2
tag-number-of-nodes 1
tag-number-of-columns 1
tag-BEGIN-DATA
0 1 2
";
        assert!(matches!(
            read_rgb(data, ReadMode::Full),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn test_vertex_index_out_of_sequence() {
        let data = "\
tag-version 2
tag-number-of-nodes 2
tag-number-of-columns 1
tag-BEGIN-DATA
0 1 2 3
5 4 5 6
";
        let err = read_rgb(data, ReadMode::Full).unwrap_err();
        assert!(err.to_string().contains("out of sequence"));
    }

    #[test]
    fn test_version1_implies_one_column() {
        let data = "\
tag-version 1
tag-number-of-nodes 2
tag-column-name 0 lone
tag-BEGIN-DATA
0 1 2 3
1 4 5 6
";
        let table = read_rgb(data, ReadMode::Full).unwrap();
        assert_eq!(table.num_columns(), 1);
        assert_eq!(table.cell(1, 0), Rgb::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_missing_version_for_non_legacy_kind() {
        let data = "0.5\n0.25\n";
        let err = read_table_from_slice::<f32>(
            data.as_bytes(),
            Path::new("t.metric"),
            TableKind::Metric,
            ReadMode::Full,
        )
        .unwrap_err();
        assert!(err.to_string().contains("tag-version"));
    }

    #[test]
    fn test_header_block_and_scales() {
        let data = "\
BeginHeader
comment a\\nb
configuration_id FIDUCIAL
EndHeader
tag-version 2
tag-number-of-nodes 1
tag-number-of-columns 1
tag-scale-red 0 0 1
tag-scale-green 0 0 1
tag-scale-blue 0 0 1
tag-BEGIN-DATA
0 0.5 0.5 0.5
";
        let table = read_rgb(data, ReadMode::Full).unwrap();
        assert_eq!(table.file_comment(), "a\nb");
        assert_eq!(table.header.configuration_id(), Some("FIDUCIAL"));
        assert_eq!(table.column(0).channels.scales[2], Scale::UNIT);
        // The encoding key is consumed, not stored.
        assert!(!table.header.contains(HeaderTags::ENCODING_KEY));
    }

    #[test]
    fn test_unrecognized_version() {
        let data = "tag-version 9\ntag-BEGIN-DATA\n";
        let err = read_rgb(data, ReadMode::Full).unwrap_err();
        assert!(err.to_string().contains("version"));
    }
}
