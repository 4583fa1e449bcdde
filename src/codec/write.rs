//! Writer for the tagged ASCII and binary encodings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{csv, tags, xml, check_supported, Encoding};
use crate::table::{links_to_coded_text, AttrTable, Cell, HeaderTags, TableKind};
use crate::util::text;
use crate::util::Result;

/// Write an attribute table to a file in the requested encoding.
pub fn write_table<C: Cell>(
    table: &AttrTable<C>,
    path: impl AsRef<Path>,
    kind: TableKind,
    encoding: Encoding,
) -> Result<()> {
    let bytes = write_table_to_vec(table, kind, encoding)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Serialize an attribute table to bytes.
pub fn write_table_to_vec<C: Cell>(
    table: &AttrTable<C>,
    kind: TableKind,
    encoding: Encoding,
) -> Result<Vec<u8>> {
    check_supported(kind, encoding)?;
    match encoding {
        Encoding::Xml => return xml::write(table, kind),
        Encoding::Csv => return csv::write(table, kind),
        Encoding::TaggedAscii | Encoding::TaggedBinary => {}
    }

    let mut out = Vec::new();
    write_header_block(table, encoding, &mut out)?;
    write_tags(table, kind, &mut out)?;

    match encoding {
        Encoding::TaggedAscii => {
            let mut row = String::new();
            for v in 0..table.num_nodes() {
                row.clear();
                row.push_str(&v.to_string());
                for c in 0..table.num_columns() {
                    table.cell(v, c).write_fields(&mut row);
                }
                row.push('\n');
                out.extend_from_slice(row.as_bytes());
            }
        }
        Encoding::TaggedBinary => {
            for v in 0..table.num_nodes() {
                for c in 0..table.num_columns() {
                    table.cell(v, c).write_binary(&mut out)?;
                }
            }
        }
        _ => unreachable!(),
    }
    Ok(out)
}

fn write_header_block<C: Cell>(
    table: &AttrTable<C>,
    encoding: Encoding,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut text = String::new();
    text.push_str(tags::BEGIN_HEADER);
    text.push('\n');
    for (key, value) in table.header.iter() {
        // The encoding key reflects this write, not stored state.
        if key == HeaderTags::ENCODING_KEY {
            continue;
        }
        if key == HeaderTags::COMMENT_KEY {
            text.push_str(&format!("{} {}\n", key, text::comment_to_storage(value)));
        } else {
            text.push_str(&format!("{} {}\n", key, value));
        }
    }
    text.push_str(&format!("{} {}\n", HeaderTags::ENCODING_KEY, encoding.name()));
    text.push_str(tags::END_HEADER);
    text.push('\n');
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

fn write_tags<C: Cell>(table: &AttrTable<C>, kind: TableKind, out: &mut Vec<u8>) -> Result<()> {
    let mut text = String::new();
    text.push_str(&format!("{} 2\n", tags::FILE_VERSION));
    text.push_str(&format!("{} {}\n", tags::NUMBER_OF_NODES, table.num_nodes()));
    text.push_str(&format!(
        "{} {}\n",
        tags::NUMBER_OF_COLUMNS,
        table.num_columns()
    ));
    if !table.title.is_empty() {
        text.push_str(&format!("{} {}\n", tags::FILE_TITLE, table.title));
    }

    for (i, meta) in table.columns().iter().enumerate() {
        text.push_str(&format!("{} {} {}\n", tags::COLUMN_NAME, i, meta.name));
        if !meta.comment.is_empty() {
            text.push_str(&format!(
                "{} {} {}\n",
                tags::COLUMN_COMMENT,
                i,
                text::comment_to_storage(&meta.comment)
            ));
        }
        if !meta.study_links.is_empty() {
            text.push_str(&format!(
                "{} {} {}\n",
                tags::COLUMN_STUDY_META_DATA,
                i,
                links_to_coded_text(&meta.study_links)
            ));
        }
        if kind.has_rgb_channels() {
            let ch = &meta.channels;
            let title_tags = [tags::TITLE_RED, tags::TITLE_GREEN, tags::TITLE_BLUE];
            let comment_tags = [tags::COMMENT_RED, tags::COMMENT_GREEN, tags::COMMENT_BLUE];
            let scale_tags = [tags::SCALE_RED, tags::SCALE_GREEN, tags::SCALE_BLUE];
            for k in 0..3 {
                if !ch.titles[k].is_empty() {
                    text.push_str(&format!("{} {} {}\n", title_tags[k], i, ch.titles[k]));
                }
                if !ch.comments[k].is_empty() {
                    text.push_str(&format!(
                        "{} {} {}\n",
                        comment_tags[k],
                        i,
                        text::comment_to_storage(&ch.comments[k])
                    ));
                }
                text.push_str(&format!(
                    "{} {} {} {}\n",
                    scale_tags[k], i, ch.scales[k].min, ch.scales[k].max
                ));
            }
        }
    }
    text.push_str(tags::BEGIN_DATA);
    text.push('\n');
    out.extend_from_slice(text.as_bytes());
    Ok(())
}
