//! Multi-format serializer/deserializer for attribute tables.
//!
//! Two orthogonal axes select a concrete parser: the *schema version*
//! (legacy headerless version 0, single-column version 1, multi-column
//! version 2) and the *encoding* (tagged ASCII, raw binary, XML, CSV).
//! Version is detected from the file; encoding comes from the header
//! block's `encoding` key or the caller's write request.

mod csv;
mod read;
mod scan;
pub mod tags;
mod write;
mod xml;

pub use read::{read_table, read_table_from_slice};
pub use write::{write_table, write_table_to_vec};

use crate::table::TableKind;
use crate::util::{Error, Result};

/// On-disk encoding of the data region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Line-oriented `tag value` header followed by ASCII rows.
    TaggedAscii,
    /// Same header; native-endian binary rows after `tag-BEGIN-DATA`.
    TaggedBinary,
    /// Tag-tree XML (opt-in per kind).
    Xml,
    /// Comma-separated sections (opt-in per kind).
    Csv,
}

impl Encoding {
    /// Name used in diagnostics and the header `encoding` key.
    pub const fn name(self) -> &'static str {
        match self {
            Encoding::TaggedAscii => tags::ENCODING_ASCII,
            Encoding::TaggedBinary => tags::ENCODING_BINARY,
            Encoding::Xml => tags::ENCODING_XML,
            Encoding::Csv => tags::ENCODING_CSV,
        }
    }
}

/// Whether a read establishes cell storage or stops after metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadMode {
    /// Parse header and data; the table is fully loaded.
    Full,
    /// Parse header tags only; `(N, C)` and metadata are established,
    /// cell storage is left unallocated.
    MetadataOnly,
}

/// Fail unless `kind` accepts `encoding`.
pub(crate) fn check_supported(kind: TableKind, encoding: Encoding) -> Result<()> {
    if kind.supports(encoding) {
        Ok(())
    } else {
        Err(Error::UnsupportedEncoding {
            kind: kind.name(),
            encoding: encoding.name(),
        })
    }
}
