//! Tag string constants for the tagged line grammar.

/// Opens the file-level header block.
pub const BEGIN_HEADER: &str = "BeginHeader";
/// Closes the file-level header block.
pub const END_HEADER: &str = "EndHeader";

/// Schema version selector; absence selects the legacy version-0 parser.
pub const FILE_VERSION: &str = "tag-version";
/// Spelling written by some older tools; accepted on read.
pub const FILE_VERSION_ALIAS: &str = "tag-file-version";
/// File title.
pub const FILE_TITLE: &str = "tag-title";
/// Terminates the header tag region; data rows follow.
pub const BEGIN_DATA: &str = "tag-BEGIN-DATA";

/// Vertex count `N`.
pub const NUMBER_OF_NODES: &str = "tag-number-of-nodes";
/// Column count `C` (version 2 only; version 1 implies one column).
pub const NUMBER_OF_COLUMNS: &str = "tag-number-of-columns";

/// `tag-column-name <idx> <text>`
pub const COLUMN_NAME: &str = "tag-column-name";
/// `tag-column-comment <idx> <storage-encoded text>`
pub const COLUMN_COMMENT: &str = "tag-column-comment";
/// `tag-column-study-meta-data <idx> <coded link set>`
pub const COLUMN_STUDY_META_DATA: &str = "tag-column-study-meta-data";

// RGB channel tags (RGB paint kind only)
pub const TITLE_RED: &str = "tag-title-red";
pub const TITLE_GREEN: &str = "tag-title-green";
pub const TITLE_BLUE: &str = "tag-title-blue";
pub const COMMENT_RED: &str = "tag-comment-red";
pub const COMMENT_GREEN: &str = "tag-comment-green";
pub const COMMENT_BLUE: &str = "tag-comment-blue";
pub const SCALE_RED: &str = "tag-scale-red";
pub const SCALE_GREEN: &str = "tag-scale-green";
pub const SCALE_BLUE: &str = "tag-scale-blue";

/// `encoding` header values
pub const ENCODING_ASCII: &str = "ASCII";
pub const ENCODING_BINARY: &str = "BINARY";
pub const ENCODING_XML: &str = "XML";
pub const ENCODING_CSV: &str = "COMMA_SEPARATED_VALUE_FILE";
