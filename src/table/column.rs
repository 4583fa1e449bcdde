//! Per-column metadata: name, comment, study links, RGB channel scaling.

use smallvec::SmallVec;

/// Opaque bibliographic provenance link attached to a column.
///
/// Fields are never interpreted; they are carried for provenance only.
/// The coded single-line form is `key=value` pairs joined by `;`, with
/// multiple links in a set joined by `|`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StudyLink {
    pub pubmed_id: String,
    pub table_number: String,
    pub table_sub_header: String,
    pub figure_number: String,
    pub panel: String,
    pub page_number: String,
    pub page_reference_number: String,
    pub page_reference_sub_header: String,
}

impl StudyLink {
    /// Create a link carrying just a PubMed id.
    pub fn with_pubmed_id(pubmed_id: impl Into<String>) -> Self {
        Self {
            pubmed_id: pubmed_id.into(),
            ..Self::default()
        }
    }

    /// Serialize to the coded single-line text form.
    pub fn to_coded_text(&self) -> String {
        [
            ("pubMedID", &self.pubmed_id),
            ("tableNumber", &self.table_number),
            ("tableSubHeaderNumber", &self.table_sub_header),
            ("figureNumber", &self.figure_number),
            ("panelNumberOrLetter", &self.panel),
            ("pageNumber", &self.page_number),
            ("pageReferencePageNumber", &self.page_reference_number),
            ("pageReferenceSubHeaderNumber", &self.page_reference_sub_header),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(";")
    }

    /// Parse the coded text form. Unknown keys are ignored.
    pub fn from_coded_text(text: &str) -> Self {
        let mut link = Self::default();
        for pair in text.split(';') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.to_string();
            match key {
                "pubMedID" => link.pubmed_id = value,
                "tableNumber" => link.table_number = value,
                "tableSubHeaderNumber" => link.table_sub_header = value,
                "figureNumber" => link.figure_number = value,
                "panelNumberOrLetter" => link.panel = value,
                "pageNumber" => link.page_number = value,
                "pageReferencePageNumber" => link.page_reference_number = value,
                "pageReferenceSubHeaderNumber" => link.page_reference_sub_header = value,
                _ => {}
            }
        }
        link
    }
}

/// Ordered set of study links.
pub type StudyLinkSet = SmallVec<[StudyLink; 2]>;

/// Serialize a link set to one line (`|`-separated coded links).
pub fn links_to_coded_text(links: &StudyLinkSet) -> String {
    links
        .iter()
        .map(StudyLink::to_coded_text)
        .collect::<Vec<_>>()
        .join("|")
}

/// Parse a `|`-separated coded link set line.
pub fn links_from_coded_text(text: &str) -> StudyLinkSet {
    text.split('|')
        .filter(|s| !s.trim().is_empty())
        .map(StudyLink::from_coded_text)
        .collect()
}

/// One channel's display scaling range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    pub min: f32,
    pub max: f32,
}

impl Default for Scale {
    /// Legacy byte-range scaling.
    fn default() -> Self {
        Self { min: 0.0, max: 255.0 }
    }
}

impl Scale {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Normalized `[0, 1]` scaling, used by imports that detect it.
    pub const UNIT: Self = Self::new(0.0, 1.0);
}

/// Red/green/blue channel index, used by RGB channel metadata accessors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
}

/// Per-channel titles, comments and scales; meaningful for RGB-style
/// tables only, carried (and defaulted) elsewhere so metadata vectors
/// stay aligned with the column count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelMeta {
    pub titles: [String; 3],
    pub comments: [String; 3],
    pub scales: [Scale; 3],
}

/// Metadata record for one column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnMetadata {
    /// Short human label; unique-advisory, never unique-enforced.
    pub name: String,
    /// Free text, newline-preserving.
    pub comment: String,
    /// Ordered provenance links.
    pub study_links: StudyLinkSet,
    /// RGB channel metadata (defaults for non-RGB kinds).
    pub channels: ChannelMeta,
}

impl ColumnMetadata {
    /// Create metadata with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append text to the comment.
    pub fn append_comment(&mut self, text: &str) {
        self.comment.push_str(text);
    }

    /// Prepend text to the comment.
    pub fn prepend_comment(&mut self, text: &str) {
        self.comment.insert_str(0, text);
    }

    /// Reset to default metadata (empty name/comment/links, default scales).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
