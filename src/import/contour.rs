//! MD-Plot and Neurolucida contour import.
//!
//! Both produce a set of section-tagged 2-D contours; the caller
//! chooses append-or-replace when folding an import into an existing
//! set.
//!
//! MD-Plot grammar (line oriented, `#` comments, `\` continuation):
//! `SECTION <n>` restarts vertex numbering, `ZVALUE <z>` tags following
//! vertices, `V <x> <y>` adds a vertex, `L <style> <color> <width>
//! <v...>` strings vertices into a contour. Neurolucida files are an
//! XML tree of `<contour>` elements holding `<point>` elements with
//! `x`/`y`/`sid` attributes.

use std::path::Path;

use tracing::{info, warn};

use super::read_text;
use crate::util::text;
use crate::util::{Error, Result};

/// One planar contour in a numbered section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub section: i32,
    pub points: Vec<(f32, f32)>,
}

impl Contour {
    pub fn new(section: i32) -> Self {
        Self {
            section,
            points: Vec::new(),
        }
    }
}

/// An ordered collection of contours.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContourSet {
    contours: Vec<Contour>,
}

impl ContourSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn push(&mut self, contour: Contour) {
        self.contours.push(contour);
    }

    /// Fold an imported set into this one: append its contours, or
    /// replace the whole set.
    pub fn merge(&mut self, incoming: ContourSet, append: bool) {
        if append {
            self.contours.extend(incoming.contours);
        } else {
            self.contours = incoming.contours;
        }
    }
}

/// Read an MD-Plot file into a contour set.
pub fn import_md_plot(path: impl AsRef<Path>) -> Result<ContourSet> {
    let path = path.as_ref();
    let content = read_text(path)?;

    // Strip comments and splice continuation lines first.
    let mut statements: Vec<(usize, String)> = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (lineno, raw) in content.lines().enumerate() {
        let clean = raw.split('#').next().unwrap_or_default().trim().to_string();
        if clean.is_empty() {
            continue;
        }
        let (continued, body) = match clean.strip_suffix('\\') {
            Some(body) => (true, body.trim_end().to_string()),
            None => (false, clean),
        };
        match pending.take() {
            Some((start, mut acc)) => {
                acc.push(' ');
                acc.push_str(&body);
                if continued {
                    pending = Some((start, acc));
                } else {
                    statements.push((start, acc));
                }
            }
            None => {
                if continued {
                    pending = Some((lineno, body));
                } else {
                    statements.push((lineno, body));
                }
            }
        }
    }
    if let Some((start, acc)) = pending {
        statements.push((start, acc));
    }

    let mut set = ContourSet::new();
    let mut vertices: Vec<(f32, f32, i32)> = Vec::new();
    let mut vertex_offset = 0usize;
    let mut z_value = 0i32;
    for (lineno, statement) in &statements {
        let fields = text::tokenize(statement);
        let (key, rest) = match fields.split_first() {
            Some(split) => split,
            None => continue,
        };
        match *key {
            "SECTION" => {
                // Vertex indices restart at one in each section.
                vertex_offset = vertices.len();
                z_value = 0;
            }
            "ZVALUE" => {
                z_value = rest
                    .first()
                    .and_then(|f| f.parse().ok())
                    .ok_or_else(|| Error::format(path, *lineno as u64 + 1, "malformed ZVALUE"))?;
            }
            "V" => {
                if rest.len() < 2 {
                    return Err(Error::format(path, *lineno as u64 + 1, "malformed vertex"));
                }
                let x: f32 = rest[0]
                    .parse()
                    .map_err(|_| Error::format(path, *lineno as u64 + 1, "malformed vertex"))?;
                let y: f32 = rest[1]
                    .parse()
                    .map_err(|_| Error::format(path, *lineno as u64 + 1, "malformed vertex"))?;
                vertices.push((x, y, z_value));
            }
            "L" => {
                if rest.len() < 4 {
                    return Err(Error::format(path, *lineno as u64 + 1, "malformed line"));
                }
                let mut contour: Option<Contour> = None;
                for field in &rest[3..] {
                    let index: i64 = field.parse().map_err(|_| {
                        Error::format(path, *lineno as u64 + 1, "malformed line vertex")
                    })?;
                    // One-based within the current section.
                    let resolved = index - 1 + vertex_offset as i64;
                    if resolved < 0 || resolved as usize >= vertices.len() {
                        warn!(
                            path = %path.display(),
                            index,
                            "contour line references an unknown vertex; skipped"
                        );
                        continue;
                    }
                    let (x, y, z) = vertices[resolved as usize];
                    let contour = contour.get_or_insert_with(|| Contour::new(z));
                    contour.points.push((x, y));
                }
                if let Some(contour) = contour {
                    set.push(contour);
                }
            }
            "P" => {} // isolated markers carry no contour data
            _ => {}
        }
    }
    info!(path = %path.display(), contours = set.len(), "imported MD-Plot contours");
    Ok(set)
}

/// Read a Neurolucida XML file into a contour set.
pub fn import_neurolucida(path: impl AsRef<Path>) -> Result<ContourSet> {
    let path = path.as_ref();
    let content = read_text(path)?;

    let mut set = ContourSet::new();
    let mut current: Option<Contour> = None;
    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.starts_with("<contour") {
            current = Some(Contour::new(0));
        } else if line.starts_with("</contour") {
            if let Some(contour) = current.take() {
                if !contour.points.is_empty() {
                    set.push(contour);
                }
            }
        } else if line.starts_with("<point") {
            let contour = match current.as_mut() {
                Some(c) => c,
                // points outside a contour are markers
                None => continue,
            };
            let x = xml_attribute(line, "x")
                .and_then(|v| v.parse::<f32>().ok())
                .ok_or_else(|| Error::format(path, lineno as u64 + 1, "malformed point"))?;
            let y = xml_attribute(line, "y")
                .and_then(|v| v.parse::<f32>().ok())
                .ok_or_else(|| Error::format(path, lineno as u64 + 1, "malformed point"))?;
            // Section ids look like "S17".
            if contour.points.is_empty() {
                if let Some(section) = xml_attribute(line, "sid")
                    .and_then(|sid| sid.strip_prefix('S').map(str::to_string))
                    .and_then(|s| s.parse().ok())
                {
                    contour.section = section;
                }
            }
            contour.points.push((x, y));
        }
    }
    info!(path = %path.display(), contours = set.len(), "imported Neurolucida contours");
    Ok(set)
}

fn xml_attribute(line: &str, name: &str) -> Option<String> {
    let marker = format!("{}=\"", name);
    let start = line.find(&marker)? + marker.len();
    let end = line[start..].find('"')? + start;
    Some(line[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_md_plot_sections_and_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "# traced plate 12\n\
             SECTION 1\n\
             ZVALUE 4\n\
             V 1.0 2.0\n\
             V 3.0 4.0\n\
             L 0 1 1.0 1 2\n\
             SECTION 2\n\
             ZVALUE 5\n\
             V 9.0 9.0\n\
             V 8.0 8.0\n\
             L 0 1 1.0 1 2\n"
        )
        .unwrap();
        let set = import_md_plot(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.contours()[0].section, 4);
        assert_eq!(set.contours()[0].points, vec![(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(set.contours()[1].section, 5);
        assert_eq!(set.contours()[1].points, vec![(9.0, 9.0), (8.0, 8.0)]);
    }

    #[test]
    fn test_md_plot_continuation_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "SECTION 1\nZVALUE 2\nV 0 0\nV 1 0\nV 1 1\nL 0 1 1.0 \\\n1 2 \\\n3\n"
        )
        .unwrap();
        let set = import_md_plot(file.path()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.contours()[0].points.len(), 3);
    }

    #[test]
    fn test_neurolucida_contours() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "<?xml version=\"1.0\"?>\n<mbf>\n\
             <contour name=\"outline\">\n\
             <point x=\"1.5\" y=\"2.5\" z=\"0\" sid=\"S3\"/>\n\
             <point x=\"2.5\" y=\"3.5\" z=\"0\" sid=\"S3\"/>\n\
             </contour>\n</mbf>\n"
        )
        .unwrap();
        let set = import_neurolucida(file.path()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.contours()[0].section, 3);
        assert_eq!(set.contours()[0].points, vec![(1.5, 2.5), (2.5, 3.5)]);
    }

    #[test]
    fn test_merge_append_and_replace() {
        let mut dest = ContourSet::new();
        dest.push(Contour::new(1));
        let mut incoming = ContourSet::new();
        incoming.push(Contour::new(2));

        let mut appended = dest.clone();
        appended.merge(incoming.clone(), true);
        assert_eq!(appended.len(), 2);

        let mut replaced = dest;
        replaced.merge(incoming, false);
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced.contours()[0].section, 2);
    }
}
