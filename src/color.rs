//! Name-keyed color table with deterministic synthesis.
//!
//! Label importers reference colors by name; names missing from the
//! table are given a synthesized color derived from a hash of the name,
//! so the same name maps to the same color in every session.

use smallvec::SmallVec;
use tracing::debug;

/// An ordered `name -> (r, g, b)` mapping. Insertion order is kept for
/// display; lookups are by exact name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    entries: Vec<(String, (u8, u8, u8))>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<(u8, u8, u8)> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rgb)| *rgb)
    }

    /// Insert or replace an explicit assignment.
    pub fn set(&mut self, name: impl Into<String>, rgb: (u8, u8, u8)) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = rgb,
            None => self.entries.push((name, rgb)),
        }
    }

    /// Look up `name`, synthesizing and recording a color when absent.
    /// Names already mapped are never re-synthesized.
    pub fn ensure(&mut self, name: &str) -> (u8, u8, u8) {
        if let Some(rgb) = self.get(name) {
            return rgb;
        }
        let rgb = synthesize(name);
        debug!(name, r = rgb.0, g = rgb.1, b = rgb.2, "synthesized label color");
        self.entries.push((name.to_string(), rgb));
        rgb
    }

    /// Record every name in `names` that is not yet mapped. Returns the
    /// names that were synthesized.
    pub fn ensure_all<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> SmallVec<[String; 4]> {
        let mut added = SmallVec::new();
        for name in names {
            if !self.contains(name) {
                self.ensure(name);
                added.push(name.to_string());
            }
        }
        added
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, (u8, u8, u8))> {
        self.entries.iter().map(|(n, rgb)| (n.as_str(), *rgb))
    }
}

/// Deterministic name-to-color mapping: FNV-1a over the name selects a
/// position on the hue wheel; saturation and value stay in a band that
/// keeps labels distinguishable against a dark surface.
fn synthesize(name: &str) -> (u8, u8, u8) {
    let hash = fnv1a(name.as_bytes());
    let hue = (hash % 360) as f32;
    let saturation = 0.55 + 0.35 * (((hash >> 16) % 128) as f32 / 127.0);
    let value = 0.65 + 0.3 * (((hash >> 32) % 128) as f32 / 127.0);
    hsv_to_rgb(hue, saturation, value)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn hsv_to_rgb(hue: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}
