//! Minimal surface geometry used by the derivations: a fiducial
//! coordinate list with a hemisphere tag, and foci (tagged 3-D points).

use glam::Vec3;

/// Which hemisphere (or combination) a surface or focus belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Structure {
    Left,
    Right,
    Both,
    #[default]
    Other,
}

impl Structure {
    /// True when foci tagged `self` may be used directly on a surface
    /// tagged `surface`.
    pub fn matches(self, surface: Structure) -> bool {
        self == surface || self == Structure::Both || surface == Structure::Both
    }
}

/// A fiducial surface: one coordinate per vertex plus a hemisphere tag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Surface {
    coords: Vec<Vec3>,
    pub structure: Structure,
}

impl Surface {
    pub fn new(coords: Vec<Vec3>, structure: Structure) -> Self {
        Self { coords, structure }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn vertex(&self, v: usize) -> Vec3 {
        self.coords[v]
    }

    #[inline]
    pub fn coords(&self) -> &[Vec3] {
        &self.coords
    }
}

/// A focus: a 3-D point with a class tag, a hemisphere tag, and an
/// optional key into a [`crate::color::ColorTable`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Focus {
    pub position: Vec3,
    pub class: String,
    pub structure: Structure,
    /// Color-table key; callers fall back to a foreground color when
    /// absent or unmapped.
    pub color_name: Option<String>,
}

impl Focus {
    pub fn new(position: Vec3, class: impl Into<String>) -> Self {
        Self {
            position,
            class: class.into(),
            structure: Structure::default(),
            color_name: None,
        }
    }

    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.structure = structure;
        self
    }

    pub fn with_color(mut self, name: impl Into<String>) -> Self {
        self.color_name = Some(name.into());
        self
    }
}
