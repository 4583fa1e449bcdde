//! Foci-uncertainty to RGB derivation.
//!
//! Paints each surface vertex by how many foci *classes* have a focus
//! nearby, producing an uncertainty overlay: one class paints the
//! focus color (whitened inside the middle radius), two classes mix,
//! more than two paint dark gray.

use glam::Vec3;
use tracing::{debug, info};

use crate::color::ColorTable;
use crate::surface::{Focus, Structure, Surface};
use crate::table::{ColumnMetadata, Rgb, RgbPaintTable, Scale};
use crate::util::{check_cancelled, Error, ProgressProbe, Result};

/// How often the progress probe is polled, in vertices.
const PROBE_INTERVAL: usize = 256;

/// Search radii: a focus counts when its distance to the vertex lies in
/// `[lower, upper]`; inside `middle` the single-focus color is whitened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UncertaintyLimits {
    pub lower: f32,
    pub middle: f32,
    pub upper: f32,
}

impl UncertaintyLimits {
    pub fn new(lower: f32, middle: f32, upper: f32) -> Self {
        Self { lower, middle, upper }
    }
}

/// Parameters of the derivation beyond the surface and foci set.
#[derive(Clone, Debug)]
pub struct FociToRgbOptions<'a> {
    pub limits: UncertaintyLimits,
    /// Used when a focus has no color, or its key is unmapped.
    pub foreground: (u8, u8, u8),
    /// When set, foci tagged with the opposite hemisphere are ignored;
    /// when clear they are reflected across the X axis instead.
    pub correct_hemisphere_only: bool,
    pub colors: &'a ColorTable,
    /// Name given to the produced column.
    pub column_name: String,
}

/// Derive an RGB column from foci uncertainty.
///
/// The result goes to column `column` of `table`, or a newly appended
/// column when `column` is `None` or out of range; an empty table is
/// first sized to the surface. The column index used is returned. The
/// probe is polled every few hundred vertices; cancellation leaves the
/// table unchanged.
pub fn foci_uncertainty_to_rgb(
    surface: &Surface,
    foci: &[Focus],
    table: &mut RgbPaintTable,
    column: Option<usize>,
    options: &FociToRgbOptions<'_>,
    probe: &mut dyn ProgressProbe,
) -> Result<usize> {
    let limits = options.limits;
    if !(limits.lower <= limits.middle && limits.middle <= limits.upper) {
        return Err(Error::PolicyViolation(format!(
            "uncertainty limits must be ordered: {} <= {} <= {}",
            limits.lower, limits.middle, limits.upper
        )));
    }
    let num_nodes = surface.num_nodes();
    if num_nodes == 0 {
        return Err(Error::PolicyViolation("surface has no coordinates".to_string()));
    }
    if !table.is_empty() && table.num_nodes() != num_nodes {
        return Err(Error::shape(table.num_nodes(), num_nodes));
    }

    // Resolve each usable focus to a position and color up front.
    // Opposite-hemisphere foci are dropped or X-reflected per options.
    let mut placed: Vec<(Vec3, usize, Rgb)> = Vec::with_capacity(foci.len());
    let mut classes: Vec<&str> = Vec::new();
    for focus in foci {
        let position = if focus.structure.matches(surface.structure) {
            focus.position
        } else if options.correct_hemisphere_only {
            continue;
        } else {
            Vec3::new(-focus.position.x, focus.position.y, focus.position.z)
        };
        let class = match classes.iter().position(|c| *c == focus.class) {
            Some(i) => i,
            None => {
                classes.push(&focus.class);
                classes.len() - 1
            }
        };
        let (r, g, b) = focus
            .color_name
            .as_deref()
            .and_then(|name| options.colors.get(name))
            .unwrap_or(options.foreground);
        placed.push((position, class, Rgb::new(r as f32, g as f32, b as f32)));
    }
    debug!(
        foci = placed.len(),
        classes = classes.len(),
        dropped = foci.len() - placed.len(),
        "foci placed for uncertainty mapping"
    );

    let upper_sq = limits.upper * limits.upper;
    let mut cells: Vec<Rgb> = Vec::with_capacity(num_nodes);
    let mut nearest: Vec<Option<(usize, f32)>> = vec![None; classes.len()];
    for v in 0..num_nodes {
        if v % PROBE_INTERVAL == 0 {
            check_cancelled(probe, v, num_nodes)?;
        }
        let pos = surface.vertex(v);

        // Nearest focus per class, within the upper radius.
        nearest.iter_mut().for_each(|n| *n = None);
        for (i, (fpos, class, _)) in placed.iter().enumerate() {
            let dist_sq = fpos.distance_squared(pos);
            if dist_sq < upper_sq
                && nearest[*class].map_or(true, |(_, best)| dist_sq < best)
            {
                nearest[*class] = Some((i, dist_sq));
            }
        }

        let mut near: Vec<(usize, f32)> = Vec::new();
        for entry in &nearest {
            if let Some((i, dist_sq)) = entry {
                let dist = dist_sq.sqrt();
                if dist >= limits.lower && dist <= limits.upper {
                    near.push((*i, dist));
                }
            }
        }

        let mut color = match near.len() {
            0 => Rgb::default(),
            1 => {
                let (i, dist) = near[0];
                let mut c = placed[i].2;
                if dist < limits.middle {
                    // halo: whiten toward the surface background
                    c.r = 127.5 + 0.5 * c.r;
                    c.g = 127.5 + 0.5 * c.g;
                    c.b = 127.5 + 0.5 * c.b;
                }
                c
            }
            2 => {
                let c1 = placed[near[0].0].2;
                let c2 = placed[near[1].0].2;
                let (r, g, b) = (c1.r + c2.r, c1.g + c2.g, c1.b + c2.b);
                let m = r.max(g).max(b);
                if m > 0.0 {
                    Rgb::new(255.0 * r / m, 255.0 * g / m, 255.0 * b / m)
                } else {
                    Rgb::default()
                }
            }
            _ => Rgb::new(50.0, 50.0, 50.0),
        };
        color.r = color.r.min(255.0);
        color.g = color.g.min(255.0);
        color.b = color.b.min(255.0);
        cells.push(color);
    }
    check_cancelled(probe, num_nodes, num_nodes)?;

    // Commit only after the full column computed without cancellation.
    let mut meta = ColumnMetadata::named(&options.column_name);
    meta.comment = "Created from foci uncertainty".to_string();
    meta.channels.scales = [Scale::new(0.0, 255.0); 3];

    let index = match column {
        Some(i) if i < table.num_columns() => {
            table.overwrite_column(i, &cells, meta)?;
            i
        }
        _ => {
            table.push_column(&cells, meta)?;
            table.num_columns() - 1
        }
    };
    info!(
        column = index,
        nodes = num_nodes,
        name = %options.column_name,
        "foci uncertainty column created"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options<'a>(colors: &'a ColorTable, limits: UncertaintyLimits) -> FociToRgbOptions<'a> {
        FociToRgbOptions {
            limits,
            foreground: (255, 255, 255),
            correct_hemisphere_only: false,
            colors,
            column_name: "uncertainty".to_string(),
        }
    }

    fn run(
        surface: &Surface,
        foci: &[Focus],
        colors: &ColorTable,
        limits: UncertaintyLimits,
    ) -> RgbPaintTable {
        let mut table = RgbPaintTable::new();
        let mut probe = crate::util::RunToCompletion;
        foci_uncertainty_to_rgb(surface, foci, &mut table, None, &options(colors, limits), &mut probe)
            .unwrap();
        table
    }

    #[test]
    fn test_single_focus_halo() {
        // distance 2 < middle limit 5: halo-whitened focus color
        let surface = Surface::new(vec![Vec3::new(12.0, 0.0, 0.0)], Structure::Left);
        let mut colors = ColorTable::new();
        colors.set("K-color", (200, 100, 50));
        let foci = [Focus::new(Vec3::new(10.0, 0.0, 0.0), "K")
            .with_structure(Structure::Left)
            .with_color("K-color")];
        let table = run(&surface, &foci, &colors, UncertaintyLimits::new(0.0, 5.0, 20.0));
        let cell = table.cell(0, 0);
        assert_eq!((cell.r, cell.g, cell.b), (227.5, 177.5, 152.5));
        assert_eq!(table.column(0).comment, "Created from foci uncertainty");
        assert_eq!(table.column(0).channels.scales[0], Scale::new(0.0, 255.0));
    }

    #[test]
    fn test_single_focus_outside_middle_keeps_color() {
        let surface = Surface::new(vec![Vec3::new(10.0, 0.0, 0.0)], Structure::Left);
        let mut colors = ColorTable::new();
        colors.set("K-color", (200, 100, 50));
        let foci = [Focus::new(Vec3::ZERO, "K")
            .with_structure(Structure::Left)
            .with_color("K-color")];
        // distance 10, middle 5: no halo
        let table = run(&surface, &foci, &colors, UncertaintyLimits::new(0.0, 5.0, 20.0));
        let cell = table.cell(0, 0);
        assert_eq!((cell.r, cell.g, cell.b), (200.0, 100.0, 50.0));
    }

    #[test]
    fn test_two_classes_mix() {
        let surface = Surface::new(vec![Vec3::ZERO], Structure::Left);
        let mut colors = ColorTable::new();
        colors.set("red", (200, 0, 0));
        colors.set("green", (0, 200, 0));
        let foci = [
            Focus::new(Vec3::new(1.0, 0.0, 0.0), "A")
                .with_structure(Structure::Left)
                .with_color("red"),
            Focus::new(Vec3::new(0.0, 1.0, 0.0), "B")
                .with_structure(Structure::Left)
                .with_color("green"),
        ];
        let table = run(&surface, &foci, &colors, UncertaintyLimits::new(0.0, 0.5, 20.0));
        let cell = table.cell(0, 0);
        assert_eq!((cell.r, cell.g, cell.b), (255.0, 255.0, 0.0));
    }

    #[test]
    fn test_two_black_foci_stay_black() {
        let surface = Surface::new(vec![Vec3::ZERO], Structure::Left);
        let mut colors = ColorTable::new();
        colors.set("black", (0, 0, 0));
        let foci = [
            Focus::new(Vec3::X, "A").with_structure(Structure::Left).with_color("black"),
            Focus::new(Vec3::Y, "B").with_structure(Structure::Left).with_color("black"),
        ];
        let table = run(&surface, &foci, &colors, UncertaintyLimits::new(0.0, 0.5, 20.0));
        assert_eq!(table.cell(0, 0), Rgb::default());
    }

    #[test]
    fn test_three_classes_paint_gray() {
        let surface = Surface::new(vec![Vec3::ZERO], Structure::Left);
        let colors = ColorTable::new();
        let foci = [
            Focus::new(Vec3::X, "A").with_structure(Structure::Left),
            Focus::new(Vec3::Y, "B").with_structure(Structure::Left),
            Focus::new(Vec3::Z, "C").with_structure(Structure::Left),
        ];
        let table = run(&surface, &foci, &colors, UncertaintyLimits::new(0.0, 0.5, 20.0));
        assert_eq!(table.cell(0, 0), Rgb::new(50.0, 50.0, 50.0));
    }

    #[test]
    fn test_no_nearby_foci_paints_black() {
        let surface = Surface::new(vec![Vec3::ZERO], Structure::Left);
        let colors = ColorTable::new();
        let foci = [Focus::new(Vec3::new(100.0, 0.0, 0.0), "A").with_structure(Structure::Left)];
        let table = run(&surface, &foci, &colors, UncertaintyLimits::new(0.0, 5.0, 20.0));
        assert_eq!(table.cell(0, 0), Rgb::default());
    }

    #[test]
    fn test_opposite_hemisphere_reflected() {
        // Focus at x = -10 on the right; left surface vertex at x = 10.
        // With reflection enabled the focus lands on the vertex.
        let surface = Surface::new(vec![Vec3::new(10.0, 0.0, 0.0)], Structure::Left);
        let mut colors = ColorTable::new();
        colors.set("c", (100, 0, 0));
        let foci = [Focus::new(Vec3::new(-10.0, 0.0, 0.0), "A")
            .with_structure(Structure::Right)
            .with_color("c")];
        let table = run(&surface, &foci, &colors, UncertaintyLimits::new(0.0, 0.0, 20.0));
        assert_eq!(table.cell(0, 0), Rgb::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn test_correct_hemisphere_only_skips() {
        let surface = Surface::new(vec![Vec3::new(10.0, 0.0, 0.0)], Structure::Left);
        let colors = ColorTable::new();
        let foci = [Focus::new(Vec3::new(-10.0, 0.0, 0.0), "A").with_structure(Structure::Right)];
        let mut table = RgbPaintTable::new();
        let mut opts = options(&colors, UncertaintyLimits::new(0.0, 0.0, 20.0));
        opts.correct_hemisphere_only = true;
        let mut probe = crate::util::RunToCompletion;
        foci_uncertainty_to_rgb(&surface, &foci, &mut table, None, &opts, &mut probe).unwrap();
        assert_eq!(table.cell(0, 0), Rgb::default());
    }

    #[test]
    fn test_cancellation_leaves_table_unchanged() {
        let surface = Surface::new(vec![Vec3::ZERO; 1000], Structure::Left);
        let colors = ColorTable::new();
        let mut table = RgbPaintTable::new();
        let mut probe = |done: usize, _total: usize| done < 300;
        let err = foci_uncertainty_to_rgb(
            &surface,
            &[],
            &mut table,
            None,
            &options(&colors, UncertaintyLimits::new(0.0, 1.0, 2.0)),
            &mut probe,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(table.is_empty());
    }

    #[test]
    fn test_bad_limit_ordering() {
        let surface = Surface::new(vec![Vec3::ZERO], Structure::Left);
        let colors = ColorTable::new();
        let mut table = RgbPaintTable::new();
        let mut probe = crate::util::RunToCompletion;
        let err = foci_uncertainty_to_rgb(
            &surface,
            &[],
            &mut table,
            None,
            &options(&colors, UncertaintyLimits::new(5.0, 1.0, 2.0)),
            &mut probe,
        )
        .unwrap_err();
        assert!(matches!(err, Error::PolicyViolation(_)));
    }

    #[test]
    fn test_same_class_uses_nearest_focus_only() {
        let surface = Surface::new(vec![Vec3::ZERO], Structure::Left);
        let mut colors = ColorTable::new();
        colors.set("near", (10, 20, 30));
        colors.set("far", (200, 200, 200));
        let foci = [
            Focus::new(Vec3::new(5.0, 0.0, 0.0), "A")
                .with_structure(Structure::Left)
                .with_color("far"),
            Focus::new(Vec3::new(1.0, 0.0, 0.0), "A")
                .with_structure(Structure::Left)
                .with_color("near"),
        ];
        let table = run(&surface, &foci, &colors, UncertaintyLimits::new(0.0, 0.5, 20.0));
        assert_eq!(table.cell(0, 0), Rgb::new(10.0, 20.0, 30.0));
    }
}
