//! End-to-end workflows: file loads folded through merge plans, the
//! registry dispatcher, deformation, imports, and foci derivation.

use glam::Vec3;
use surfattr::codec::{self, Encoding, ReadMode};
use surfattr::foci::{foci_uncertainty_to_rgb, FociToRgbOptions, UncertaintyLimits};
use surfattr::import::{import_curvature, import_label_file, ImportFormat, LabelNames};
use surfattr::prelude::*;
use surfattr::surface::{Focus, Structure, Surface};
use surfattr::table::StudyLink;
use surfattr::util::RunToCompletion;

use std::io::Write as _;
use tempfile::tempdir;

/// `RUST_LOG=surfattr=debug cargo test` shows the engine's tracing.
fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn metric_file(path: &std::path::Path, names: &[&str], base: f32) {
    let mut table: MetricTable = AttrTable::with_size(4, names.len());
    for (c, name) in names.iter().enumerate() {
        table.column_mut(c).name = name.to_string();
        for v in 0..4 {
            table.set_cell(v, c, base + c as f32 * 10.0 + v as f32);
        }
    }
    codec::write_table(&table, path, TableKind::Metric, Encoding::TaggedAscii).unwrap();
}

#[test]
fn test_overwrite_one_column_from_file() {
    init_logs();
    let dir = tempdir().unwrap();
    let dest_path = dir.path().join("dest.metric");
    let src_path = dir.path().join("src.metric");
    metric_file(&dest_path, &["A", "B"], 0.0);
    metric_file(&src_path, &["X"], 9.0);

    let mut dest: MetricTable =
        codec::read_table(&dest_path, TableKind::Metric, ReadMode::Full).unwrap();
    let source: MetricTable =
        codec::read_table(&src_path, TableKind::Metric, ReadMode::Full).unwrap();

    let plan = MergePlan::with_actions(vec![ColumnAction::Overwrite(1)]);
    merge(&source, &mut dest, &plan).unwrap();

    assert_eq!(dest.num_columns(), 2);
    assert_eq!(dest.column(0).name, "A");
    assert_eq!(dest.column(1).name, "X");
    assert_eq!(dest.cell(0, 1), 9.0);
    // untouched column keeps its cells
    assert_eq!(dest.cell(3, 0), 3.0);
}

#[test]
fn test_erase_all_with_overwrite_leaves_destination_alone() {
    let dir = tempdir().unwrap();
    let src_path = dir.path().join("src.metric");
    metric_file(&src_path, &["X"], 9.0);
    let source: MetricTable =
        codec::read_table(&src_path, TableKind::Metric, ReadMode::Full).unwrap();

    let mut dest: MetricTable = AttrTable::with_size(4, 1);
    dest.column_mut(0).name = "keep".to_string();
    let before = dest.clone();

    let plan = MergePlan::with_actions(vec![ColumnAction::Overwrite(0)]).erase_all();
    assert!(matches!(
        merge(&source, &mut dest, &plan),
        Err(Error::PolicyViolation(_))
    ));
    assert_eq!(dest, before);
}

#[test]
fn test_append_twice_gives_identical_halves() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("values.metric");
    metric_file(&path, &["a", "b"], 5.0);

    let mut registry = TableRegistry::new();
    open_data_file(&mut registry, FileFilter::Metric, &path, OpenOptions::default()).unwrap();
    open_data_file(&mut registry, FileFilter::Metric, &path, OpenOptions::default()).unwrap();

    let table = &registry.metric;
    assert_eq!(table.num_columns(), 4);
    for c in 0..2 {
        assert_eq!(table.column(c).name, table.column(c + 2).name);
        for v in 0..4 {
            assert_eq!(table.cell(v, c), table.cell(v, c + 2));
        }
    }
}

#[test]
fn test_remove_column_then_append_restores_shape() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("values.metric");
    metric_file(&path, &["a", "b"], 5.0);

    let mut table: MetricTable =
        codec::read_table(&path, TableKind::Metric, ReadMode::Full).unwrap();
    table.remove_column(0).unwrap();
    assert_eq!(table.num_columns(), 1);
    assert_eq!(table.column(0).name, "b");

    let source: MetricTable =
        codec::read_table(&path, TableKind::Metric, ReadMode::Full).unwrap();
    let plan = MergePlan::with_actions(vec![ColumnAction::New, ColumnAction::Skip]);
    merge(&source, &mut table, &plan).unwrap();
    assert_eq!(table.num_columns(), 2);
    assert_eq!(table.column(1).name, "a");
    assert_eq!(table.cell(2, 1), 7.0);
}

#[test]
fn test_study_links_union_after_merge() {
    let mut dest: MetricTable = AttrTable::with_size(3, 1);
    dest.column_mut(0)
        .study_links
        .push(StudyLink::with_pubmed_id("111"));

    let mut source: MetricTable = AttrTable::with_size(3, 1);
    source
        .column_mut(0)
        .study_links
        .push(StudyLink::with_pubmed_id("222"));

    merge(&source, &mut dest, &MergePlan::new()).unwrap();
    let ids = dest.all_pubmed_ids();
    assert!(ids.contains("111"));
    assert!(ids.contains("222"));
}

#[test]
fn test_deform_identity_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("values.metric");
    metric_file(&path, &["a"], 1.0);
    let table: MetricTable =
        codec::read_table(&path, TableKind::Metric, ReadMode::Full).unwrap();

    let map = DeformationMap::identity(table.num_nodes());
    let deformed = deform(&table, &map, DeformMode::TileAverage).unwrap();
    for v in 0..table.num_nodes() {
        assert_eq!(deformed.cell(v, 0), table.cell(v, 0));
    }
    assert_eq!(deformed.column(0).name, "a");
}

#[test]
fn test_curvature_import_then_save() {
    let dir = tempdir().unwrap();
    let curv_path = dir.path().join("lh.curv.asc");
    let mut file = std::fs::File::create(&curv_path).unwrap();
    for v in 0..3 {
        writeln!(file, "{} 0.0 0.0 0.0 {}", v, v as f32 * 0.5).unwrap();
    }
    drop(file);

    let mut table: AttrTable<f32> = AttrTable::new();
    let col = import_curvature(&mut table, 3, &curv_path, ImportFormat::Ascii).unwrap();
    assert_eq!(col, 0);
    assert_eq!(table.cell(2, 0), 1.0);
    assert!(table.file_comment().contains("lh.curv.asc"));
    assert_eq!(table.column(0).name, "lh.curv.asc");

    let out = dir.path().join("out.surface_shape");
    codec::write_table(&table, &out, TableKind::Shape, Encoding::TaggedBinary).unwrap();
    let back: ShapeTable = codec::read_table(&out, TableKind::Shape, ReadMode::Full).unwrap();
    assert_eq!(back.cell(2, 0), 1.0);
}

#[test]
fn test_label_import_synthesizes_missing_colors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lh-precentral.label");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "#!ascii label").unwrap();
    writeln!(file, "2").unwrap();
    writeln!(file, "0 1.0 2.0 3.0 0.0").unwrap();
    writeln!(file, "2 4.0 5.0 6.0 0.0").unwrap();
    drop(file);

    let mut table: PaintTable = AttrTable::new();
    let mut names = LabelNames::default();
    let mut colors = ColorTable::default();
    import_label_file(&mut table, 3, &path, &mut names, &mut colors, false).unwrap();

    assert_eq!(table.num_nodes(), 3);
    let label = table.cell(0, 0);
    assert_eq!(names.name(label), Some("precentral"));
    // unmarked vertex keeps the unassigned label
    assert_eq!(table.cell(1, 0), 0);
    assert!(colors.contains("precentral"));
    // synthesis is deterministic
    let again = ColorTable::default().ensure("precentral");
    assert_eq!(colors.get("precentral"), Some(again));
}

#[test]
fn test_foci_uncertainty_end_to_end() {
    init_logs();
    let surface = Surface::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(7.0, 0.0, 0.0),
        ],
        Structure::Left,
    );
    let mut colors = ColorTable::default();
    colors.set("motor", (200, 100, 50));
    let foci = vec![
        Focus::new(Vec3::ZERO, "motor")
            .with_structure(Structure::Left)
            .with_color("motor"),
    ];
    let options = FociToRgbOptions {
        limits: UncertaintyLimits::new(0.0, 5.0, 10.0),
        foreground: (255, 255, 255),
        correct_hemisphere_only: true,
        colors: &colors,
        column_name: "uncertainty".to_string(),
    };
    let mut table = RgbPaintTable::new();
    let column = foci_uncertainty_to_rgb(
        &surface,
        &foci,
        &mut table,
        None,
        &options,
        &mut RunToCompletion,
    )
    .unwrap();

    assert_eq!(table.num_columns(), 1);
    assert_eq!(table.column(column).name, "uncertainty");
    // vertex at the focus sits inside the halo band
    assert_eq!(table.cell(0, column), Rgb::new(227.5, 177.5, 152.5));
    // far vertex stays black
    assert_eq!(table.cell(1, column), Rgb::new(0.0, 0.0, 0.0));
    // vertex between the middle and upper radii gets the plain color
    assert_eq!(table.cell(2, column), Rgb::new(200.0, 100.0, 50.0));

    let dir = tempdir().unwrap();
    let out = dir.path().join("uncertainty.RGB_paint");
    codec::write_table(&table, &out, TableKind::RgbPaint, Encoding::TaggedAscii).unwrap();
    let back: RgbPaintTable =
        codec::read_table(&out, TableKind::RgbPaint, ReadMode::Full).unwrap();
    assert_eq!(back, table);
}
