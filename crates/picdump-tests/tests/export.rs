//! End-to-end runs: encoded snapshot → decoder → pipeline → files on disk.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use insta::assert_snapshot;
use picdump_decoder::SnapshotDecoder;
use picdump_driver::{FileExporter, Pipeline, PlotEntry, PlotSelection, RunSummary};
use picdump_encoder::{RawSnapshot, SnapshotEncoder};
use picdump_types::{NormalizationConstants, SimulationConfig};

fn snapshots(config: &SimulationConfig, seeds: std::ops::Range<u32>) -> Vec<u8> {
    let mut enc = SnapshotEncoder::new(Vec::new(), config);
    for seed in seeds {
        enc.write(&RawSnapshot::synthetic(config, seed)).unwrap();
    }
    enc.into_inner()
}

fn selection_in(root: &Path) -> PlotSelection {
    let selection = PlotSelection {
        ascii_dir: root.join("ascii"),
        vtk_dir: root.join("vtk"),
        ..PlotSelection::default()
    };
    selection.create_dirs().unwrap();
    selection
}

fn listing(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

async fn export(
    config: SimulationConfig,
    selection: PlotSelection,
    bytes: &[u8],
) -> RunSummary {
    let config = Arc::new(config);
    let constants = NormalizationConstants::from_config(&config);
    let pipeline = Pipeline::new(FileExporter::new(selection, constants));
    let mut decoder = SnapshotDecoder::new(bytes, config);
    pipeline.run(&mut decoder).await.unwrap()
}

#[tokio::test]
async fn default_selection_writes_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let selection = selection_in(dir.path());
    let config = SimulationConfig::sample();
    let bytes = snapshots(&config, 0..2);

    let summary = export(config, selection, &bytes).await;
    assert_eq!(summary.timesteps, 2);
    assert_eq!(summary.exports_failed, 0);
    // Per timestep: 5 fields and 2 densities × 3 modes, 9 phase tables and
    // 2 spectra per species.
    assert_eq!(summary.exports_written, 2 * (7 * 3 + 2 * 9 + 2 * 2));

    let ascii = listing(&dir.path().join("ascii"));
    for name in [
        "Ex_xy_0000.txt",
        "Bz_y_0001.txt",
        "Ion_Density_x_0000_is=01.txt",
        "Electron_Density_xy_0001_is=02.txt",
        "pxpy0000_is=01.txt",
        "ypz0001_is=02.txt",
        "Ion_Energy_Distribution0000_is=01.txt",
        "Electron_Energy_DistributionLog0001_is=02.txt",
    ] {
        assert!(ascii.contains(name), "missing {name}");
    }
    assert!(!ascii.iter().any(|n| n.starts_with("Ez_")));
    assert!(listing(&dir.path().join("vtk")).is_empty());
}

#[tokio::test]
async fn field_line_contents() {
    let dir = tempfile::tempdir().unwrap();
    let selection = selection_in(dir.path());
    let config = SimulationConfig::sample();
    let bytes = snapshots(&config, 0..1);
    export(config, selection, &bytes).await;

    let text = fs::read_to_string(dir.path().join("ascii/Jx_x_0000.txt")).unwrap();
    assert_snapshot!(text, @r"
    0 13.5
    1 15.25
    2 17
    3 18.75
    ");
}

#[tokio::test]
async fn vtk_and_averages_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut selection = selection_in(dir.path());
    selection.field = vec![PlotEntry::new("Ex", true, "vtk zxaverage whole_average")];
    selection.particle.clear();
    selection.phase.clear();
    let config = SimulationConfig::sample();
    let bytes = snapshots(&config, 0..1);

    let summary = export(config, selection, &bytes).await;
    assert_eq!(summary.exports_written, 3);

    let vti = fs::read_to_string(dir.path().join("vtk/Ex0000.vti")).unwrap();
    assert!(vti.contains(r#"<ImageData WholeExtent="0 3 0 3 0 1""#), "{vti}");
    assert!(vti.contains(r#"Name="Ex""#));

    let whole = fs::read_to_string(dir.path().join("ascii/Ex_whole_average_0000.txt")).unwrap();
    assert_eq!(whole.lines().count(), 1);
    // nz rows of nx values, each followed by a blank line.
    let zx = fs::read_to_string(dir.path().join("ascii/Ex_zxaverage_0000.txt")).unwrap();
    assert_eq!(zx.lines().filter(|l| !l.is_empty()).count(), 2 * 4);
}

#[tokio::test]
async fn selection_file_drives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let plot = dir.path().join("plot.json");
    let json = format!(
        r#"{{
            "OutputASCIIDirectory": {ascii:?},
            "OutputVTKDirectory": {vtk:?},
            "Field": [{{ "Name": "Jy", "Plot": true, "Center": "z bogus" }}],
            "Particle": null,
            "Phase": [{{ "Name": "ypx", "Plot": true, "Center": "" }}]
        }}"#,
        ascii = dir.path().join("a").display().to_string(),
        vtk = dir.path().join("v").display().to_string(),
    );
    fs::write(&plot, json).unwrap();

    let (selection, created) = PlotSelection::load_or_create(&plot).unwrap();
    assert!(!created);
    selection.create_dirs().unwrap();

    let config = SimulationConfig::sample();
    let bytes = snapshots(&config, 0..1);
    let summary = export(config, selection, &bytes).await;
    // The unknown mode is skipped; one ypx table per species.
    assert_eq!(summary.exports_written, 1 + 2);

    assert_eq!(
        listing(&dir.path().join("a")),
        BTreeSet::from(["Jy_z_0000.txt", "ypx0000_is=01.txt", "ypx0000_is=02.txt"].map(String::from))
    );
}

#[tokio::test]
async fn numbering_continues_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut selection = selection_in(dir.path());
    selection.field = vec![PlotEntry::new("Ex", true, "x")];
    selection.particle.clear();
    selection.phase.clear();

    let config = Arc::new(SimulationConfig::sample());
    let constants = NormalizationConstants::from_config(&config);
    let pipeline = Pipeline::new(FileExporter::new(selection, constants));

    let mut total = RunSummary::default();
    let mut next = 0;
    for seeds in [0..2, 2..3] {
        let bytes = snapshots(&config, seeds);
        let mut decoder = SnapshotDecoder::new(bytes.as_slice(), Arc::clone(&config))
            .with_first_index(next)
            .with_constants(constants);
        total.merge(pipeline.run(&mut decoder).await.unwrap());
        next = decoder.next_index();
    }

    assert_eq!(total.timesteps, 3);
    assert_eq!(
        listing(&dir.path().join("ascii")),
        BTreeSet::from(["Ex_x_0000.txt", "Ex_x_0001.txt", "Ex_x_0002.txt"].map(String::from))
    );
}
