/// Implementation of `picdump convert`.
///
/// ```text
/// plot.json ──▶ PlotSelection ──┐
/// gfin.dat  ──▶ SimulationConfig ──▶ NormalizationConstants
///                               │
/// snap*.dat ──▶ SnapshotDecoder ─┴──▶ Pipeline ──▶ ASCII / VTK dirs
/// ```
///
/// A failed export is logged and the run continues; any decode error ends
/// the run with exit code 1 and names the timestep and record.
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use picdump_decoder::SnapshotDecoder;
use picdump_driver::{FileExporter, Pipeline, PlotSelection, RunSummary};
use picdump_types::NormalizationConstants;

use crate::{ConvertArgs, decode_failure, load_config};

/// Run the `picdump convert` command.
///
/// # Errors
///
/// Returns an error if the plot selection, output directories or
/// configuration cannot be prepared, or if a snapshot fails to decode.
pub fn run(args: &ConvertArgs, quiet: bool) -> Result<()> {
    let started = Instant::now();
    let (selection, _) = PlotSelection::load_or_create(&args.plot)
        .with_context(|| format!("cannot load plot selection {}", args.plot.display()))?;
    if !quiet {
        println!("{selection}");
    }
    selection
        .create_dirs()
        .context("cannot create output directories")?;

    let options = args.decode.options();
    let config = Arc::new(load_config(&args.config, options)?);
    let constants = NormalizationConstants::from_config(&config);
    tracing::info!(
        electric = constants.electric,
        magnetic = constants.magnetic,
        energy_ev = constants.energy,
        "normalization constants"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start export runtime")?;
    let pipeline = Pipeline::new(FileExporter::new(selection, constants));

    let mut total = RunSummary::default();
    let mut next_index = 0;
    for path in &args.snapshots {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let mut decoder =
            SnapshotDecoder::with_options(BufReader::new(file), Arc::clone(&config), options)
                .with_constants(constants)
                .with_first_index(next_index);

        let summary = runtime
            .block_on(pipeline.run(&mut decoder))
            .map_err(|e| decode_failure(e, path, &decoder))?;
        tracing::info!(
            file = %path.display(),
            timesteps = summary.timesteps,
            "snapshot file done"
        );
        next_index = decoder.next_index();
        total.merge(summary);
    }

    if !quiet {
        println!(
            "{} timestep{} · {} file{} written · {} failed · {:.1?}",
            total.timesteps,
            if total.timesteps == 1 { "" } else { "s" },
            total.exports_written,
            if total.exports_written == 1 { "" } else { "s" },
            total.exports_failed,
            started.elapsed()
        );
    }
    if total.exports_failed > 0 {
        tracing::warn!(failed = total.exports_failed, "some exports failed, see errors above");
    }
    Ok(())
}
