/// Implementation of `picdump init-plot`.
use anyhow::{Result, bail};
use picdump_driver::PlotSelection;

use crate::InitPlotArgs;

/// Write the default plot selection.
///
/// # Errors
///
/// Returns an error if the file exists and `--force` was not given, or if
/// it cannot be written.
pub fn run(args: &InitPlotArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!("{} already exists; pass --force to overwrite", args.path.display());
    }
    PlotSelection::default().save(&args.path)?;
    println!("wrote {}", args.path.display());
    Ok(())
}
