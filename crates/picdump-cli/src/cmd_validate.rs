/// Implementation of `picdump validate`.
///
/// Decodes the configuration and every snapshot completely without
/// exporting, and reports either `✓` lines or one `✗` diagnostic.
///
/// # Success output
///
/// ```text
/// ✓ Config: v2.0, 2 species (1 ion, 1 electron), output mesh 64×64×1
/// ✓ snap0001.dat: 40 timesteps, t = 0 … 195
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ snap0002.dat: stopped in timestep 57 at record "Bz" (last completed timestep: 56)
///   truncated chunk at offset 81920: need 16384 bytes, 512 available
/// ```
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use picdump_decoder::SnapshotDecoder;

use crate::{ValidateArgs, load_config, stopped_at};

/// Run the `picdump validate` command.
///
/// # Errors
///
/// Returns an error if any file cannot be opened or decoded.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let options = args.decode.options();
    let config = match load_config(&args.config, options) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            println!("✗ Config: {e:#}");
            return Err(anyhow!("validation failed"));
        }
    };
    let [nx, ny, nz] = config.output_dims();
    println!(
        "✓ Config: {}, {} species ({} ion, {} electron), output mesh {nx}×{ny}×{nz}",
        config.version,
        config.counts.total,
        config.counts.ions,
        config.counts.electrons(),
    );

    let mut next_index = 0;
    for path in &args.snapshots {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        let mut decoder =
            SnapshotDecoder::with_options(BufReader::new(file), Arc::clone(&config), options)
                .with_first_index(next_index);

        let mut times = Vec::new();
        while let Some(snapshot) = decoder.read_snapshot() {
            match snapshot {
                Ok(snapshot) => times.push(snapshot.time),
                Err(e) => {
                    println!("✗ {}", stopped_at(path, &decoder));
                    println!("  {e}");
                    return Err(anyhow!("validation failed"));
                }
            }
        }

        match (times.first(), times.last()) {
            (Some(first), Some(last)) => println!(
                "✓ {}: {} timestep{}, t = {first} … {last}",
                path.display(),
                times.len(),
                if times.len() == 1 { "" } else { "s" }
            ),
            _ => println!("✓ {}: no timesteps", path.display()),
        }
        next_index = decoder.next_index();
    }
    Ok(())
}
