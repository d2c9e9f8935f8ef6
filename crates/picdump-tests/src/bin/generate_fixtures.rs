//! Writes a small configuration and snapshot pair for trying the CLI.
//!
//! ```text
//! cargo run -p picdump-tests --bin generate_fixtures -- out/ 3
//! cd out && picdump convert
//! ```
//!
//! Produces `gfin.dat` for [`SimulationConfig::sample`] and
//! `snap0001.dat` holding the requested number of synthetic timesteps.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use picdump_encoder::{ConfigEncoder, RawSnapshot, SnapshotEncoder};
use picdump_types::SimulationConfig;

fn main() {
    let mut args = std::env::args().skip(1);
    let out = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    let steps: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

    fs::create_dir_all(&out).expect("create output directory");
    let config = SimulationConfig::sample();

    let bytes = ConfigEncoder::encode(&config).expect("encode config");
    fs::write(out.join("gfin.dat"), bytes).expect("write gfin.dat");

    let file = File::create(out.join("snap0001.dat")).expect("create snap0001.dat");
    let mut enc = SnapshotEncoder::new(BufWriter::new(file), &config);
    for seed in 0..steps {
        enc.write(&RawSnapshot::synthetic(&config, seed)).expect("write timestep");
    }
    enc.into_inner().into_inner().expect("flush snap0001.dat");

    println!("wrote gfin.dat and snap0001.dat ({steps} timesteps) to {}", out.display());
}
