#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use picdump_decoder::SnapshotDecoder;
use picdump_encoder::{RawSnapshot, SnapshotEncoder};
use picdump_types::{NormalizationConstants, SimulationConfig};

#[derive(Debug, Arbitrary)]
struct Input {
    nx: u8,
    ny_per_rank: u8,
    nz: u8,
    ranks: u8,
    bins: u8,
    seeds: Vec<u16>,
}

// Fuzz target: SnapshotEncoder -> SnapshotDecoder over random shapes.
//
// Every timestep written must decode, with field values landing on the
// coordinates they were written for.
fuzz_target!(|input: Input| {
    let nx = i32::from(input.nx % 6) + 1;
    let ranks = i32::from(input.ranks % 3) + 1;
    let ny = (i32::from(input.ny_per_rank % 4) + 1) * ranks;
    let nz = i32::from(input.nz % 3) + 1;

    let mut config = SimulationConfig::sample();
    config.output_mesh_number = [nx, ny, nz];
    config.parallel_number = ranks;
    config.momentum_mesh_number = i32::from(input.bins % 8) + 1;
    let config = Arc::new(config);

    let seeds: Vec<u32> = input.seeds.iter().take(4).map(|s| u32::from(*s)).collect();
    let mut enc = SnapshotEncoder::new(Vec::new(), &config);
    let raws: Vec<RawSnapshot> = seeds
        .iter()
        .map(|s| RawSnapshot::synthetic(&config, *s))
        .collect();
    for raw in &raws {
        enc.write(raw).unwrap();
    }
    let bytes = enc.into_inner();

    let mut decoder = SnapshotDecoder::new(bytes.as_slice(), Arc::clone(&config))
        .with_constants(NormalizationConstants::unit());
    let [nx, ny, nz] = config.output_dims();
    for raw in &raws {
        let snap = decoder.read_snapshot().unwrap().unwrap();
        assert_eq!(snap.time, raw.time);
        let grid = &snap.fields[0].grid;
        for y in 0..ny {
            for z in 0..nz {
                for x in 0..nx {
                    assert_eq!(grid.get(x, y, z), raw.fields[0][(y * nz + z) * nx + x]);
                }
            }
        }
    }
    assert!(decoder.read_snapshot().is_none());
});
