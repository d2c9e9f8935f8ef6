#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use picdump_decoder::{DecoderOptions, SnapshotDecoder};
use picdump_types::SimulationConfig;

// Fuzz target: SnapshotDecoder over arbitrary bytes with the sample config.
//
// Catches bugs in:
// - Grid and histogram size checks
// - Reserved chunk skipping
// - State transitions after errors
fuzz_target!(|data: &[u8]| {
    let config = Arc::new(SimulationConfig::sample());
    let options = DecoderOptions::default().with_max_chunk_len(1 << 16);
    let decoder = SnapshotDecoder::with_options(data, config, options);
    // The decoder must stop after the first error.
    let mut errors = 0;
    for event in decoder {
        if event.is_err() {
            errors += 1;
        }
    }
    assert!(errors <= 1);
});
