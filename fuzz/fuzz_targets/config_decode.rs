#![no_main]

use libfuzzer_sys::fuzz_target;
use picdump_decoder::{ConfigDecoder, DecoderOptions};

// Fuzz target: ConfigDecoder entry point.
//
// Catches bugs in:
// - Grammar walking with conditional chunks
// - Species count and dimension validation
// - Tag and logical decoding
// - Short payloads
fuzz_target!(|data: &[u8]| {
    let options = DecoderOptions::default().with_max_chunk_len(1 << 16);
    let _ = ConfigDecoder::with_options(options).decode(data);
});
