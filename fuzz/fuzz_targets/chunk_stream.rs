#![no_main]

use libfuzzer_sys::fuzz_target;
use picdump_wire::{ChunkStream, TrailerCheck};

// Fuzz target: ChunkStream framing on arbitrary bytes.
//
// Catches bugs in:
// - Partial length headers and payloads
// - Oversized declared lengths
// - Trailer comparison
// - Offset bookkeeping across chunks
fuzz_target!(|data: &[u8]| {
    let mut stream = ChunkStream::new(data)
        .with_max_chunk_len(1 << 16)
        .with_trailer_check(TrailerCheck::Strict);
    let mut consumed = 0u64;
    while let Ok(Some(chunk)) = stream.next_chunk() {
        assert_eq!(chunk.offset, consumed);
        consumed += 8 + chunk.len() as u64;
    }
    assert!(consumed <= data.len() as u64);
});
