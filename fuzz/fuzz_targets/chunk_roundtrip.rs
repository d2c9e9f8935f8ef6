#![no_main]

use libfuzzer_sys::fuzz_target;
use picdump_wire::{write_chunk, ChunkStream, TrailerCheck};

// Fuzz target: write_chunk -> ChunkStream roundtrip.
//
// Input is split into payloads at every 0xFF byte. Each payload is framed,
// the stream is read back under the strict trailer policy, and every
// payload must come back unchanged.
fuzz_target!(|data: &[u8]| {
    let payloads: Vec<&[u8]> = data.split(|b| *b == 0xFF).collect();

    let mut wire = Vec::new();
    for p in &payloads {
        write_chunk(&mut wire, p).unwrap();
    }

    let mut stream = ChunkStream::new(wire.as_slice()).with_trailer_check(TrailerCheck::Strict);
    for p in &payloads {
        let chunk = stream.next_chunk().unwrap().unwrap();
        assert_eq!(&chunk.payload[..], *p);
    }
    assert!(stream.next_chunk().unwrap().is_none());
});
