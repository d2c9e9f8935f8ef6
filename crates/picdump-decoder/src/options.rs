use std::io::Read;

use picdump_wire::chunk::DEFAULT_MAX_CHUNK_LEN;
use picdump_wire::{ChunkStream, TrailerCheck};

/// Knobs shared by the config and snapshot decoders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderOptions {
  /// Largest chunk payload accepted before allocating.
  pub max_chunk_len: usize,
  pub trailer_check: TrailerCheck,
}

impl Default for DecoderOptions {
  fn default() -> Self {
    Self {
      max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
      trailer_check: TrailerCheck::default(),
    }
  }
}

impl DecoderOptions {
  #[must_use]
  pub fn with_max_chunk_len(mut self, limit: usize) -> Self {
    self.max_chunk_len = limit;
    self
  }

  #[must_use]
  pub fn with_trailer_check(mut self, check: TrailerCheck) -> Self {
    self.trailer_check = check;
    self
  }

  /// Wrap `reader` in a chunk stream configured with these options.
  pub fn stream<R: Read>(&self, reader: R) -> ChunkStream<R> {
    ChunkStream::new(reader)
      .with_max_chunk_len(self.max_chunk_len)
      .with_trailer_check(self.trailer_check)
  }
}
