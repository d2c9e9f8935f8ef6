use picdump_types::TypeError;
use picdump_wire::WireError;

/// Errors that end a decode.
///
/// None of these are recoverable: the stream has no resynchronisation
/// markers, so after any failure every later read would be misaligned.
///
/// ```text
///   DecodeError
///   ├── Wire(WireError)        ← I/O failure, truncated or oversized chunk
///   ├── SchemaDesync           ← bytes do not fit the expected layout
///   └── UnexpectedEnd          ← clean end of stream inside a record
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
  #[error(transparent)]
  Wire(#[from] WireError),

  /// A derived invariant failed while reading `record`: an impossible
  /// dimension, inconsistent species counts, or a chunk whose size does
  /// not match the configuration.
  #[error("schema desync in {record}: {source}")]
  SchemaDesync {
    record: String,
    #[source]
    source: TypeError,
  },

  /// The source ended on a chunk boundary, but not at the start of a
  /// timestep.
  #[error("stream ended inside {record}")]
  UnexpectedEnd { record: String },
}

impl DecodeError {
  pub(crate) fn desync(record: impl Into<String>, source: TypeError) -> Self {
    Self::SchemaDesync {
      record: record.into(),
      source,
    }
  }

  /// True when the source ran out in the middle of a chunk.
  #[must_use]
  pub fn is_truncation(&self) -> bool {
    matches!(self, Self::Wire(WireError::Truncated { .. }))
  }
}
