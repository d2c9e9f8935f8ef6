/// Errors raised while reading or writing length-delimited chunks.
///
/// Every variant that can happen mid-stream carries the absolute byte
/// offset of the chunk header it was working on, so a failure can be
/// located with a hex dump of the snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The source ended inside a chunk: after some header bytes, inside the
    /// payload, or inside the trailer.
    ///
    /// This is never a clean end of stream. A source that is exhausted
    /// exactly on a chunk boundary is reported as `Ok(None)` instead.
    #[error("chunk at offset {offset} truncated: expected {expected} bytes, found {available}")]
    Truncated {
        offset: u64,
        expected: usize,
        available: usize,
    },

    /// The declared payload length exceeds the configured ceiling.
    #[error("chunk at offset {offset} declares {len} bytes, limit is {limit}")]
    ChunkTooLarge { offset: u64, len: usize, limit: usize },

    /// Header and trailer lengths differ (only with `TrailerCheck::Strict`).
    #[error("chunk at offset {offset}: header length {header} != trailer length {trailer}")]
    TrailerMismatch { offset: u64, header: u32, trailer: u32 },

    /// A payload read asked for more bytes than the chunk holds.
    #[error("payload exhausted: needed {needed} bytes, {remaining} remaining")]
    PayloadExhausted { needed: usize, remaining: usize },

    /// I/O error from the underlying source or sink.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
