use std::io::{ErrorKind, Read, Write};

use bytes::Bytes;

use crate::error::WireError;
use crate::payload::PayloadCursor;

/// Size of the length header and of the length trailer, in bytes.
pub const LENGTH_SIZE: usize = 4;

/// Default ceiling on a single chunk payload (1 GiB).
///
/// A corrupt header would otherwise make the reader try to allocate
/// up to 4 GiB before discovering the source is too short.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 1 << 30;

/// How the 4-byte trailer is checked against the header.
///
/// The producer always writes identical header and trailer lengths, but
/// historical readers never compared them. `Warn` keeps that lenient
/// behaviour while leaving a trace in the logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrailerCheck {
    /// Read the trailer and ignore it.
    Ignore,
    /// Log a warning on mismatch and continue.
    #[default]
    Warn,
    /// Fail with [`WireError::TrailerMismatch`].
    Strict,
}

/// One length-delimited record.
///
/// ```text
/// ┌───────────────────────────────┐
/// │ length   (u32 LE, 4 bytes)    │
/// │ payload  [length bytes]       │
/// │ length   (u32 LE, 4 bytes)    │
/// └───────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    /// Absolute offset of the chunk header in the source.
    pub offset: u64,

    /// The payload bytes, without header or trailer.
    pub payload: Bytes,
}

impl Chunk {
    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// A little-endian cursor over the payload.
    #[must_use]
    pub fn cursor(&self) -> PayloadCursor {
        PayloadCursor::new(self.payload.clone())
    }
}

/// Forward-only reader of length-delimited chunks.
///
/// The stream never reads ahead: each call to [`next_chunk`](Self::next_chunk)
/// consumes exactly `8 + L` bytes from the source and nothing more, so the
/// source position always sits on a chunk boundary between calls.
pub struct ChunkStream<R> {
    reader: R,
    offset: u64,
    chunks_read: u64,
    max_chunk_len: usize,
    trailer_check: TrailerCheck,
}

impl<R: Read> ChunkStream<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            chunks_read: 0,
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            trailer_check: TrailerCheck::default(),
        }
    }

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

    /// Absolute byte offset of the next chunk header.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of chunks consumed so far (skipped ones included).
    #[must_use]
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// Give back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read the next chunk.
    ///
    /// Returns `Ok(None)` when the source is exhausted exactly at a chunk
    /// boundary.
    ///
    /// # Errors
    ///
    /// - [`WireError::Truncated`] when the source ends anywhere after the
    ///   first header byte.
    /// - [`WireError::ChunkTooLarge`] when the header exceeds the limit.
    /// - [`WireError::TrailerMismatch`] under [`TrailerCheck::Strict`].
    /// - [`WireError::Io`] for any other read failure.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, WireError> {
        let start = self.offset;

        let mut header = [0u8; LENGTH_SIZE];
        let got = read_full(&mut self.reader, &mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < LENGTH_SIZE {
            return Err(WireError::Truncated {
                offset: start,
                expected: LENGTH_SIZE,
                available: got,
            });
        }
        let declared = u32::from_le_bytes(header);
        let len = declared as usize;
        if len > self.max_chunk_len {
            return Err(WireError::ChunkTooLarge {
                offset: start,
                len,
                limit: self.max_chunk_len,
            });
        }

        let mut payload = vec![0u8; len];
        let got = read_full(&mut self.reader, &mut payload)?;
        if got < len {
            return Err(WireError::Truncated {
                offset: start,
                expected: len,
                available: got,
            });
        }

        let mut trailer = [0u8; LENGTH_SIZE];
        let got = read_full(&mut self.reader, &mut trailer)?;
        if got < LENGTH_SIZE {
            return Err(WireError::Truncated {
                offset: start,
                expected: LENGTH_SIZE,
                available: got,
            });
        }
        self.check_trailer(start, declared, u32::from_le_bytes(trailer))?;

        self.offset += (2 * LENGTH_SIZE + len) as u64;
        self.chunks_read += 1;
        Ok(Some(Chunk {
            offset: start,
            payload: Bytes::from(payload),
        }))
    }

    /// Consume one chunk and drop its payload.
    ///
    /// Returns `false` if the source was already exhausted at this boundary.
    ///
    /// # Errors
    ///
    /// Same as [`next_chunk`](Self::next_chunk).
    pub fn skip_chunk(&mut self) -> Result<bool, WireError> {
        Ok(self.next_chunk()?.is_some())
    }

    fn check_trailer(&self, offset: u64, header: u32, trailer: u32) -> Result<(), WireError> {
        if header == trailer {
            return Ok(());
        }
        match self.trailer_check {
            TrailerCheck::Ignore => Ok(()),
            TrailerCheck::Warn => {
                tracing::warn!(offset, header, trailer, "chunk trailer does not match header");
                Ok(())
            }
            TrailerCheck::Strict => Err(WireError::TrailerMismatch {
                offset,
                header,
                trailer,
            }),
        }
    }
}

/// Write one chunk: length header, payload, length trailer.
///
/// # Returns
///
/// Total number of bytes written (`8 + payload.len()`).
///
/// # Errors
///
/// [`WireError::ChunkTooLarge`] if the payload does not fit a u32 length,
/// [`WireError::Io`] on write failure.
pub fn write_chunk(w: &mut impl Write, payload: &[u8]) -> Result<usize, WireError> {
    let len = u32::try_from(payload.len()).map_err(|_| WireError::ChunkTooLarge {
        offset: 0,
        len: payload.len(),
        limit: u32::MAX as usize,
    })?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(payload)?;
    w.write_all(&len.to_le_bytes())?;
    Ok(payload.len() + 2 * LENGTH_SIZE)
}

/// Fill `buf` from `reader`, stopping early only at end of input.
///
/// Returns how many bytes were read; less than `buf.len()` means the
/// source ran dry.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize, WireError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(WireError::Io(e)),
        }
    }
    Ok(filled)
}
