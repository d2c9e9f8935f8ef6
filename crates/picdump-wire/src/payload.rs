use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::WireError;

/// Width of every scalar the producer writes except `f64`.
pub const WORD: usize = 4;

/// Little-endian reader over one chunk payload.
///
/// Several scalars can be packed into one chunk; the cursor hands them out
/// in write order. Reading past the end is an error rather than a panic,
/// because a short payload is how a schema mismatch usually shows up.
pub struct PayloadCursor {
    buf: Bytes,
}

impl PayloadCursor {
    #[must_use]
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, needed: usize) -> Result<(), WireError> {
        if self.buf.remaining() < needed {
            return Err(WireError::PayloadExhausted {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    /// # Errors
    ///
    /// [`WireError::PayloadExhausted`] if fewer than 4 bytes remain.
    pub fn i32(&mut self) -> Result<i32, WireError> {
        self.need(WORD)?;
        Ok(self.buf.get_i32_le())
    }

    /// # Errors
    ///
    /// [`WireError::PayloadExhausted`] if fewer than 4 bytes remain.
    pub fn f32(&mut self) -> Result<f32, WireError> {
        self.need(WORD)?;
        Ok(self.buf.get_f32_le())
    }

    /// # Errors
    ///
    /// [`WireError::PayloadExhausted`] if fewer than 8 bytes remain.
    pub fn f64(&mut self) -> Result<f64, WireError> {
        self.need(8)?;
        Ok(self.buf.get_f64_le())
    }

    /// A 4-byte Fortran `LOGICAL`: any non-zero word is true.
    ///
    /// # Errors
    ///
    /// [`WireError::PayloadExhausted`] if fewer than 4 bytes remain.
    pub fn logical(&mut self) -> Result<bool, WireError> {
        self.need(WORD)?;
        Ok(self.buf.get_u32_le() != 0)
    }

    /// A 4-byte character code, blank- and NUL-trimmed (`"x   "` ⇒ `"x"`).
    ///
    /// # Errors
    ///
    /// [`WireError::PayloadExhausted`] if fewer than 4 bytes remain.
    pub fn tag(&mut self) -> Result<String, WireError> {
        self.need(WORD)?;
        let raw = self.buf.split_to(WORD);
        Ok(trim_text(&raw))
    }

    /// Everything left in the payload as trimmed text.
    pub fn rest_text(&mut self) -> String {
        let raw = self.buf.split_to(self.buf.remaining());
        trim_text(&raw)
    }

    /// `n` consecutive f32 values.
    ///
    /// # Errors
    ///
    /// [`WireError::PayloadExhausted`] if fewer than `4 * n` bytes remain.
    pub fn f32_vec(&mut self, n: usize) -> Result<Vec<f32>, WireError> {
        self.need(n.saturating_mul(WORD))?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.buf.get_f32_le());
        }
        Ok(out)
    }
}

fn trim_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

/// Packs little-endian scalars into a chunk payload.
///
/// Mirror image of [`PayloadCursor`], used by the encoder and by tests.
#[derive(Default)]
pub struct PayloadBuilder {
    buf: BytesMut,
}

impl PayloadBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.put_i32_le(v);
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.put_f32_le(v);
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.buf.put_f64_le(v);
        self
    }

    pub fn logical(&mut self, v: bool) -> &mut Self {
        self.buf.put_u32_le(u32::from(v));
        self
    }

    /// Write a character code padded with blanks to 4 bytes.
    ///
    /// Longer codes are cut to their first 4 bytes.
    pub fn tag(&mut self, v: &str) -> &mut Self {
        let mut word = [b' '; WORD];
        for (dst, src) in word.iter_mut().zip(v.bytes()) {
            *dst = src;
        }
        self.buf.put_slice(&word);
        self
    }

    pub fn text(&mut self, v: &str) -> &mut Self {
        self.buf.put_slice(v.as_bytes());
        self
    }

    pub fn f32_slice(&mut self, values: &[f32]) -> &mut Self {
        for &v in values {
            self.buf.put_f32_le(v);
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn finish(&mut self) -> Bytes {
        self.buf.split().freeze()
    }
}
