//! Byte source abstraction
//!
//! A [`Tokenizer`] provides forward-only, position-tracked, typed reads over
//! an arbitrary byte source. Buffer-backed tokenizers additionally support
//! unbounded peeking; stream-backed tokenizers keep a small rolling window.

use std::io::Read;

use bytes::{Buf, BytesMut};

use crate::error::{ProbeError, Result};


/// Forward reader over a byte source
///
/// Implementations track the absolute byte position and may know the total
/// source size. Reads never seek backwards; `peek_into` inspects upcoming
/// bytes without consuming them.
pub trait Tokenizer {
    /// Total size of the source in bytes, if known
    fn size_hint(&self) -> Option<u64>;

    /// Current absolute byte position
    fn position(&self) -> u64;

    /// Fill `dst` completely from the source
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::EndOfStream`] if fewer than `dst.len()` bytes
    /// remain, [`ProbeError::Cancelled`] if the source was dropped.
    fn read_into(&mut self, dst: &mut [u8]) -> Result<()>;

    /// Copy upcoming bytes into `dst` without advancing
    ///
    /// Returns the number of bytes copied, which is short only at the end
    /// of the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails.
    fn peek_into(&mut self, dst: &mut [u8]) -> Result<usize>;

    /// Advance the position by `len` bytes without returning data
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::EndOfStream`] if the source ends first.
    fn skip(&mut self, len: u64) -> Result<()>;
}

macro_rules! typed_read {
    ($read_name:ident, $peek_name:ident, $ty:ty, $n:expr, $from:ident) => {
        #[doc = concat!("Read a `", stringify!($ty), "` (", stringify!($from), ")")]
        ///
        /// # Errors
        ///
        /// Returns [`ProbeError::EndOfStream`] if the source ends first.
        fn $read_name(&mut self) -> Result<$ty> {
            let mut buf = [0u8; $n];
            self.read_into(&mut buf)?;
            Ok(<$ty>::$from(buf))
        }

        #[doc = concat!("Peek a `", stringify!($ty), "` (", stringify!($from), ") without advancing")]
        ///
        /// # Errors
        ///
        /// Returns [`ProbeError::EndOfStream`] if the source ends first.
        fn $peek_name(&mut self) -> Result<$ty> {
            let mut buf = [0u8; $n];
            let n = self.peek_into(&mut buf)?;
            if n < $n {
                return Err(ProbeError::EndOfStream {
                    position: self.position(),
                });
            }
            Ok(<$ty>::$from(buf))
        }
    };
}

/// Typed read extensions available on every [`Tokenizer`]
pub trait TokenizerExt: Tokenizer {
    typed_read!(read_u8, peek_u8, u8, 1, from_be_bytes);
    typed_read!(read_i8, peek_i8, i8, 1, from_be_bytes);
    typed_read!(read_u16_be, peek_u16_be, u16, 2, from_be_bytes);
    typed_read!(read_u16_le, peek_u16_le, u16, 2, from_le_bytes);
    typed_read!(read_i16_be, peek_i16_be, i16, 2, from_be_bytes);
    typed_read!(read_i16_le, peek_i16_le, i16, 2, from_le_bytes);
    typed_read!(read_u32_be, peek_u32_be, u32, 4, from_be_bytes);
    typed_read!(read_u32_le, peek_u32_le, u32, 4, from_le_bytes);
    typed_read!(read_i32_be, peek_i32_be, i32, 4, from_be_bytes);
    typed_read!(read_i32_le, peek_i32_le, i32, 4, from_le_bytes);
    typed_read!(read_u64_be, peek_u64_be, u64, 8, from_be_bytes);
    typed_read!(read_u64_le, peek_u64_le, u64, 8, from_le_bytes);
    typed_read!(read_i64_be, peek_i64_be, i64, 8, from_be_bytes);
    typed_read!(read_i64_le, peek_i64_le, i64, 8, from_le_bytes);
    typed_read!(read_f32_be, peek_f32_be, f32, 4, from_be_bytes);
    typed_read!(read_f64_be, peek_f64_be, f64, 8, from_be_bytes);

    /// Read an unsigned 24-bit big-endian integer
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::EndOfStream`] if the source ends first.
    fn read_u24_be(&mut self) -> Result<u32> {
        let mut buf = [0u8; 3];
        self.read_into(&mut buf)?;
        Ok((u32::from(buf[0]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[2]))
    }

    /// Read an unsigned 24-bit little-endian integer
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::EndOfStream`] if the source ends first.
    fn read_u24_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 3];
        self.read_into(&mut buf)?;
        Ok((u32::from(buf[2]) << 16) | (u32::from(buf[1]) << 8) | u32::from(buf[0]))
    }

    /// Read `len` bytes into a fresh buffer
    ///
    /// Checks a declared length against the known source size before
    /// allocating, so a corrupt size field cannot trigger a huge
    /// allocation.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::EndOfStream`] if the source ends first.
    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        if let Some(size) = self.size_hint() {
            let remaining = size.saturating_sub(self.position());
            if len as u64 > remaining {
                return Err(ProbeError::EndOfStream {
                    position: self.position(),
                });
            }
        }
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Peek up to `len` bytes into a fresh buffer
    ///
    /// The returned buffer is truncated to the bytes actually available.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails.
    fn peek_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let n = self.peek_into(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Advance up to `len` bytes, stopping quietly at the end
    ///
    /// Unlike [`Tokenizer::skip`], running out of bytes is not an error.
    /// Returns the number of bytes actually skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails.
    fn ignore(&mut self, len: u64) -> Result<u64> {
        let mut left = len;
        let mut scratch = [0u8; 512];
        while left > 0 {
            let want = usize::try_from(left).map_or(scratch.len(), |l| l.min(scratch.len()));
            let n = self.peek_into(&mut scratch[..want])?;
            if n == 0 {
                break;
            }
            self.skip(n as u64)?;
            left -= n as u64;
        }
        Ok(len - left)
    }

    /// Read a four-character code
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::EndOfStream`] if the source ends first.
    fn read_fourcc(&mut self) -> Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Read `len` bytes as UTF-8 text
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Decode`] if the bytes are not valid UTF-8.
    fn read_utf8(&mut self, len: usize) -> Result<String> {
        let buf = self.read_vec(len)?;
        String::from_utf8(buf).map_err(|_| ProbeError::decode("text", "invalid UTF-8"))
    }

    /// Read `len` bytes as latin1 text
    ///
    /// Every byte maps to the Unicode code point of the same value, so this
    /// conversion cannot fail.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::EndOfStream`] if the source ends first.
    fn read_latin1(&mut self, len: usize) -> Result<String> {
        let buf = self.read_vec(len)?;
        Ok(buf.iter().map(|&b| b as char).collect())
    }
}

impl<T: Tokenizer + ?Sized> TokenizerExt for T {}

/// Tokenizer over an in-memory buffer
///
/// Peek windows are unbounded and `skip` is O(1).
pub struct BufferTokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BufferTokenizer<'a> {
    /// Create a tokenizer over `data`
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes remaining in the buffer
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl Tokenizer for BufferTokenizer<'_> {
    fn size_hint(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        if dst.len() > self.remaining() {
            return Err(ProbeError::EndOfStream {
                position: self.position(),
            });
        }
        dst.copy_from_slice(&self.data[self.pos..self.pos + dst.len()]);
        self.pos += dst.len();
        Ok(())
    }

    fn peek_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        let n = dst.len().min(self.remaining());
        dst[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        Ok(n)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        let len = usize::try_from(len).map_err(|_| ProbeError::EndOfStream {
            position: self.position(),
        })?;
        if len > self.remaining() {
            return Err(ProbeError::EndOfStream {
                position: self.position(),
            });
        }
        self.pos += len;
        Ok(())
    }
}

/// How many bytes the stream tokenizer pulls from the source at a time
const CHUNK_SIZE: usize = 8 * 1024;

/// Tokenizer over a forward-only [`Read`] stream
///
/// Peeked bytes accumulate in a rolling window and are served back on the
/// next read. `skip` discards through a bounded scratch buffer, so it never
/// buffers more than one chunk at a time.
pub struct StreamTokenizer<R> {
    inner: R,
    window: BytesMut,
    pos: u64,
    size: Option<u64>,
    eof: bool,
}

impl<R: Read> StreamTokenizer<R> {
    /// Create a tokenizer over `inner` with an unknown size
    pub fn new(inner: R) -> Self {
        Self::with_size(inner, None)
    }

    /// Create a tokenizer over `inner` with a caller-supplied size
    pub fn with_size(inner: R, size: Option<u64>) -> Self {
        Self {
            inner,
            window: BytesMut::new(),
            pos: 0,
            size,
            eof: false,
        }
    }

    /// Grow the window until it holds `want` bytes or the source ends
    fn fill_window(&mut self, want: usize) -> Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        while self.window.len() < want && !self.eof {
            let n = self.inner.read(&mut chunk).map_err(ProbeError::from)?;
            if n == 0 {
                self.eof = true;
            } else {
                self.window.extend_from_slice(&chunk[..n]);
            }
        }
        Ok(())
    }
}

impl<R: Read> Tokenizer for StreamTokenizer<R> {
    fn size_hint(&self) -> Option<u64> {
        self.size
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        self.fill_window(dst.len())?;
        if self.window.len() < dst.len() {
            return Err(ProbeError::EndOfStream { position: self.pos });
        }
        dst.copy_from_slice(&self.window[..dst.len()]);
        self.window.advance(dst.len());
        self.pos += dst.len() as u64;
        Ok(())
    }

    fn peek_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.fill_window(dst.len())?;
        let n = dst.len().min(self.window.len());
        dst[..n].copy_from_slice(&self.window[..n]);
        Ok(n)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        let from_window = (self.window.len() as u64).min(len);
        self.window
            .advance(usize::try_from(from_window).unwrap_or(usize::MAX));
        self.pos += from_window;

        let mut left = len - from_window;
        let mut scratch = [0u8; CHUNK_SIZE];
        while left > 0 {
            let want = usize::try_from(left.min(CHUNK_SIZE as u64)).unwrap_or(CHUNK_SIZE);
            let n = self.inner.read(&mut scratch[..want]).map_err(ProbeError::from)?;
            if n == 0 {
                return Err(ProbeError::EndOfStream { position: self.pos });
            }
            self.pos += n as u64;
            left -= n as u64;
        }
        Ok(())
    }
}

/// Positioned reads over a source of known size
///
/// Used only to locate trailing headers (ID3v1, Lyrics3, APEv2) before the
/// primary forward parse begins.
pub trait RandomRead {
    /// Total size of the source in bytes
    fn len(&self) -> u64;

    /// Whether the source is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy bytes starting at `pos` into `dst`, returning the count copied
    ///
    /// The count is short only when `pos + dst.len()` runs past the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails.
    fn read_at(&self, pos: u64, dst: &mut [u8]) -> Result<usize>;
}

impl RandomRead for [u8] {
    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    fn read_at(&self, pos: u64, dst: &mut [u8]) -> Result<usize> {
        let Ok(pos) = usize::try_from(pos) else {
            return Ok(0);
        };
        if pos >= <[u8]>::len(self) {
            return Ok(0);
        }
        let n = dst.len().min(<[u8]>::len(self) - pos);
        dst[..n].copy_from_slice(&self[pos..pos + n]);
        Ok(n)
    }
}
