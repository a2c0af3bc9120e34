//! Binary wire primitives
//!
//! Cursor-based decode/encode of the OSC wire building blocks: big-endian
//! fixed-width numerics, NUL-terminated strings padded to 4-byte fields,
//! and length-prefixed zero-padded blobs.
//!
//! Every aligned read checks that the cursor sits on a 4-byte boundary
//! before touching the buffer. The codec arranges for that to hold; the
//! check is the contract, not a recovery path.

use bytes::{BufMut, Bytes, BytesMut};

use crate::time::TimeTag;
use crate::{Error, Result};

/// Encoded length of a string field of `n` payload bytes: payload plus NUL
/// terminator, padded up to a multiple of 4. Always strictly greater
/// than `n`.
pub fn str_padded_len(n: usize) -> usize {
    (n + 4) & !3
}

/// Encoded length of a blob field of `n` data bytes: the 4-byte length
/// prefix plus data padded up to a multiple of 4.
pub fn blob_padded_len(n: usize) -> usize {
    4 + ((n + 3) & !3)
}

/// A borrowing read cursor over one datagram.
///
/// Reads never touch bytes past the buffer end, and every error carries the
/// absolute offset at which it was detected.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor offset from the start of the buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// The next byte, without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let have = self.remaining();
        if have < needed {
            return Err(Error::BufferUnderrun {
                offset: self.pos,
                needed,
                have,
            });
        }
        Ok(())
    }

    fn ensure_aligned(&self) -> Result<()> {
        if self.pos % 4 != 0 {
            return Err(Error::BadAlignment(self.pos));
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure_aligned()?;
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    pub fn read_timetag(&mut self) -> Result<TimeTag> {
        Ok(TimeTag::from_raw(self.read_u64()?))
    }

    /// Read a NUL-terminated string and skip its padding.
    ///
    /// Scans forward to the first NUL, yields the preceding bytes, then
    /// advances past the padding NULs to the next 4-byte boundary. Fails
    /// with [`Error::MalformedString`] if no NUL occurs before the buffer
    /// end or the payload is not valid UTF-8.
    pub fn read_str(&mut self) -> Result<String> {
        self.ensure_aligned()?;
        let start = self.pos;
        let len = self.buf[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::MalformedString(start))?;
        let text = std::str::from_utf8(&self.buf[start..start + len])
            .map_err(|_| Error::MalformedString(start))?
            .to_string();
        // The whole field, terminator and padding included, must be present.
        self.ensure(str_padded_len(len))?;
        self.pos = start + str_padded_len(len);
        Ok(text)
    }

    /// Read a length-prefixed blob and skip its padding.
    ///
    /// Padding bytes are skipped, not validated; senders are required to
    /// zero them but receivers must not care.
    pub fn read_blob(&mut self) -> Result<Vec<u8>> {
        self.ensure_aligned()?;
        let start = self.pos;
        let len = self.read_u32()? as usize;
        if self.remaining() < len {
            return Err(Error::TruncatedBlob {
                offset: start,
                len,
                have: self.remaining(),
            });
        }
        let data = self.buf[self.pos..self.pos + len].to_vec();
        let padded = (len + 3) & !3;
        self.ensure(padded)?;
        self.pos += padded;
        Ok(data)
    }

    /// Take `len` raw bytes (a size-prefixed bundle element) as a subslice.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure_aligned()?;
        self.ensure(len)?;
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

/// A write cursor producing one datagram.
///
/// Alignment is maintained by construction: every field writer emits a
/// whole number of 4-byte words.
#[derive(Debug)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.put_f32(v);
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.put_i64(v);
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.put_u64(v);
    }

    pub fn write_f64(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    pub fn write_timetag(&mut self, tag: TimeTag) {
        self.buf.put_u64(tag.to_raw());
    }

    /// Write a string field: payload, NUL terminator, padding to the next
    /// 4-byte boundary. A payload with an embedded NUL cannot be encoded.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        if bytes.contains(&0) {
            return Err(Error::MalformedString(self.buf.len()));
        }
        self.buf.put_slice(bytes);
        self.buf.put_bytes(0, str_padded_len(bytes.len()) - bytes.len());
        Ok(())
    }

    /// Write a blob field: 4-byte big-endian length, data, zero padding.
    /// The padding is not counted in the length prefix.
    pub fn write_blob(&mut self, data: &[u8]) {
        self.buf.put_u32(data.len() as u32);
        self.buf.put_slice(data);
        self.buf.put_bytes(0, ((data.len() + 3) & !3) - data.len());
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for WireWriter {
    fn default() -> Self {
        Self::new()
    }
}
