use std::io::{ErrorKind, Read};
use std::ops::Range;

use super::error::CaptureError;

/// Upper bound on the up-front allocation for a declared body length.
const BODY_PREALLOC_LIMIT: usize = 64 * 1024;

/// Byte order of multi-byte capture fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endianness::Little => u16::from_le_bytes(bytes),
            Endianness::Big => u16::from_be_bytes(bytes),
        }
    }

    pub fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// Missing bytes while reading a fixed field out of an in-memory buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
    pub needed: usize,
    pub actual: usize,
}

impl ShortRead {
    /// Promote to a fatal header error for the structure named by `context`.
    pub fn truncated(self, context: &'static str) -> CaptureError {
        CaptureError::truncated(context, self.needed, self.actual)
    }
}

/// Bounds-checked field access over a header or block body.
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    endianness: Endianness,
}

impl<'a> FieldReader<'a> {
    pub fn new(bytes: &'a [u8], endianness: Endianness) -> Self {
        Self { bytes, endianness }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), ShortRead> {
        if self.bytes.len() < needed {
            return Err(ShortRead {
                needed,
                actual: self.bytes.len(),
            });
        }
        Ok(())
    }

    pub fn read_u16(&self, range: Range<usize>) -> Result<u16, ShortRead> {
        let bytes = self.read_slice(range)?;
        let bytes: [u8; 2] = bytes.try_into().map_err(|_| ShortRead {
            needed: 2,
            actual: bytes.len(),
        })?;
        Ok(self.endianness.u16(bytes))
    }

    pub fn read_u32(&self, range: Range<usize>) -> Result<u32, ShortRead> {
        let bytes = self.read_slice(range)?;
        let bytes: [u8; 4] = bytes.try_into().map_err(|_| ShortRead {
            needed: 4,
            actual: bytes.len(),
        })?;
        Ok(self.endianness.u32(bytes))
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], ShortRead> {
        self.bytes.get(range.clone()).ok_or(ShortRead {
            needed: range.end,
            actual: self.bytes.len(),
        })
    }
}

/// Fill `buf` from the stream.
///
/// Returns `Ok(false)` when the stream is already exhausted (clean end between
/// structures) and a `TruncatedHeader` error when it ends part way through.
pub fn read_fixed_or_eof<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    context: &'static str,
) -> Result<bool, CaptureError> {
    let filled = fill(reader, buf)?;
    if filled == 0 && !buf.is_empty() {
        return Ok(false);
    }
    if filled < buf.len() {
        return Err(CaptureError::truncated(context, buf.len(), filled));
    }
    Ok(true)
}

/// Fill `buf` from the stream; any shortfall is a `TruncatedHeader` error.
pub fn read_fixed<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    context: &'static str,
) -> Result<(), CaptureError> {
    let filled = fill(reader, buf)?;
    if filled < buf.len() {
        return Err(CaptureError::truncated(context, buf.len(), filled));
    }
    Ok(())
}

/// Read up to `len` bytes; the returned buffer is shorter when the stream ends.
pub fn read_body<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>, CaptureError> {
    let mut body = Vec::with_capacity(len.min(BODY_PREALLOC_LIMIT));
    reader.by_ref().take(len as u64).read_to_end(&mut body)?;
    Ok(body)
}

fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, CaptureError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(CaptureError::Io(err)),
        }
    }
    Ok(filled)
}
