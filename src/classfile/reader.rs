//! Big-endian cursor over class-file bytes

use super::MalformedTypeError;

/// Bounds-checked big-endian reader.
///
/// Every read reports the offset it failed at so that a truncated or
/// corrupt class file produces a precise `MalformedTypeError`.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset from the start of the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn u1(&mut self) -> Result<u8, MalformedTypeError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(MalformedTypeError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    pub fn u2(&mut self) -> Result<u16, MalformedTypeError> {
        let s = self.take(2)?;
        Ok(u16::from_be_bytes([s[0], s[1]]))
    }

    pub fn u4(&mut self) -> Result<u32, MalformedTypeError> {
        let s = self.take(4)?;
        Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
    }

    pub fn i4(&mut self) -> Result<i32, MalformedTypeError> {
        self.u4().map(|v| v as i32)
    }

    pub fn u8(&mut self) -> Result<u64, MalformedTypeError> {
        let hi = self.u4()? as u64;
        let lo = self.u4()? as u64;
        Ok((hi << 32) | lo)
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], MalformedTypeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(MalformedTypeError::Truncated { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), MalformedTypeError> {
        self.take(len).map(|_| ())
    }

    /// Reader bounded to the next `len` bytes; offsets stay absolute.
    /// `self` advances past the bounded region.
    pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>, MalformedTypeError> {
        let start = self.pos;
        self.skip(len)?;
        Ok(ByteReader {
            bytes: &self.bytes[..self.pos],
            pos: start,
        })
    }
}

/// Decode the JVM's "modified UTF-8" encoding.
///
/// Differs from standard UTF-8 in two ways: NUL is written as `C0 80`, and
/// supplementary characters are written as two 3-byte surrogate halves.
pub fn decode_modified_utf8(bytes: &[u8], offset: usize) -> Result<String, MalformedTypeError> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        if !s.contains('\u{0}') {
            return Ok(s.to_string());
        }
    }

    let invalid = || MalformedTypeError::InvalidUtf8 { offset };
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        if b0 & 0x80 == 0 {
            if b0 == 0 {
                return Err(invalid());
            }
            units.push(b0);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = *bytes.get(i + 1).ok_or_else(invalid)? as u16;
            if b1 & 0xC0 != 0x80 {
                return Err(invalid());
            }
            units.push(((b0 & 0x1F) << 6) | (b1 & 0x3F));
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = *bytes.get(i + 1).ok_or_else(invalid)? as u16;
            let b2 = *bytes.get(i + 2).ok_or_else(invalid)? as u16;
            if b1 & 0xC0 != 0x80 || b2 & 0xC0 != 0x80 {
                return Err(invalid());
            }
            units.push(((b0 & 0x0F) << 12) | ((b1 & 0x3F) << 6) | (b2 & 0x3F));
            i += 3;
        } else {
            return Err(invalid());
        }
    }

    // Unpaired surrogates are legal in class files but not in a Rust string
    Ok(char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect())
}
