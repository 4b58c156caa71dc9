//! Tag-length-value record reader.
//!
//! Every record is laid out as:
//!
//! ```text
//! u8[4]  tag
//! u32    length (little-endian, payload bytes)
//! u8[length] payload
//! ```

use crate::error::DecodeErrorKind;
use crate::fourcc::FourCC;

pub const RECORD_HEADER_LEN: usize = 8;

/// A view into the input buffer that remembers its absolute position.
///
/// Offsets in [`crate::DecodeError`] are absolute, so nested payload views carry
/// the offset of their first byte.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Absolute offset of the first byte of this view.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn starts_with(&self, tag: FourCC) -> bool {
        self.bytes.starts_with(tag.as_bytes())
    }

    /// Splits off the first `len` bytes.
    pub fn split(self, len: usize) -> Option<(Cursor<'a>, Cursor<'a>)> {
        if len > self.bytes.len() {
            return None;
        }
        let (head, tail) = self.bytes.split_at(len);
        Some((
            Cursor {
                bytes: head,
                offset: self.offset,
            },
            Cursor {
                bytes: tail,
                offset: self.offset + len,
            },
        ))
    }

    /// Reads one little-endian word.
    pub fn read_u32(self) -> Option<(u32, Cursor<'a>)> {
        let (head, tail) = self.split(4)?;
        let b = head.bytes;
        Some((u32::from_le_bytes([b[0], b[1], b[2], b[3]]), tail))
    }
}

impl core::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("offset", &self.offset)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One record split off the front of a buffer.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub tag: FourCC,
    pub length: u32,
    pub payload: Cursor<'a>,
}

impl Record<'_> {
    /// Absolute offset of the record header.
    pub fn offset(&self) -> usize {
        self.payload.offset() - RECORD_HEADER_LEN
    }
}

/// Reads the record at the front of `cur`, returning it and the bytes after it.
pub fn read_record(cur: Cursor<'_>) -> Result<(Record<'_>, Cursor<'_>), DecodeErrorKind> {
    if cur.len() < RECORD_HEADER_LEN {
        return Err(DecodeErrorKind::TruncatedInput {
            needed: RECORD_HEADER_LEN,
            available: cur.len(),
        });
    }
    let bytes = cur.bytes();
    let tag = FourCC([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let length = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

    let (_, body) = cur
        .split(RECORD_HEADER_LEN)
        .ok_or(DecodeErrorKind::TruncatedInput {
            needed: RECORD_HEADER_LEN,
            available: cur.len(),
        })?;
    let (payload, rest) = usize::try_from(length)
        .ok()
        .and_then(|len| body.split(len))
        .ok_or(DecodeErrorKind::TruncatedPayload {
            tag,
            length,
            available: body.len(),
        })?;

    Ok((
        Record {
            tag,
            length,
            payload,
        },
        rest,
    ))
}
