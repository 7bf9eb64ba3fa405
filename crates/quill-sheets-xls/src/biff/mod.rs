//! BIFF (Binary Interchange File Format) record-level handling.
//!
//! A BIFF stream is a sequence of records, each with a 4-byte header
//! (2 bytes opcode + 2 bytes body length, little-endian) followed by the
//! body. [`RecordCursor`] walks that structure over an in-memory buffer;
//! higher layers interpret the bodies.

pub mod parser;
pub mod records;
pub mod strings;

/// BIFF stream versions this reader distinguishes.
///
/// BIFF5 and BIFF7 share their record layouts and string encoding, so a
/// single variant covers both. The version selects the string-decoding
/// primitives and the per-version record handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiffVersion {
    /// BIFF5/BIFF7: byte strings in the workbook code page, no SST.
    Biff5,
    /// BIFF8: unicode strings with a compression flag, SST + LABELSST.
    Biff8,
}

/// A single record, borrowed from the stream buffer.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Byte offset of the record header in the stream.
    pub offset: usize,
    /// Raw 16-bit opcode.
    pub opcode: u16,
    /// Total record length including the 4-byte header.
    pub length: usize,
    /// The record body.
    pub data: &'a [u8],
}

impl<'a> Chunk<'a> {
    /// Offset of the first byte past this record.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Position-tracked iterator over the records of a workbook stream.
///
/// Bodies are borrowed slices; nothing is copied. The cursor can be
/// reseated with [`RecordCursor::set_position`], which is how every
/// decoder that restarts a sub-scan (sheet passes, lazy row reads,
/// formula string pairing) works.
pub struct RecordCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordCursor<'a> {
    /// Create a cursor at the start of the buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reseat the cursor.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// True when fewer than 4 bytes remain (no further header can be read).
    pub fn is_at_end(&self) -> bool {
        self.pos + 4 > self.buf.len()
    }

    /// Read the next record and advance past it.
    ///
    /// Returns `None` when the remaining bytes cannot hold a full header,
    /// or when the declared body length runs past the buffer end. In the
    /// latter case the position is left on the bad header so callers can
    /// report the offset.
    pub fn next_chunk(&mut self) -> Option<Chunk<'a>> {
        let chunk = self.peek_chunk()?;
        self.pos = chunk.end();
        Some(chunk)
    }

    /// Read the next record without advancing.
    pub fn peek_chunk(&self) -> Option<Chunk<'a>> {
        if self.pos + 4 > self.buf.len() {
            return None;
        }
        let opcode = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        let body_len = u16::from_le_bytes([self.buf[self.pos + 2], self.buf[self.pos + 3]]) as usize;
        let body_start = self.pos + 4;
        let body_end = body_start + body_len;
        if body_end > self.buf.len() {
            return None;
        }
        Some(Chunk {
            offset: self.pos,
            opcode,
            length: body_len + 4,
            data: &self.buf[body_start..body_end],
        })
    }
}

/// Extract `(version, substream_type)` from a BOF record body.
pub fn parse_bof(data: &[u8]) -> Option<(u16, u16)> {
    if data.len() < 4 {
        return None;
    }
    let version = u16::from_le_bytes([data[0], data[1]]);
    let dt = u16::from_le_bytes([data[2], data[3]]);
    Some((version, dt))
}

/// Resolve the stream version from the BOF version word.
///
/// Some producers write a zero version word; the substream-type word then
/// disambiguates (0x1000 marks a BIFF5 worksheet BOF).
pub fn biff_version_of(version: u16, dt: u16) -> Option<BiffVersion> {
    match version {
        0x0500 => Some(BiffVersion::Biff5),
        0x0600 => Some(BiffVersion::Biff8),
        0 if dt == 0x1000 => Some(BiffVersion::Biff5),
        0 => Some(BiffVersion::Biff8),
        _ => None,
    }
}
