//! Shared String Table assembly.
//!
//! The SST record declares a unique-string count and then packs that many
//! unicode strings, spilling into any number of CONTINUE records. A string
//! may straddle a record boundary anywhere:
//! - between strings or inside a fixed-width header, the boundary is
//!   crossed transparently;
//! - inside character data, the continuation body begins with a fresh
//!   flags byte that re-specifies compression for the remaining
//!   characters. That byte is state, not a new string header.

use quill_sheets_core::SharedString;

use crate::biff::strings::{decode_utf16le, STR_FLAG_EXT, STR_FLAG_HIGH_BYTE, STR_FLAG_RICH};
use crate::codepage::Encoder;
use crate::error::{XlsError, XlsResult};

/// Assemble the shared string table from the SST body and its CONTINUE
/// bodies, in stream order.
///
/// A malformed tail logs a warning and keeps the strings decoded so far;
/// the table invariant (collected == declared) is also checked here.
pub(crate) fn assemble_sst(fragments: &[&[u8]], encoder: &Encoder) -> XlsResult<Vec<SharedString>> {
    let mut cursor = FragmentCursor::new(fragments);

    let _total_refs = cursor.read_u32()?;
    let unique_count = cursor.read_u32()? as usize;

    let mut strings = Vec::with_capacity(unique_count.min(4096));
    for i in 0..unique_count {
        match cursor.read_sst_string(encoder) {
            Ok(s) => strings.push(SharedString::new(s)),
            Err(e) => {
                log::warn!("SST entry {i} of {unique_count} did not decode: {e}");
                break;
            }
        }
    }

    if strings.len() != unique_count {
        log::warn!(
            "SST declared {unique_count} strings but {} decoded",
            strings.len()
        );
    }

    Ok(strings)
}

/// Byte reader spanning the SST body and its continuation bodies.
struct FragmentCursor<'a> {
    fragments: &'a [&'a [u8]],
    frag: usize,
    offset: usize,
}

impl<'a> FragmentCursor<'a> {
    fn new(fragments: &'a [&'a [u8]]) -> Self {
        Self {
            fragments,
            frag: 0,
            offset: 0,
        }
    }

    fn remaining_in_fragment(&self) -> usize {
        self.fragments
            .get(self.frag)
            .map(|f| f.len().saturating_sub(self.offset))
            .unwrap_or(0)
    }

    fn advance_fragment(&mut self) -> XlsResult<()> {
        self.frag += 1;
        self.offset = 0;
        if self.frag >= self.fragments.len() {
            return Err(XlsError::Parse("SST ends mid-entry".into()));
        }
        Ok(())
    }

    /// Read one byte, crossing fragment boundaries transparently. Used for
    /// headers and counts, where continuations carry no flags byte.
    fn read_u8(&mut self) -> XlsResult<u8> {
        loop {
            let frag = self
                .fragments
                .get(self.frag)
                .ok_or_else(|| XlsError::Parse("SST ends mid-entry".into()))?;
            if self.offset < frag.len() {
                let b = frag[self.offset];
                self.offset += 1;
                return Ok(b);
            }
            self.advance_fragment()?;
        }
    }

    fn read_u16(&mut self) -> XlsResult<u16> {
        Ok(u16::from_le_bytes([self.read_u8()?, self.read_u8()?]))
    }

    fn read_u32(&mut self) -> XlsResult<u32> {
        Ok(u32::from_le_bytes([
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
            self.read_u8()?,
        ]))
    }

    fn take_from_current(&mut self, n: usize) -> XlsResult<&'a [u8]> {
        let frag = self
            .fragments
            .get(self.frag)
            .ok_or_else(|| XlsError::Parse("SST ends mid-entry".into()))?;
        let end = self.offset + n;
        if end > frag.len() {
            return Err(XlsError::Parse("SST fragment shorter than expected".into()));
        }
        let out = &frag[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    fn skip(&mut self, mut n: usize) -> XlsResult<()> {
        while n > 0 {
            let available = self.remaining_in_fragment();
            if available == 0 {
                self.advance_fragment()?;
                continue;
            }
            let step = n.min(available);
            self.offset += step;
            n -= step;
        }
        Ok(())
    }

    /// Read one SST entry, honoring mid-string continuation flag bytes.
    fn read_sst_string(&mut self, encoder: &Encoder) -> XlsResult<String> {
        let char_count = usize::from(self.read_u16()?);
        let flags = self.read_u8()?;

        let rich_runs = if flags & STR_FLAG_RICH != 0 {
            usize::from(self.read_u16()?)
        } else {
            0
        };
        let ext_size = if flags & STR_FLAG_EXT != 0 {
            self.read_u32()? as usize
        } else {
            0
        };

        let mut wide = flags & STR_FLAG_HIGH_BYTE != 0;
        let mut remaining = char_count;
        let mut out = String::with_capacity(char_count);

        while remaining > 0 {
            if self.remaining_in_fragment() == 0 {
                // Character data resumes in the next CONTINUE body; its
                // first byte re-specifies the character width.
                self.advance_fragment()?;
                let cont_flags = self.read_u8()?;
                wide = cont_flags & STR_FLAG_HIGH_BYTE != 0;
                continue;
            }

            let width = if wide { 2 } else { 1 };
            let available = self.remaining_in_fragment() / width;
            if available == 0 {
                return Err(XlsError::Parse(
                    "SST continuation splits a UTF-16 code unit".into(),
                ));
            }

            let take = remaining.min(available);
            let bytes = self.take_from_current(take * width)?;
            if wide {
                out.push_str(&decode_utf16le(bytes));
            } else {
                out.push_str(&encoder.decode(bytes));
            }
            remaining -= take;
        }

        // Formatting runs and the phonetic block are not interpreted.
        self.skip(rich_runs * 4 + ext_size)?;

        Ok(out)
    }
}
