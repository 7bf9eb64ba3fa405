//! BIFF string decoding.
//!
//! BIFF8 strings carry a character count, a flags byte and optional
//! rich-text/extension headers:
//! - flags bit 0 (`fHighByte`): 1 = UTF-16LE code units, 0 = "compressed"
//!   8-bit characters in the workbook code page
//! - flags bit 2 (`fExtSt`): a 4-byte extension size follows the header
//!   and that many phonetic bytes trail the characters
//! - flags bit 3 (`fRichSt`): a 2-byte run count follows the header and
//!   4 bytes per run trail the characters
//!
//! BIFF5 strings are plain length-prefixed byte runs in the workbook code
//! page. The length prefix is one byte in some records (BOUNDSHEET, FONT)
//! and two in others (LABEL, STRING); callers pass the width.

use super::BiffVersion;
use crate::codepage::Encoder;
use crate::error::{XlsError, XlsResult};
use crate::biff::parser::{read_u16, read_u32, read_u8};

pub(crate) const STR_FLAG_HIGH_BYTE: u8 = 0x01;
pub(crate) const STR_FLAG_EXT: u8 = 0x04;
pub(crate) const STR_FLAG_RICH: u8 = 0x08;

/// Width of the character-count prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenPrefix {
    /// One-byte count (short strings: sheet names, font names).
    U8,
    /// Two-byte count.
    U16,
}

/// Read a string in the given stream version, advancing `offset` past the
/// whole encoding including any rich-run/extension tail.
pub fn read_string(
    version: BiffVersion,
    data: &[u8],
    offset: &mut usize,
    prefix: LenPrefix,
    encoder: &Encoder,
) -> XlsResult<String> {
    match version {
        BiffVersion::Biff5 => read_byte_string(data, offset, prefix, encoder),
        BiffVersion::Biff8 => read_unicode_string(data, offset, prefix, encoder),
    }
}

/// Read a BIFF5 length-prefixed byte string.
pub fn read_byte_string(
    data: &[u8],
    offset: &mut usize,
    prefix: LenPrefix,
    encoder: &Encoder,
) -> XlsResult<String> {
    let count = match prefix {
        LenPrefix::U8 => usize::from(read_u8(data, offset)?),
        LenPrefix::U16 => usize::from(read_u16(data, offset)?),
    };
    let bytes = data
        .get(*offset..*offset + count)
        .ok_or_else(|| XlsError::Parse("byte string runs past record end".into()))?;
    *offset += count;
    Ok(encoder.decode(bytes))
}

/// Read a BIFF8 unicode string.
pub fn read_unicode_string(
    data: &[u8],
    offset: &mut usize,
    prefix: LenPrefix,
    encoder: &Encoder,
) -> XlsResult<String> {
    let char_count = match prefix {
        LenPrefix::U8 => usize::from(read_u8(data, offset)?),
        LenPrefix::U16 => usize::from(read_u16(data, offset)?),
    };
    let flags = read_u8(data, offset)?;

    let rich_runs = if flags & STR_FLAG_RICH != 0 {
        usize::from(read_u16(data, offset)?)
    } else {
        0
    };
    let ext_size = if flags & STR_FLAG_EXT != 0 {
        read_u32(data, offset)? as usize
    } else {
        0
    };

    let text = read_chars(data, offset, char_count, flags & STR_FLAG_HIGH_BYTE != 0, encoder)?;

    // Skip the rich-run array (4 bytes per run) and the extension block.
    let tail = rich_runs * 4 + ext_size;
    if *offset + tail > data.len() {
        return Err(XlsError::Parse(
            "string rich-run/extension tail runs past record end".into(),
        ));
    }
    *offset += tail;

    Ok(text)
}

/// Decode `char_count` characters at `offset`, advancing it.
pub(crate) fn read_chars(
    data: &[u8],
    offset: &mut usize,
    char_count: usize,
    wide: bool,
    encoder: &Encoder,
) -> XlsResult<String> {
    if wide {
        let byte_len = char_count
            .checked_mul(2)
            .ok_or_else(|| XlsError::Parse("string length overflow".into()))?;
        let bytes = data
            .get(*offset..*offset + byte_len)
            .ok_or_else(|| XlsError::Parse("UTF-16 string runs past record end".into()))?;
        *offset += byte_len;
        Ok(decode_utf16le(bytes))
    } else {
        let bytes = data
            .get(*offset..*offset + char_count)
            .ok_or_else(|| XlsError::Parse("compressed string runs past record end".into()))?;
        *offset += char_count;
        Ok(encoder.decode(bytes))
    }
}

/// Decode little-endian UTF-16 bytes, replacing unpaired surrogates.
pub(crate) fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
