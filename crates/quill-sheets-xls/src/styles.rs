//! Style record parsing: FONT, FORMAT, XF and STYLE.
//!
//! XF records are captured verbatim into [`Format`]; color fields keep
//! their raw palette indices. The number-format index is resolved against
//! the format-string table, which is pre-populated with the built-in
//! format codes below.

use std::collections::BTreeMap;

use quill_sheets_core::style::{Escapement, Underline};
use quill_sheets_core::{Font, Format};

use crate::biff::parser::{read_u16, read_u32, read_u8};
use crate::biff::strings::{read_string, LenPrefix};
use crate::biff::BiffVersion;
use crate::codepage::Encoder;
use crate::error::{XlsError, XlsResult};

// ============================================================================
// Built-in number formats
// ============================================================================

/// The format codes implied by built-in format indices ([MS-XLS] §2.4.126).
///
/// Indices 5–8 and 23–36 are locale-dependent; the codes here are the
/// en-US renderings, which is what FORMAT-less workbooks expect.
pub(crate) const BUILTIN_FORMATS: &[(u16, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (5, "$#,##0_);($#,##0)"),
    (6, "$#,##0_);[Red]($#,##0)"),
    (7, "$#,##0.00_);($#,##0.00)"),
    (8, "$#,##0.00_);[Red]($#,##0.00)"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "m/d/yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0_);(#,##0)"),
    (38, "#,##0_);[Red](#,##0)"),
    (39, "#,##0.00_);(#,##0.00)"),
    (40, "#,##0.00_);[Red](#,##0.00)"),
    (41, "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)"),
    (42, "_($* #,##0_);_($* (#,##0);_($* \"-\"_);_(@_)"),
    (43, "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)"),
    (44, "_($* #,##0.00_);_($* (#,##0.00);_($* \"-\"??_);_(@_)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mm:ss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

/// A format-string table seeded with the built-in codes.
pub(crate) fn builtin_format_table() -> BTreeMap<u16, String> {
    BUILTIN_FORMATS
        .iter()
        .map(|(id, code)| (*id, (*code).to_string()))
        .collect()
}

// ============================================================================
// Record parsers
// ============================================================================

/// Parse a FONT record (0x0031).
///
/// Layout:
///   0  u16  dyHeight  — height in twips (1/20 pt)
///   2  u16  grbit     — bit 1 italic, bit 3 strike, bit 4 outline, bit 5 shadow
///   4  u16  icv       — color index
///   6  u16  bls       — weight (400 normal, 700 bold)
///   8  u16  sss       — escapement (0/1/2)
///  10  u8   uls       — underline type
///  11  u8   bFamily
///  12  u8   bCharSet
///  13  u8   reserved
///  14  ...  name      — short string (1-byte length prefix)
pub(crate) fn parse_font(
    data: &[u8],
    version: BiffVersion,
    encoder: &Encoder,
) -> XlsResult<Font> {
    if data.len() < 14 {
        return Err(XlsError::Parse("FONT record too short".into()));
    }

    let mut off = 0;
    let height = read_u16(data, &mut off)?;
    let grbit = read_u16(data, &mut off)?;
    let icv = read_u16(data, &mut off)?;
    let bls = read_u16(data, &mut off)?;
    let sss = read_u16(data, &mut off)?;
    let uls = read_u8(data, &mut off)?;
    let family = read_u8(data, &mut off)?;
    let charset = read_u8(data, &mut off)?;
    let _reserved = read_u8(data, &mut off)?;

    let name = if off < data.len() {
        read_string(version, data, &mut off, LenPrefix::U8, encoder).unwrap_or_default()
    } else {
        String::new()
    };

    Ok(Font {
        name,
        height_twips: height,
        weight: bls,
        italic: grbit & 0x0002 != 0,
        strikethrough: grbit & 0x0008 != 0,
        outline: grbit & 0x0010 != 0,
        shadow: grbit & 0x0020 != 0,
        color_index: icv,
        escapement: Escapement::from_code(sss),
        underline: Underline::from_code(uls),
        family,
        charset,
    })
}

/// Parse a FORMAT record (0x041E): ifmt index + format string.
pub(crate) fn parse_format(
    data: &[u8],
    version: BiffVersion,
    encoder: &Encoder,
) -> XlsResult<(u16, String)> {
    let mut off = 0;
    let ifmt = read_u16(data, &mut off)?;
    let code = match version {
        // BIFF5 stores the code as a byte string with a 1-byte length.
        BiffVersion::Biff5 => read_string(version, data, &mut off, LenPrefix::U8, encoder)?,
        BiffVersion::Biff8 => read_string(version, data, &mut off, LenPrefix::U16, encoder)?,
    };
    Ok((ifmt, code))
}

/// Parse an XF record into a [`Format`].
///
/// The BIFF8 layout is 20 bytes ([MS-XLS] §2.4.353):
///   0   u16  ifnt
///   2   u16  ifmt
///   4   u16  protection bits 0-1, style flag bit 2, parent XF bits 4-15
///   6   u8   halign bits 0-2, wrap bit 3, valign bits 4-6
///   7   u8   rotation
///   8   u8   indent bits 0-3, shrink bit 4, merge bit 5, direction bits 6-7
///   9   u8   used-attribute flags (not captured)
///  10   u32  border lines left/right/top/bottom, left/right colors, diag dir
///  14   u32  top/bottom/diag colors, diag line, fill pattern
///  18   u16  pattern and background color indices
///
/// BIFF5's 16-byte XF shares the first 8 bytes; its border/fill packing
/// differs and is left at defaults.
///
/// The number-format `code` is not resolved here; the caller owns the
/// format-string table.
pub(crate) fn parse_xf(data: &[u8]) -> XlsResult<Format> {
    if data.len() < 8 {
        return Err(XlsError::Parse(format!(
            "XF record too short: {} bytes",
            data.len()
        )));
    }

    let mut off = 0;
    let ifnt = read_u16(data, &mut off)?;
    let ifmt = read_u16(data, &mut off)?;
    let prot = read_u16(data, &mut off)?;

    let mut fmt = Format {
        font_index: ifnt,
        format_index: ifmt,
        locked: prot & 0x0001 != 0,
        hidden: prot & 0x0002 != 0,
        style_xf: prot & 0x0004 != 0,
        parent_index: (prot >> 4) & 0x0FFF,
        ..Format::default()
    };

    let align = read_u8(data, &mut off)?;
    fmt.horizontal_align = align & 0x07;
    fmt.wrap = align & 0x08 != 0;
    fmt.vertical_align = (align >> 4) & 0x07;

    if data.len() < 20 {
        return Ok(fmt);
    }

    fmt.rotation = read_u8(data, &mut off)?;

    let align2 = read_u8(data, &mut off)?;
    fmt.indent = align2 & 0x0F;
    fmt.shrink_to_fit = align2 & 0x10 != 0;
    fmt.merged = align2 & 0x20 != 0;
    fmt.text_direction = (align2 >> 6) & 0x03;

    let _used_attrs = read_u8(data, &mut off)?;

    let border1 = read_u32(data, &mut off)?;
    fmt.border_left = (border1 & 0x0F) as u8;
    fmt.border_right = ((border1 >> 4) & 0x0F) as u8;
    fmt.border_top = ((border1 >> 8) & 0x0F) as u8;
    fmt.border_bottom = ((border1 >> 12) & 0x0F) as u8;
    fmt.icv_left = ((border1 >> 16) & 0x7F) as u16;
    fmt.icv_right = ((border1 >> 23) & 0x7F) as u16;
    fmt.diagonal_direction = ((border1 >> 30) & 0x03) as u8;

    let border2 = read_u32(data, &mut off)?;
    fmt.icv_top = (border2 & 0x7F) as u16;
    fmt.icv_bottom = ((border2 >> 7) & 0x7F) as u16;
    fmt.icv_diagonal = ((border2 >> 14) & 0x7F) as u16;
    fmt.border_diagonal = ((border2 >> 21) & 0x0F) as u8;
    fmt.fill_pattern = ((border2 >> 26) & 0x3F) as u8;

    let fill = read_u16(data, &mut off)?;
    fmt.icv_pattern = fill & 0x7F;
    fmt.icv_background = (fill >> 7) & 0x7F;

    Ok(fmt)
}

/// A STYLE record: a named or built-in style anchored to a style XF.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleEntry {
    /// Index of the style XF this entry decorates.
    pub xf_index: u16,
    /// Built-in style id and outline level, when bit 15 of the record is set.
    pub builtin: Option<(u8, u8)>,
    /// User-defined style name.
    pub name: Option<String>,
}

/// Parse a STYLE record (0x0293).
pub(crate) fn parse_style(
    data: &[u8],
    version: BiffVersion,
    encoder: &Encoder,
) -> XlsResult<StyleEntry> {
    let mut off = 0;
    let ixfe = read_u16(data, &mut off)?;
    let xf_index = ixfe & 0x0FFF;

    if ixfe & 0x8000 != 0 {
        let id = read_u8(data, &mut off)?;
        let level = read_u8(data, &mut off)?;
        Ok(StyleEntry {
            xf_index,
            builtin: Some((id, level)),
            name: None,
        })
    } else {
        let name = match version {
            BiffVersion::Biff5 => read_string(version, data, &mut off, LenPrefix::U8, encoder)?,
            BiffVersion::Biff8 => read_string(version, data, &mut off, LenPrefix::U16, encoder)?,
        };
        Ok(StyleEntry {
            xf_index,
            builtin: None,
            name: Some(name),
        })
    }
}
