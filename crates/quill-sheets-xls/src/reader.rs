//! XLS (BIFF) reader.
//!
//! Opens a Compound File Binary (CFB/OLE2) container, pulls the workbook
//! stream into memory, and runs the passes in order:
//!
//! 1. **Globals**: BOF → EOF of the workbook substream, filling the code
//!    page, date mode, sheet registry and the font/format/XF/style/SST
//!    tables. Sheet substreams are never entered here.
//! 2. **Sheet directory**: BOUNDSHEET offsets, sorted, partition the rest
//!    of the stream into per-sheet ranges.
//! 3. **Row index**: each worksheet substream is walked once, recording
//!    DIMENSIONS and row addresses. Cells stay undecoded until
//!    [`Workbook::row`] asks for them.

use std::io::{Read, Seek};
use std::path::Path;

use crate::biff::parser::{read_u16, read_u32, read_u8};
use crate::biff::records::{kind_of, RecordKind};
use crate::biff::strings::{read_string, LenPrefix};
use crate::biff::{biff_version_of, parse_bof, BiffVersion, RecordCursor};
use crate::codepage::Encoder;
use crate::error::{XlsError, XlsResult};
use crate::styles;
use crate::workbook::{BoundsheetStats, DateBase, Workbook};
use crate::worksheet::{SheetKind, SheetVisibility, Worksheet};

/// XLS file reader.
pub struct XlsReader;

impl XlsReader {
    /// Read an XLS file from a filesystem path.
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsResult<Workbook> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read(file)
    }

    /// Read an XLS file from any `Read + Seek` source.
    pub fn read<R: Read + Seek>(reader: R) -> XlsResult<Workbook> {
        let mut cfb = cfb::CompoundFile::open(reader)?;

        // BIFF8 writers name the stream "Workbook"; BIFF5 used "Book".
        let stream_path = if cfb.exists("/Workbook") {
            "/Workbook"
        } else if cfb.exists("/Book") {
            "/Book"
        } else {
            return Err(XlsError::InvalidFormat(
                "no Workbook or Book stream in the container".into(),
            ));
        };

        let mut stream = Vec::new();
        cfb.open_stream(stream_path)?.read_to_end(&mut stream)?;
        Self::read_workbook_stream(stream)
    }

    /// Read an already-extracted workbook stream.
    pub fn read_workbook_stream(stream: Vec<u8>) -> XlsResult<Workbook> {
        let globals = read_globals(&stream)?;
        let mut sheets = globals.sheets;

        resolve_sheet_ranges(&mut sheets, stream.len());
        for sheet in &mut sheets {
            if sheet.kind() == SheetKind::Worksheet {
                sheet.scan(&stream);
            }
        }

        let mut workbook = Workbook::new(stream, globals.biff_word, globals.version);
        workbook.encoder = globals.encoder;
        workbook.date_base = globals.date_base;
        workbook.sheets = sheets;
        workbook.fonts = globals.fonts;
        workbook.format_codes = globals.format_codes;
        workbook.formats = globals.formats;
        workbook.styles = globals.styles;
        workbook.sst = globals.sst;
        workbook.boundsheets = globals.boundsheets;
        Ok(workbook)
    }
}

/// Everything the globals pass produces.
struct Globals {
    biff_word: u16,
    version: BiffVersion,
    encoder: Encoder,
    date_base: DateBase,
    sheets: Vec<Worksheet>,
    fonts: Vec<quill_sheets_core::Font>,
    format_codes: std::collections::BTreeMap<u16, String>,
    formats: Vec<quill_sheets_core::Format>,
    styles: Vec<styles::StyleEntry>,
    sst: Vec<quill_sheets_core::SharedString>,
    boundsheets: BoundsheetStats,
}

/// Stream the workbook-globals substream.
///
/// One record at a time; CONTINUE records never overwrite the
/// previous-record tracking, which is what routes SST continuations.
fn read_globals(stream: &[u8]) -> XlsResult<Globals> {
    let mut cursor = RecordCursor::new(stream);

    let first = cursor
        .next_chunk()
        .ok_or_else(|| XlsError::InvalidFormat("stream too short for a BOF record".into()))?;
    if kind_of(first.opcode) != RecordKind::Bof {
        return Err(XlsError::InvalidFormat(format!(
            "workbook stream does not begin with BOF (opcode {:#06x})",
            first.opcode
        )));
    }
    let (biff_word, dt) = parse_bof(first.data)
        .ok_or_else(|| XlsError::Parse("BOF record shorter than 4 bytes".into()))?;
    let version = match biff_version_of(biff_word, dt) {
        Some(v) => v,
        None => {
            log::warn!(
                "unsupported BIFF version word {biff_word:#06x}; reading version-agnostic records"
            );
            BiffVersion::Biff5
        }
    };

    let mut encoder = Encoder::default();
    let mut date_base = DateBase::default();
    let mut sheets: Vec<Worksheet> = Vec::new();
    let mut fonts = Vec::new();
    let mut format_codes = styles::builtin_format_table();
    let mut formats: Vec<quill_sheets_core::Format> = Vec::new();
    let mut style_entries = Vec::new();
    let mut boundsheets = BoundsheetStats::default();
    let mut sst_fragments: Vec<(usize, usize)> = Vec::new();
    let mut previous = RecordKind::Unknown;
    let mut saw_eof = false;

    while let Some(chunk) = cursor.next_chunk() {
        let kind = kind_of(chunk.opcode);
        let body_range = (chunk.offset + 4, chunk.end());
        match kind {
            RecordKind::Eof => {
                saw_eof = true;
                break;
            }
            RecordKind::Bof => {
                // Sheet substreams are walked by the sheet pass, never
                // from here.
                log::warn!(
                    "unexpected BOF at offset {} inside workbook globals",
                    chunk.offset
                );
            }
            RecordKind::FilePass => return Err(XlsError::Encrypted),
            RecordKind::CodePage => {
                let mut off = 0;
                let code_page = read_u16(chunk.data, &mut off)?;
                encoder = Encoder::from_code_page(code_page)?;
            }
            RecordKind::DateMode => {
                let mut off = 0;
                let flag = read_u16(chunk.data, &mut off).unwrap_or(0);
                date_base = if flag == 1 {
                    DateBase::Date1904
                } else {
                    DateBase::Date1900
                };
            }
            RecordKind::BoundSheet => {
                boundsheets.count += 1;
                if boundsheets.count == 1 {
                    boundsheets.first_offset = chunk.offset;
                }
                boundsheets.total_len += chunk.length;
                match parse_boundsheet(chunk.data, version, &encoder) {
                    Ok(sheet) => sheets.push(sheet),
                    Err(e) => log::warn!("malformed BOUNDSHEET at offset {}: {e}", chunk.offset),
                }
            }
            RecordKind::Font => match styles::parse_font(chunk.data, version, &encoder) {
                Ok(font) => fonts.push(font),
                Err(e) => log::warn!("malformed FONT at offset {}: {e}", chunk.offset),
            },
            RecordKind::Format => match styles::parse_format(chunk.data, version, &encoder) {
                Ok((ifmt, code)) => {
                    format_codes.insert(ifmt, code);
                }
                Err(e) => log::warn!("malformed FORMAT at offset {}: {e}", chunk.offset),
            },
            RecordKind::Xf => match styles::parse_xf(chunk.data) {
                Ok(fmt) => formats.push(fmt),
                Err(e) => log::warn!("malformed XF at offset {}: {e}", chunk.offset),
            },
            RecordKind::Style => match styles::parse_style(chunk.data, version, &encoder) {
                Ok(style) => style_entries.push(style),
                Err(e) => log::warn!("malformed STYLE at offset {}: {e}", chunk.offset),
            },
            RecordKind::Sst => {
                sst_fragments.clear();
                sst_fragments.push(body_range);
            }
            RecordKind::Continue => {
                if previous == RecordKind::Sst {
                    sst_fragments.push(body_range);
                } else {
                    log::warn!(
                        "unexpected CONTINUE at offset {} (previous record {:?})",
                        chunk.offset,
                        previous
                    );
                }
                // CONTINUE extends the previous record; tracking must not
                // move past it.
                continue;
            }
            // EXTSST, the BIFF2 INTEGER record, and anything unknown are
            // skipped with their length consumed.
            _ => {}
        }
        previous = kind;
    }

    if !saw_eof {
        return Err(XlsError::TruncatedStream(cursor.position()));
    }

    // The code page is settled by now; SST strings decode with the final
    // encoder.
    let sst = if sst_fragments.is_empty() {
        Vec::new()
    } else {
        let fragments: Vec<&[u8]> = sst_fragments
            .iter()
            .map(|&(start, end)| &stream[start..end])
            .collect();
        crate::sst::assemble_sst(&fragments, &encoder)?
    };

    // XF number-format indices resolve against the completed table, so
    // FORMAT records may appear after the XFs that use them.
    for fmt in &mut formats {
        fmt.code = format_codes
            .get(&fmt.format_index)
            .cloned()
            .unwrap_or_else(|| "General".to_string());
    }

    Ok(Globals {
        biff_word,
        version,
        encoder,
        date_base,
        sheets,
        fonts,
        format_codes,
        formats,
        styles: style_entries,
        sst,
        boundsheets,
    })
}

/// Parse a BOUNDSHEET record: stream offset, visibility, sheet type, name.
fn parse_boundsheet(
    data: &[u8],
    version: BiffVersion,
    encoder: &Encoder,
) -> XlsResult<Worksheet> {
    let mut off = 0;
    let bof_offset = read_u32(data, &mut off)? as usize;
    let visibility = SheetVisibility::from_code(read_u8(data, &mut off)?);
    let kind = SheetKind::from_code(read_u8(data, &mut off)?);
    let name = read_string(version, data, &mut off, LenPrefix::U8, encoder)?;
    Ok(Worksheet::new(name, bof_offset, visibility, kind))
}

/// Assign each sheet its `(offset, length)` range: sheet k's substream
/// ends where the next sheet (by ascending offset) begins, and the last
/// one ends at the buffer end. BOUNDSHEET order is not offset order.
fn resolve_sheet_ranges(sheets: &mut [Worksheet], stream_len: usize) {
    let mut order: Vec<usize> = (0..sheets.len()).collect();
    order.sort_by_key(|&i| sheets[i].bof_offset());

    for (pos, &i) in order.iter().enumerate() {
        let start = sheets[i].bof_offset();
        if start >= stream_len {
            log::warn!(
                "sheet '{}' claims offset {start} beyond the stream ({stream_len} bytes)",
                sheets[i].name()
            );
            continue;
        }
        let end = order
            .get(pos + 1)
            .map(|&next| sheets[next].bof_offset())
            .unwrap_or(stream_len)
            .min(stream_len);
        sheets[i].set_range(start, end.saturating_sub(start));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundsheet_biff8() {
        let mut data = Vec::new();
        data.extend_from_slice(&512u32.to_le_bytes());
        data.push(0x01); // hidden
        data.push(0x00); // worksheet
        data.push(6);
        data.push(0x00); // compressed
        data.extend_from_slice(b"Totals");

        let ws = parse_boundsheet(&data, BiffVersion::Biff8, &Encoder::default()).unwrap();
        assert_eq!(ws.name(), "Totals");
        assert_eq!(ws.bof_offset(), 512);
        assert_eq!(ws.visibility(), SheetVisibility::Hidden);
        assert_eq!(ws.kind(), SheetKind::Worksheet);
    }

    #[test]
    fn boundsheet_biff5() {
        let mut data = Vec::new();
        data.extend_from_slice(&64u32.to_le_bytes());
        data.push(0x00);
        data.push(0x02); // chart
        data.push(2);
        data.extend_from_slice(b"Q1"); // byte string, no flags byte

        let ws = parse_boundsheet(&data, BiffVersion::Biff5, &Encoder::default()).unwrap();
        assert_eq!(ws.name(), "Q1");
        assert_eq!(ws.kind(), SheetKind::Chart);
    }

    #[test]
    fn ranges_partition_the_stream_tail() {
        let mut sheets = vec![
            Worksheet::new("B".into(), 700, SheetVisibility::Visible, SheetKind::Worksheet),
            Worksheet::new("A".into(), 300, SheetVisibility::Visible, SheetKind::Worksheet),
        ];
        resolve_sheet_ranges(&mut sheets, 1000);

        // Registered out of offset order; ranges pair up by offset.
        assert_eq!(sheets[1].range(), (300, 400));
        assert_eq!(sheets[0].range(), (700, 300));
    }

    #[test]
    fn out_of_bounds_offset_is_left_unranged() {
        let mut sheets = vec![Worksheet::new(
            "X".into(),
            5000,
            SheetVisibility::Visible,
            SheetKind::Worksheet,
        )];
        resolve_sheet_ranges(&mut sheets, 1000);
        assert_eq!(sheets[0].range().1, 0);
    }
}
