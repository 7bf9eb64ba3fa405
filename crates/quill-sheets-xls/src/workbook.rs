//! The workbook aggregate and lazy row materialization.
//!
//! [`Workbook`] owns the raw workbook stream plus everything the globals
//! pass produced: tables, sheets and the shared string table. Cell data
//! is not decoded until [`Workbook::row`] is called; the worksheet pass
//! only recorded where each row's records live.

use std::collections::BTreeMap;

use quill_sheets_core::{CellError, CellValue, Font, Format, FormulaCell, Row, SharedString};

use crate::biff::parser::{read_f64, read_rk, read_u16, read_u32, read_u8, RkValue};
use crate::biff::records::{kind_of, RecordKind};
use crate::biff::strings::{read_byte_string, read_unicode_string, LenPrefix};
use crate::biff::{BiffVersion, RecordCursor};
use crate::codepage::Encoder;
use crate::error::{XlsError, XlsResult};
use crate::styles::StyleEntry;
use crate::worksheet::Worksheet;

/// Which day zero the workbook's serial dates count from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateBase {
    /// Serial 0 is 1899-12-31 (the 1900 date system).
    #[default]
    Date1900,
    /// Serial 0 is 1904-01-01 (the 1904 date system).
    Date1904,
}

impl DateBase {
    /// The epoch as `(year, month, day)`.
    pub fn epoch_ymd(&self) -> (i32, u32, u32) {
        match self {
            DateBase::Date1900 => (1899, 12, 31),
            DateBase::Date1904 => (1904, 1, 1),
        }
    }
}

/// Aggregate BOUNDSHEET bookkeeping: how many records were seen, where
/// the first one sat, and their total byte length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundsheetStats {
    /// Number of BOUNDSHEET records.
    pub count: u32,
    /// Stream offset of the first BOUNDSHEET record.
    pub first_offset: usize,
    /// Total bytes of all BOUNDSHEET records, headers included.
    pub total_len: usize,
}

/// Rows decoded by the most recent materialization. Cleared whenever a
/// row outside it is requested.
struct BlockCache {
    sheet: usize,
    rows: BTreeMap<u32, Row>,
}

/// An in-memory workbook backed by its BIFF stream.
///
/// Produced by [`crate::XlsReader`]. Sheet metadata and the global tables
/// are fully populated; rows are decoded on first request and cached one
/// row block at a time, so the reader is cheap to open even on large
/// files. Requesting rows takes `&mut self` (the cursor and the cache are
/// part of the reader's state); a `Workbook` is not meant to be shared
/// across threads mid-read.
pub struct Workbook {
    pub(crate) stream: Vec<u8>,
    /// Raw version word from the workbook BOF.
    pub(crate) biff_word: u16,
    pub(crate) version: BiffVersion,
    pub(crate) encoder: Encoder,
    pub(crate) date_base: DateBase,
    pub(crate) sheets: Vec<Worksheet>,
    pub(crate) fonts: Vec<Font>,
    pub(crate) format_codes: BTreeMap<u16, String>,
    pub(crate) formats: Vec<Format>,
    pub(crate) styles: Vec<StyleEntry>,
    pub(crate) sst: Vec<SharedString>,
    pub(crate) boundsheets: BoundsheetStats,
    cache: Option<BlockCache>,
}

impl Workbook {
    pub(crate) fn new(stream: Vec<u8>, biff_word: u16, version: BiffVersion) -> Self {
        Self {
            stream,
            biff_word,
            version,
            encoder: Encoder::default(),
            date_base: DateBase::default(),
            sheets: Vec::new(),
            fonts: Vec::new(),
            format_codes: crate::styles::builtin_format_table(),
            formats: Vec::new(),
            styles: Vec::new(),
            sst: Vec::new(),
            boundsheets: BoundsheetStats::default(),
            cache: None,
        }
    }

    /// The stream version the reader decoded with.
    pub fn version(&self) -> BiffVersion {
        self.version
    }

    /// The raw BOF version word (e.g. 0x0600 for BIFF8).
    pub fn biff_version_word(&self) -> u16 {
        self.biff_word
    }

    /// The code page strings were decoded with.
    pub fn code_page(&self) -> u16 {
        self.encoder.code_page()
    }

    /// The workbook's date system.
    pub fn date_base(&self) -> DateBase {
        self.date_base
    }

    /// Number of registered sheets.
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// All sheets, in workbook order.
    pub fn worksheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    /// A sheet by position.
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    /// A sheet position by name.
    pub fn worksheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name() == name)
    }

    /// All fonts, in record order.
    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }

    /// A font by its file index. Index 4 does not exist in BIFF files;
    /// references above it are shifted down one slot.
    pub fn font(&self, index: u16) -> Option<&Font> {
        let slot = if index >= 5 { index - 1 } else { index };
        self.fonts.get(usize::from(slot))
    }

    /// The cell format (XF) table.
    pub fn formats(&self) -> &[Format] {
        &self.formats
    }

    /// A cell format by XF index.
    pub fn format(&self, xf_index: u16) -> Option<&Format> {
        self.formats.get(usize::from(xf_index))
    }

    /// The number-format string for a format index, built-ins included.
    pub fn format_code(&self, format_index: u16) -> Option<&str> {
        self.format_codes.get(&format_index).map(String::as_str)
    }

    /// STYLE records, in record order.
    pub fn styles(&self) -> &[StyleEntry] {
        &self.styles
    }

    /// Number of shared strings.
    pub fn shared_string_count(&self) -> usize {
        self.sst.len()
    }

    /// A shared string by SST index.
    pub fn shared_string(&self, index: u32) -> Option<&SharedString> {
        self.sst.get(index as usize)
    }

    /// BOUNDSHEET bookkeeping from the globals pass.
    pub fn boundsheet_stats(&self) -> BoundsheetStats {
        self.boundsheets
    }

    /// Materialize a row.
    ///
    /// Rows come back from a one-block cache: asking for the same row
    /// twice, or for another row whose records sat in the same row block,
    /// does not reread the stream. A row index with no entry in the
    /// sheet's row index yields an empty row.
    pub fn row(&mut self, sheet: usize, index: u32) -> XlsResult<&Row> {
        if sheet >= self.sheets.len() {
            return Err(XlsError::InvalidFormat(format!(
                "worksheet index {sheet} out of range ({} sheets)",
                self.sheets.len()
            )));
        }

        let cached = matches!(
            &self.cache,
            Some(c) if c.sheet == sheet && c.rows.contains_key(&index)
        );
        if !cached {
            let rows = self.materialize_block(sheet, index)?;
            self.cache = Some(BlockCache { sheet, rows });
        }

        let cache = self.cache.as_mut().expect("cache populated above");
        Ok(cache
            .rows
            .entry(index)
            .or_insert_with(|| Row::new(index)))
    }

    /// Decode the row block containing `index`, returning every row whose
    /// cells were encountered. The cursor is local, so repeated reads are
    /// idempotent.
    fn materialize_block(&self, sheet: usize, index: u32) -> XlsResult<BTreeMap<u32, Row>> {
        let ws = &self.sheets[sheet];
        let mut rows = BTreeMap::new();

        let Some(addr) = ws.row_address(index) else {
            return Ok(rows);
        };
        let block = ws.blocks[addr.block];
        let (range_start, range_len) = ws.range();
        let sheet_end = if range_len > 0 {
            (range_start + range_len).min(self.stream.len())
        } else {
            self.stream.len()
        };

        let mut cursor = RecordCursor::new(&self.stream);
        cursor.set_position(block.start + addr.offset_in_block);

        let mut found = false;
        while cursor.position() < sheet_end {
            let Some(chunk) = cursor.next_chunk() else {
                break;
            };
            let kind = kind_of(chunk.opcode);
            match kind {
                RecordKind::Eof | RecordKind::DbCell => break,
                RecordKind::Row => {
                    // Headers of this block's rows; the next block's
                    // headers end the walk once cells have been seen.
                    if found {
                        break;
                    }
                }
                RecordKind::Blank
                | RecordKind::MulBlank
                | RecordKind::BoolErr
                | RecordKind::Label
                | RecordKind::LabelSst
                | RecordKind::MulRk
                | RecordKind::Number
                | RecordKind::Rk
                | RecordKind::RString
                | RecordKind::Formula => {
                    found = true;
                    // A length mismatch loses this record only; the body
                    // has already been consumed.
                    if let Err(e) =
                        self.decode_cell(kind, chunk.data, chunk.offset, &mut cursor, &mut rows)
                    {
                        log::warn!("malformed {kind:?} record at offset {}: {e}", chunk.offset);
                    }
                }
                // Anything else (STRING follow-ups already consumed by the
                // formula path, window/selection records, unknown opcodes)
                // is skipped.
                _ => {}
            }
        }

        Ok(rows)
    }

    /// Decode one cell record into the row map.
    fn decode_cell(
        &self,
        kind: RecordKind,
        data: &[u8],
        offset: usize,
        cursor: &mut RecordCursor<'_>,
        rows: &mut BTreeMap<u32, Row>,
    ) -> XlsResult<()> {
        match kind {
            RecordKind::Blank => {
                let (row, col, xf) = cell_header(data)?;
                set_cell(rows, row, col, xf, CellValue::Empty);
            }
            RecordKind::MulBlank => self.decode_mulblank(data, rows)?,
            RecordKind::BoolErr => {
                let (row, col, xf) = cell_header(data)?;
                let mut off = 6;
                let value = read_u8(data, &mut off)?;
                let is_error = read_u8(data, &mut off)?;
                let cell = if is_error != 0 {
                    CellValue::Error(CellError::from_code(value))
                } else {
                    CellValue::Bool(value > 0)
                };
                set_cell(rows, row, col, xf, cell);
            }
            RecordKind::Label => {
                let (row, col, xf) = cell_header(data)?;
                let mut off = 6;
                let text = self.read_cell_string(data, &mut off)?;
                set_cell(rows, row, col, xf, CellValue::Text(text.into()));
            }
            RecordKind::LabelSst => {
                let (row, col, xf) = cell_header(data)?;
                let mut off = 6;
                let isst = read_u32(data, &mut off)?;
                let cell = match self.shared_string(isst) {
                    Some(s) => CellValue::Shared(s.clone()),
                    None => {
                        log::warn!(
                            "LABELSST index {isst} outside the SST ({} entries)",
                            self.sst.len()
                        );
                        CellValue::Empty
                    }
                };
                set_cell(rows, row, col, xf, cell);
            }
            RecordKind::MulRk => self.decode_mulrk(data, rows)?,
            RecordKind::Number => {
                let (row, col, xf) = cell_header(data)?;
                let mut off = 6;
                let n = read_f64(data, &mut off)?;
                set_cell(rows, row, col, xf, CellValue::Number(n));
            }
            RecordKind::Rk => {
                let (row, col, xf) = cell_header(data)?;
                let mut off = 6;
                let cell = match read_rk(data, &mut off)? {
                    RkValue::Int(i) => CellValue::Int(i),
                    RkValue::Float(f) => CellValue::Number(f),
                };
                set_cell(rows, row, col, xf, cell);
            }
            RecordKind::RString => {
                let (row, col, xf) = cell_header(data)?;
                let mut off = 6;
                let text = self.read_cell_string(data, &mut off)?;
                // The trailing formatting-run list is kept verbatim.
                let runs = data[off.min(data.len())..].to_vec();
                set_cell(
                    rows,
                    row,
                    col,
                    xf,
                    CellValue::Rich {
                        text: text.into(),
                        runs,
                    },
                );
            }
            RecordKind::Formula => self.decode_formula(data, offset, cursor, rows)?,
            _ => unreachable!("decode_cell called for non-cell record"),
        }
        Ok(())
    }

    /// MULBLANK: row, first column, one XF per column, trailing last-column
    /// word (discarded).
    fn decode_mulblank(&self, data: &[u8], rows: &mut BTreeMap<u32, Row>) -> XlsResult<()> {
        if data.len() < 6 {
            return Err(XlsError::Parse("MULBLANK record too short".into()));
        }
        let mut off = 0;
        let row = u32::from(read_u16(data, &mut off)?);
        let mut col = read_u16(data, &mut off)?;
        let run_end = data.len() - 2;
        while off + 2 <= run_end {
            let xf = read_u16(data, &mut off)?;
            set_cell(rows, row, col, xf, CellValue::Empty);
            col = col.saturating_add(1);
        }
        Ok(())
    }

    /// MULRK: row, first column, (XF, RK) pairs at stride 6, trailing
    /// last-column word (discarded).
    fn decode_mulrk(&self, data: &[u8], rows: &mut BTreeMap<u32, Row>) -> XlsResult<()> {
        if data.len() < 10 {
            return Err(XlsError::Parse("MULRK record too short".into()));
        }
        let mut off = 0;
        let row = u32::from(read_u16(data, &mut off)?);
        let mut col = read_u16(data, &mut off)?;
        let run_end = data.len() - 2;
        while off + 6 <= run_end {
            let xf = read_u16(data, &mut off)?;
            let cell = match read_rk(data, &mut off)? {
                RkValue::Int(i) => CellValue::Int(i),
                RkValue::Float(f) => CellValue::Number(f),
            };
            set_cell(rows, row, col, xf, cell);
            col = col.saturating_add(1);
        }
        Ok(())
    }

    /// FORMULA: 20-byte header (row, col, xf, 8-byte result slot, option
    /// flags, 4 unused) then the raw RPN bytes, captured verbatim.
    ///
    /// A result slot whose tail is 0xFFFF holds a typed result instead of
    /// a double; type 0 promises a STRING record immediately after.
    fn decode_formula(
        &self,
        data: &[u8],
        offset: usize,
        cursor: &mut RecordCursor<'_>,
        rows: &mut BTreeMap<u32, Row>,
    ) -> XlsResult<()> {
        if data.len() < 20 {
            return Err(XlsError::Parse("FORMULA record too short".into()));
        }
        let (row, col, xf) = cell_header(data)?;
        let slot: [u8; 8] = data[6..14].try_into().expect("length checked");
        let mut off = 14;
        let grbit = read_u16(data, &mut off)?;
        let _chn = read_u32(data, &mut off)?;
        let tokens = data[20..].to_vec();

        let result = if slot[6] != 0xFF || slot[7] != 0xFF || slot[0] > 3 {
            CellValue::Number(f64::from_le_bytes(slot))
        } else {
            match slot[0] {
                0 => self.take_formula_string(offset, cursor),
                1 => CellValue::Bool(slot[2] > 0),
                2 => CellValue::Error(CellError::from_code(slot[2])),
                _ => CellValue::Empty,
            }
        };

        set_cell(
            rows,
            row,
            col,
            xf,
            CellValue::Formula(Box::new(FormulaCell {
                shared: grbit & 0x0008 != 0,
                tokens,
                result,
            })),
        );
        Ok(())
    }

    /// A formula declared a string result: the next record must be STRING.
    /// When it is not, the cursor stays put so the intruding record is
    /// processed normally, and the result degrades to #N/A.
    fn take_formula_string(&self, formula_offset: usize, cursor: &mut RecordCursor<'_>) -> CellValue {
        match cursor.peek_chunk() {
            Some(next) if kind_of(next.opcode) == RecordKind::StringResult => {
                cursor.set_position(next.end());
                let mut off = 0;
                match self.read_formula_result_string(next.data, &mut off) {
                    Ok(text) => CellValue::Text(text.into()),
                    Err(e) => {
                        log::warn!("STRING record after formula at offset {formula_offset} did not decode: {e}");
                        CellValue::Error(CellError::Na)
                    }
                }
            }
            _ => {
                log::warn!("STRING record expected after formula at offset {formula_offset}");
                CellValue::Error(CellError::Na)
            }
        }
    }

    /// STRING record payload: a 2-byte-count string in either version.
    fn read_formula_result_string(&self, data: &[u8], off: &mut usize) -> XlsResult<String> {
        match self.version {
            BiffVersion::Biff5 => read_byte_string(data, off, LenPrefix::U16, &self.encoder),
            BiffVersion::Biff8 => read_unicode_string(data, off, LenPrefix::U16, &self.encoder),
        }
    }

    /// Inline cell string (LABEL, RSTRING): 2-byte count, version-encoded.
    fn read_cell_string(&self, data: &[u8], off: &mut usize) -> XlsResult<String> {
        match self.version {
            BiffVersion::Biff5 => read_byte_string(data, off, LenPrefix::U16, &self.encoder),
            BiffVersion::Biff8 => read_unicode_string(data, off, LenPrefix::U16, &self.encoder),
        }
    }
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("version", &self.version)
            .field("code_page", &self.encoder.code_page())
            .field("date_base", &self.date_base)
            .field("sheets", &self.sheets.len())
            .field("fonts", &self.fonts.len())
            .field("formats", &self.formats.len())
            .field("shared_strings", &self.sst.len())
            .finish()
    }
}

/// The common `(row, column, xf)` cell-record prefix.
fn cell_header(data: &[u8]) -> XlsResult<(u32, u16, u16)> {
    let mut off = 0;
    let row = u32::from(read_u16(data, &mut off)?);
    let col = read_u16(data, &mut off)?;
    let xf = read_u16(data, &mut off)?;
    Ok((row, col, xf))
}

fn set_cell(rows: &mut BTreeMap<u32, Row>, row: u32, col: u16, xf: u16, value: CellValue) {
    rows.entry(row)
        .or_insert_with(|| Row::new(row))
        .set_cell(col, xf, value);
}
