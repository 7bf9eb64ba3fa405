#![allow(dead_code)]

//! Workbook-stream fixture builder.
//!
//! Builds just enough BIFF, record by record, to exercise the reader:
//! a globals substream (BOF .. EOF with BOUNDSHEET offsets patched to the
//! real sheet positions) followed by one substream per sheet. Container
//! tests wrap the stream in an in-memory CFB file.

use std::io::{Cursor, Write};

pub const RECORD_BOF: u16 = 0x0809;
pub const RECORD_EOF: u16 = 0x000A;
pub const RECORD_CONTINUE: u16 = 0x003C;
pub const RECORD_FILEPASS: u16 = 0x002F;
pub const RECORD_CODEPAGE: u16 = 0x0042;
pub const RECORD_DATEMODE: u16 = 0x0022;
pub const RECORD_BOUNDSHEET: u16 = 0x0085;
pub const RECORD_FONT: u16 = 0x0031;
pub const RECORD_FORMAT: u16 = 0x041E;
pub const RECORD_XF: u16 = 0x00E0;
pub const RECORD_STYLE: u16 = 0x0293;
pub const RECORD_SST: u16 = 0x00FC;
pub const RECORD_DIMENSIONS: u16 = 0x0200;
pub const RECORD_ROW: u16 = 0x0208;
pub const RECORD_DBCELL: u16 = 0x00D7;
pub const RECORD_WINDOW2: u16 = 0x023E;
pub const RECORD_BLANK: u16 = 0x0201;
pub const RECORD_MULBLANK: u16 = 0x00BE;
pub const RECORD_BOOLERR: u16 = 0x0205;
pub const RECORD_LABEL: u16 = 0x0204;
pub const RECORD_LABELSST: u16 = 0x00FD;
pub const RECORD_MULRK: u16 = 0x00BD;
pub const RECORD_NUMBER: u16 = 0x0203;
pub const RECORD_RK: u16 = 0x027E;
pub const RECORD_RSTRING: u16 = 0x00D6;
pub const RECORD_FORMULA: u16 = 0x0006;
pub const RECORD_STRING: u16 = 0x0207;

pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BOF_WORKSHEET: u16 = 0x0010;
pub const BIFF8_VERSION: u16 = 0x0600;
pub const BIFF5_VERSION: u16 = 0x0500;

/// One record: opcode, length, body.
pub fn record(opcode: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&opcode.to_le_bytes());
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(body);
    out
}

pub fn bof(version: u16, dt: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&version.to_le_bytes());
    body.extend_from_slice(&dt.to_le_bytes());
    body.extend_from_slice(&[0u8; 4]); // build id / year, ignored
    record(RECORD_BOF, &body)
}

pub fn eof() -> Vec<u8> {
    record(RECORD_EOF, &[])
}

pub fn codepage(cp: u16) -> Vec<u8> {
    record(RECORD_CODEPAGE, &cp.to_le_bytes())
}

pub fn datemode(flag: u16) -> Vec<u8> {
    record(RECORD_DATEMODE, &flag.to_le_bytes())
}

/// A FONT record with default metrics and the given name.
pub fn font(name: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&220u16.to_le_bytes()); // 11pt
    body.extend_from_slice(&0u16.to_le_bytes()); // flags
    body.extend_from_slice(&0x7FFFu16.to_le_bytes()); // automatic color
    body.extend_from_slice(&400u16.to_le_bytes()); // weight
    body.extend_from_slice(&0u16.to_le_bytes()); // escapement
    body.extend_from_slice(&[0, 0, 0, 0]); // underline, family, charset, reserved
    body.push(name.len() as u8);
    body.push(0x00); // compressed
    body.extend_from_slice(name.as_bytes());
    record(RECORD_FONT, &body)
}

pub fn format(ifmt: u16, code: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&ifmt.to_le_bytes());
    body.extend_from_slice(&(code.len() as u16).to_le_bytes());
    body.push(0x00); // compressed
    body.extend_from_slice(code.as_bytes());
    record(RECORD_FORMAT, &body)
}

/// A minimal 20-byte XF record referencing a font and a number format.
pub fn xf(font_index: u16, format_index: u16) -> Vec<u8> {
    let mut body = vec![0u8; 20];
    body[0..2].copy_from_slice(&font_index.to_le_bytes());
    body[2..4].copy_from_slice(&format_index.to_le_bytes());
    body[4] = 0x01; // locked, cell XF
    record(RECORD_XF, &body)
}

/// An SST record holding compressed strings (plus its declared counts).
pub fn sst(total: u32, strings: &[&str]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&total.to_le_bytes());
    body.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for s in strings {
        body.extend_from_slice(&(s.chars().count() as u16).to_le_bytes());
        if s.is_ascii() {
            body.push(0x00);
            body.extend_from_slice(s.as_bytes());
        } else {
            body.push(0x01); // UTF-16LE
            for unit in s.encode_utf16() {
                body.extend_from_slice(&unit.to_le_bytes());
            }
        }
    }
    record(RECORD_SST, &body)
}

pub fn dimensions(first_row: u32, last_row: u32, first_col: u16, last_col: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&first_row.to_le_bytes());
    body.extend_from_slice(&last_row.to_le_bytes());
    body.extend_from_slice(&first_col.to_le_bytes());
    body.extend_from_slice(&last_col.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    record(RECORD_DIMENSIONS, &body)
}

pub fn row(index: u16, first_col: u16, first_unused_col: u16) -> Vec<u8> {
    row_with_flags(index, first_col, first_unused_col, 255, 0)
}

pub fn row_with_flags(
    index: u16,
    first_col: u16,
    first_unused_col: u16,
    height: u16,
    flags: u16,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&index.to_le_bytes());
    body.extend_from_slice(&first_col.to_le_bytes());
    body.extend_from_slice(&first_unused_col.to_le_bytes());
    body.extend_from_slice(&height.to_le_bytes());
    body.extend_from_slice(&[0u8; 4]);
    body.extend_from_slice(&flags.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes());
    record(RECORD_ROW, &body)
}

pub fn dbcell() -> Vec<u8> {
    record(RECORD_DBCELL, &4u32.to_le_bytes())
}

fn cell_prefix(row: u16, col: u16, xf: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&col.to_le_bytes());
    body.extend_from_slice(&xf.to_le_bytes());
    body
}

pub fn blank(row: u16, col: u16, xf: u16) -> Vec<u8> {
    record(RECORD_BLANK, &cell_prefix(row, col, xf))
}

pub fn mulblank(row: u16, first_col: u16, xfs: &[u16]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&first_col.to_le_bytes());
    for xf in xfs {
        body.extend_from_slice(&xf.to_le_bytes());
    }
    let last = first_col + xfs.len() as u16 - 1;
    body.extend_from_slice(&last.to_le_bytes());
    record(RECORD_MULBLANK, &body)
}

pub fn boolerr(row: u16, col: u16, xf: u16, value: u8, is_error: u8) -> Vec<u8> {
    let mut body = cell_prefix(row, col, xf);
    body.push(value);
    body.push(is_error);
    record(RECORD_BOOLERR, &body)
}

pub fn label(row: u16, col: u16, xf: u16, text: &str) -> Vec<u8> {
    let mut body = cell_prefix(row, col, xf);
    body.extend_from_slice(&(text.len() as u16).to_le_bytes());
    body.push(0x00); // compressed
    body.extend_from_slice(text.as_bytes());
    record(RECORD_LABEL, &body)
}

pub fn labelsst(row: u16, col: u16, xf: u16, isst: u32) -> Vec<u8> {
    let mut body = cell_prefix(row, col, xf);
    body.extend_from_slice(&isst.to_le_bytes());
    record(RECORD_LABELSST, &body)
}

pub fn mulrk(row: u16, first_col: u16, cells: &[(u16, u32)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&first_col.to_le_bytes());
    for (xf, rk_word) in cells {
        body.extend_from_slice(&xf.to_le_bytes());
        body.extend_from_slice(&rk_word.to_le_bytes());
    }
    let last = first_col + cells.len() as u16 - 1;
    body.extend_from_slice(&last.to_le_bytes());
    record(RECORD_MULRK, &body)
}

pub fn number(row: u16, col: u16, xf: u16, value: f64) -> Vec<u8> {
    let mut body = cell_prefix(row, col, xf);
    body.extend_from_slice(&value.to_le_bytes());
    record(RECORD_NUMBER, &body)
}

pub fn rk(row: u16, col: u16, xf: u16, word: u32) -> Vec<u8> {
    let mut body = cell_prefix(row, col, xf);
    body.extend_from_slice(&word.to_le_bytes());
    record(RECORD_RK, &body)
}

pub fn rstring(row: u16, col: u16, xf: u16, text: &str, runs: &[u8]) -> Vec<u8> {
    let mut body = cell_prefix(row, col, xf);
    body.extend_from_slice(&(text.len() as u16).to_le_bytes());
    body.push(0x00);
    body.extend_from_slice(text.as_bytes());
    body.extend_from_slice(runs);
    record(RECORD_RSTRING, &body)
}

/// RK word for an unscaled integer.
pub fn rk_int(value: i32) -> u32 {
    ((value << 2) as u32) | 0x02
}

/// RK word for an integer divided by 100.
pub fn rk_int_div100(value: i32) -> u32 {
    ((value << 2) as u32) | 0x03
}

/// RK word for a truncated double.
pub fn rk_float(value: f64) -> u32 {
    ((value.to_bits() >> 32) as u32) & 0xFFFF_FFFC
}

/// FORMULA record with a numeric result slot.
pub fn formula_number(row: u16, col: u16, xf: u16, value: f64, tokens: &[u8]) -> Vec<u8> {
    formula_raw(row, col, xf, value.to_le_bytes(), 0, tokens)
}

/// FORMULA record with a typed result slot (0xFFFF tail).
pub fn formula_typed(row: u16, col: u16, xf: u16, ty: u8, operand: u8, tokens: &[u8]) -> Vec<u8> {
    let slot = [ty, 0, operand, 0, 0, 0, 0xFF, 0xFF];
    formula_raw(row, col, xf, slot, 0, tokens)
}

/// FORMULA record with full control of the result slot and option flags.
pub fn formula_raw(
    row: u16,
    col: u16,
    xf: u16,
    slot: [u8; 8],
    grbit: u16,
    tokens: &[u8],
) -> Vec<u8> {
    let mut body = cell_prefix(row, col, xf);
    body.extend_from_slice(&slot);
    body.extend_from_slice(&grbit.to_le_bytes());
    body.extend_from_slice(&[0u8; 4]); // chn
    body.extend_from_slice(&(tokens.len() as u16).to_le_bytes());
    body.extend_from_slice(tokens);
    record(RECORD_FORMULA, &body)
}

/// STRING record carrying a formula's cached string result.
pub fn string_result(text: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(text.len() as u16).to_le_bytes());
    body.push(0x00);
    body.extend_from_slice(text.as_bytes());
    record(RECORD_STRING, &body)
}

/// A sheet substream: BOF(worksheet) + records + EOF.
pub struct Sheet {
    pub name: String,
    pub records: Vec<Vec<u8>>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    pub fn push(mut self, rec: Vec<u8>) -> Self {
        self.records.push(rec);
        self
    }
}

/// Assemble a complete BIFF8 workbook stream.
///
/// `globals` go between the workbook BOF and the BOUNDSHEET records;
/// BOUNDSHEET offsets are patched to where each sheet substream lands.
pub fn workbook_stream(globals: &[Vec<u8>], sheets: &[Sheet]) -> Vec<u8> {
    workbook_stream_versioned(BIFF8_VERSION, globals, sheets)
}

pub fn workbook_stream_versioned(version: u16, globals: &[Vec<u8>], sheets: &[Sheet]) -> Vec<u8> {
    let biff5 = version == BIFF5_VERSION;

    let boundsheet = |name: &str, offset: u32| -> Vec<u8> {
        // Compressed (single-byte, Windows-1252) name bytes: one byte per
        // char, not UTF-8, so non-ASCII names round-trip through the
        // default code page the same way the reader decodes them.
        let name_bytes: Vec<u8> = name.chars().map(|c| c as u8).collect();
        let mut body = Vec::new();
        body.extend_from_slice(&offset.to_le_bytes());
        body.push(0x00); // visible
        body.push(0x00); // worksheet
        body.push(name_bytes.len() as u8);
        if !biff5 {
            body.push(0x00); // compressed
        }
        body.extend_from_slice(&name_bytes);
        record(RECORD_BOUNDSHEET, &body)
    };

    // Size the globals substream with placeholder offsets first.
    let mut globals_len = bof(version, BOF_WORKBOOK_GLOBALS).len();
    for rec in globals {
        globals_len += rec.len();
    }
    for sheet in sheets {
        globals_len += boundsheet(&sheet.name, 0).len();
    }
    globals_len += eof().len();

    let mut substreams: Vec<Vec<u8>> = Vec::new();
    let mut offsets: Vec<u32> = Vec::new();
    let mut pos = globals_len;
    for sheet in sheets {
        let mut sub = bof(version, BOF_WORKSHEET);
        for rec in &sheet.records {
            sub.extend_from_slice(rec);
        }
        sub.extend_from_slice(&eof());
        offsets.push(pos as u32);
        pos += sub.len();
        substreams.push(sub);
    }

    let mut stream = bof(version, BOF_WORKBOOK_GLOBALS);
    for rec in globals {
        stream.extend_from_slice(rec);
    }
    for (sheet, offset) in sheets.iter().zip(&offsets) {
        stream.extend_from_slice(&boundsheet(&sheet.name, *offset));
    }
    stream.extend_from_slice(&eof());
    for sub in &substreams {
        stream.extend_from_slice(sub);
    }
    stream
}

/// Wrap a workbook stream in an in-memory CFB container.
pub fn cfb_container(stream_name: &str, workbook_stream: &[u8]) -> Vec<u8> {
    let cursor = Cursor::new(Vec::new());
    let mut ole = cfb::CompoundFile::create(cursor).expect("create cfb");
    {
        let mut s = ole.create_stream(stream_name).expect("create stream");
        s.write_all(workbook_stream).expect("write stream");
    }
    ole.into_inner().into_inner()
}
