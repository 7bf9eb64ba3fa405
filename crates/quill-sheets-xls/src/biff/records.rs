//! Opcode dictionary.
//!
//! Raw 16-bit opcodes map to symbolic [`RecordKind`]s. Several record
//! families changed opcode between BIFF generations (the high byte grew a
//! version nibble); both the BIFF5-era low ids and the BIFF8-era high ids
//! resolve to the same kind, and all four BOF opcodes collapse to
//! [`RecordKind::Bof`]. Anything else is [`RecordKind::Unknown`] and gets
//! skipped with its length consumed.

// ── Stream structure ────────────────────────────────────────────────────
pub const BOF_BIFF2: u16 = 0x0009;
pub const BOF_BIFF3: u16 = 0x0209;
pub const BOF_BIFF4: u16 = 0x0409;
pub const BOF: u16 = 0x0809; // BIFF5 and BIFF8
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;
pub const FILEPASS: u16 = 0x002F; // Encryption header; unsupported

// ── Workbook globals ────────────────────────────────────────────────────
pub const CODEPAGE: u16 = 0x0042;
pub const DATEMODE: u16 = 0x0022; // 1900 vs 1904 date system
pub const BOUNDSHEET: u16 = 0x0085; // Sheet name, type, visibility, stream offset
pub const FONT: u16 = 0x0031;
pub const FORMAT: u16 = 0x041E; // Number format string (BIFF5/BIFF8)
pub const XF: u16 = 0x00E0; // Extended Format (cell format record)
pub const XF_BIFF4: u16 = 0x0243;
pub const STYLE: u16 = 0x0293; // Named cell style
pub const SST: u16 = 0x00FC; // Shared String Table (BIFF8)
pub const EXTSST: u16 = 0x00FF; // SST hash table, skipped

// ── Sheet structure ─────────────────────────────────────────────────────
// The BIFF2 DIMENSIONS id is 0x0000, which also shows up as padding in
// damaged streams; it is intentionally left unmapped.
pub const DIMENSIONS: u16 = 0x0200;
pub const ROW_BIFF2: u16 = 0x0008;
pub const ROW: u16 = 0x0208;
pub const DBCELL: u16 = 0x00D7; // Row-block terminator
pub const COLINFO: u16 = 0x007D;
pub const DEFCOLWIDTH: u16 = 0x0055;

// ── Cell records ────────────────────────────────────────────────────────
pub const BLANK_BIFF2: u16 = 0x0001;
pub const BLANK: u16 = 0x0201;
pub const MULBLANK: u16 = 0x00BE;
pub const BOOLERR_BIFF2: u16 = 0x0005;
pub const BOOLERR: u16 = 0x0205;
pub const LABEL_BIFF2: u16 = 0x0004;
pub const LABEL: u16 = 0x0204;
pub const LABELSST: u16 = 0x00FD;
pub const MULRK: u16 = 0x00BD;
pub const NUMBER_BIFF2: u16 = 0x0003;
pub const NUMBER: u16 = 0x0203;
pub const RK_BIFF3: u16 = 0x007E;
pub const RK: u16 = 0x027E;
pub const RSTRING: u16 = 0x00D6; // Rich-text inline string
pub const FORMULA_BIFF3: u16 = 0x0206;
pub const FORMULA_BIFF4: u16 = 0x0406;
pub const FORMULA: u16 = 0x0006; // BIFF5/BIFF8 reuse the BIFF2 id
pub const STRING_BIFF2: u16 = 0x0007;
pub const STRING: u16 = 0x0207; // Cached string result for a FORMULA
pub const INTEGER: u16 = 0x0002; // BIFF2 only; recognized and skipped

// ── BOF substream types (the `dt` field) ────────────────────────────────
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BOF_WORKSHEET: u16 = 0x0010;
pub const BOF_CHART: u16 = 0x0020;
pub const BOF_MACRO: u16 = 0x0040;

/// Symbolic record kinds the reader acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Bof,
    Eof,
    Continue,
    FilePass,
    CodePage,
    DateMode,
    BoundSheet,
    Font,
    Format,
    Xf,
    Style,
    Sst,
    ExtSst,
    Dimensions,
    Row,
    DbCell,
    ColInfo,
    DefColWidth,
    Blank,
    MulBlank,
    BoolErr,
    Label,
    LabelSst,
    MulRk,
    Number,
    Rk,
    RString,
    Formula,
    StringResult,
    Integer,
    Unknown,
}

/// Resolve a raw opcode to its symbolic kind.
pub fn kind_of(opcode: u16) -> RecordKind {
    match opcode {
        BOF_BIFF2 | BOF_BIFF3 | BOF_BIFF4 | BOF => RecordKind::Bof,
        EOF => RecordKind::Eof,
        CONTINUE => RecordKind::Continue,
        FILEPASS => RecordKind::FilePass,
        CODEPAGE => RecordKind::CodePage,
        DATEMODE => RecordKind::DateMode,
        BOUNDSHEET => RecordKind::BoundSheet,
        FONT => RecordKind::Font,
        FORMAT => RecordKind::Format,
        XF | XF_BIFF4 => RecordKind::Xf,
        STYLE => RecordKind::Style,
        SST => RecordKind::Sst,
        EXTSST => RecordKind::ExtSst,
        DIMENSIONS => RecordKind::Dimensions,
        ROW_BIFF2 | ROW => RecordKind::Row,
        DBCELL => RecordKind::DbCell,
        COLINFO => RecordKind::ColInfo,
        DEFCOLWIDTH => RecordKind::DefColWidth,
        BLANK_BIFF2 | BLANK => RecordKind::Blank,
        MULBLANK => RecordKind::MulBlank,
        BOOLERR_BIFF2 | BOOLERR => RecordKind::BoolErr,
        LABEL_BIFF2 | LABEL => RecordKind::Label,
        LABELSST => RecordKind::LabelSst,
        MULRK => RecordKind::MulRk,
        NUMBER_BIFF2 | NUMBER => RecordKind::Number,
        RK_BIFF3 | RK => RecordKind::Rk,
        RSTRING => RecordKind::RString,
        FORMULA | FORMULA_BIFF3 | FORMULA_BIFF4 => RecordKind::Formula,
        STRING_BIFF2 | STRING => RecordKind::StringResult,
        INTEGER => RecordKind::Integer,
        _ => RecordKind::Unknown,
    }
}

impl RecordKind {
    /// Whether this record belongs to a row block: ROW headers, cell
    /// records and the DBCELL terminator. Any other kind closes the
    /// current block during the sheet pass.
    pub fn is_row_block(self) -> bool {
        matches!(
            self,
            RecordKind::Blank
                | RecordKind::BoolErr
                | RecordKind::DbCell
                | RecordKind::Formula
                | RecordKind::Label
                | RecordKind::LabelSst
                | RecordKind::MulBlank
                | RecordKind::MulRk
                | RecordKind::Number
                | RecordKind::Rk
                | RecordKind::Row
                | RecordKind::RString
        )
    }
}
