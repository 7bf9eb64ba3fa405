//! Worksheet metadata and the row-index pass.
//!
//! Cell records vastly outnumber ROW headers, so each sheet substream is
//! walked once up front noting only DIMENSIONS and the position of every
//! row: where its ROW record sits and which contiguous run of row-block
//! records (the "row block") contains its cells. Cells are decoded later,
//! on demand, by [`crate::Workbook::row`].

use std::collections::BTreeMap;

use crate::biff::records::{kind_of, RecordKind};
use crate::biff::parser::{read_u16, read_u32};
use crate::biff::{parse_bof, RecordCursor};
use crate::error::XlsResult;

/// Sheet visibility from the BOUNDSHEET record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetVisibility {
    /// Shown in the tab bar.
    Visible,
    /// Hidden, but listable through the UI.
    Hidden,
    /// Hidden and not listable ("very hidden").
    VeryHidden,
}

impl SheetVisibility {
    pub(crate) fn from_code(code: u8) -> Self {
        match code & 0x03 {
            1 => SheetVisibility::Hidden,
            2 => SheetVisibility::VeryHidden,
            _ => SheetVisibility::Visible,
        }
    }
}

/// Sheet type from the BOUNDSHEET record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    /// An ordinary worksheet.
    Worksheet,
    /// A chart sheet.
    Chart,
    /// A Visual Basic / macro sheet.
    Macro,
    /// Any other type byte.
    Other(u8),
}

impl SheetKind {
    pub(crate) fn from_code(code: u8) -> Self {
        match code {
            0x00 => SheetKind::Worksheet,
            0x02 => SheetKind::Chart,
            0x06 => SheetKind::Macro,
            other => SheetKind::Other(other),
        }
    }
}

/// The sheet's used range from its DIMENSIONS record.
///
/// Row and column upper bounds are exclusive, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    /// First used row.
    pub first_row: u32,
    /// One past the last used row.
    pub last_row: u32,
    /// First used column.
    pub first_col: u16,
    /// One past the last used column.
    pub last_col: u16,
}

/// Where a row lives in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAddress {
    /// Row index (0-based).
    pub index: u32,
    /// First used column.
    pub first_used_col: u16,
    /// One past the last used column.
    pub first_unused_col: u16,
    /// Row height in twips (bit 15 of the raw field stripped).
    pub height_twips: u16,
    /// Height was set explicitly rather than auto-sized.
    pub custom_height: bool,
    /// Row is hidden.
    pub hidden: bool,
    /// Outline/grouping level (0-7).
    pub outline_level: u8,
    /// Index of the row block containing this row's records.
    pub(crate) block: usize,
    /// Offset of this row's ROW record within the block.
    pub(crate) offset_in_block: usize,
}

/// Byte extent of one contiguous run of row-block records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowBlock {
    pub(crate) start: usize,
    pub(crate) len: usize,
}

impl RowBlock {
    pub(crate) fn end(&self) -> usize {
        self.start + self.len
    }
}

/// A worksheet registered by a BOUNDSHEET record.
///
/// Holds stream locations and the row index; cell data is materialized
/// lazily through the owning [`crate::Workbook`].
#[derive(Debug)]
pub struct Worksheet {
    name: String,
    bof_offset: usize,
    visibility: SheetVisibility,
    kind: SheetKind,
    range: (usize, usize),
    dimensions: Option<Dimensions>,
    rows: BTreeMap<u32, RowAddress>,
    pub(crate) blocks: Vec<RowBlock>,
}

impl Worksheet {
    pub(crate) fn new(
        name: String,
        bof_offset: usize,
        visibility: SheetVisibility,
        kind: SheetKind,
    ) -> Self {
        Self {
            name,
            bof_offset,
            visibility,
            kind,
            range: (bof_offset, 0),
            dimensions: None,
            rows: BTreeMap::new(),
            blocks: Vec::new(),
        }
    }

    /// Sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute offset of this sheet's BOF in the workbook stream.
    pub fn bof_offset(&self) -> usize {
        self.bof_offset
    }

    /// Sheet visibility.
    pub fn visibility(&self) -> SheetVisibility {
        self.visibility
    }

    /// Sheet type.
    pub fn kind(&self) -> SheetKind {
        self.kind
    }

    /// Resolved `(offset, length)` extent of this sheet's substream.
    pub fn range(&self) -> (usize, usize) {
        self.range
    }

    pub(crate) fn set_range(&mut self, offset: usize, length: usize) {
        self.range = (offset, length);
    }

    /// The used range from the DIMENSIONS record, if one was present.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Whether the row index has an entry for `index`.
    pub fn has_row(&self, index: u32) -> bool {
        self.rows.contains_key(&index)
    }

    /// The stream address of a row, if indexed.
    pub fn row_address(&self, index: u32) -> Option<&RowAddress> {
        self.rows.get(&index)
    }

    /// Indexed row numbers in ascending order.
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }

    /// Number of indexed rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Walk this sheet's substream recording DIMENSIONS, row addresses and
    /// row-block extents. Cell records are skipped, not decoded.
    ///
    /// Damage is not fatal here: the workbook EOF has already been seen,
    /// so a malformed or truncated sheet logs a warning and keeps whatever
    /// index was built.
    pub(crate) fn scan(&mut self, stream: &[u8]) {
        let (range_start, range_len) = self.range;
        let range_end = if range_len > 0 {
            (range_start + range_len).min(stream.len())
        } else {
            stream.len()
        };

        let mut cursor = RecordCursor::new(stream);
        cursor.set_position(self.bof_offset);

        let bof_ok = cursor
            .next_chunk()
            .filter(|first| kind_of(first.opcode) == RecordKind::Bof)
            .and_then(|first| parse_bof(first.data))
            .is_some();
        if !bof_ok {
            log::warn!(
                "sheet '{}' does not start with a BOF record at offset {}",
                self.name,
                self.bof_offset
            );
            return;
        }

        let mut open_block: Option<usize> = None;
        let mut depth = 1u32;

        while cursor.position() < range_end {
            let Some(chunk) = cursor.next_chunk() else {
                log::warn!(
                    "sheet '{}' truncated at offset {}",
                    self.name,
                    cursor.position()
                );
                break;
            };
            let kind = kind_of(chunk.opcode);

            // Anything outside the row-block set ends the current block.
            if !kind.is_row_block() {
                if let Some(idx) = open_block.take() {
                    self.blocks[idx].len = chunk.offset - self.blocks[idx].start;
                }
            }

            match kind {
                RecordKind::Bof => {
                    // Embedded substream (e.g. a chart); records inside it
                    // do not belong to this sheet's rows.
                    depth += 1;
                }
                RecordKind::Eof => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ if depth > 1 => {}
                RecordKind::Dimensions => match parse_dimensions(chunk.data) {
                    Ok(dims) => self.dimensions = Some(dims),
                    Err(e) => {
                        log::warn!("malformed DIMENSIONS at offset {}: {e}", chunk.offset)
                    }
                },
                RecordKind::Row => {
                    let block = match open_block {
                        Some(idx) => idx,
                        None => {
                            self.blocks.push(RowBlock {
                                start: chunk.offset,
                                len: 0,
                            });
                            let idx = self.blocks.len() - 1;
                            open_block = Some(idx);
                            idx
                        }
                    };
                    match parse_row(chunk.data, block, chunk.offset - self.blocks[block].start) {
                        Ok(addr) => {
                            self.rows.insert(addr.index, addr);
                        }
                        Err(e) => log::warn!("malformed ROW at offset {}: {e}", chunk.offset),
                    }
                }
                // Cell records and DBCELL: left for the lazy pass.
                _ => {}
            }
        }

        if let Some(idx) = open_block.take() {
            self.blocks[idx].len = cursor.position() - self.blocks[idx].start;
        }
    }
}

/// Parse a DIMENSIONS record body. BIFF8 uses 32-bit row bounds (14-byte
/// body); BIFF5 uses 16-bit ones (10-byte body).
fn parse_dimensions(data: &[u8]) -> XlsResult<Dimensions> {
    let mut off = 0;
    if data.len() >= 14 {
        let first_row = read_u32(data, &mut off)?;
        let last_row = read_u32(data, &mut off)?;
        let first_col = read_u16(data, &mut off)?;
        let last_col = read_u16(data, &mut off)?;
        Ok(Dimensions {
            first_row,
            last_row,
            first_col,
            last_col,
        })
    } else {
        let first_row = u32::from(read_u16(data, &mut off)?);
        let last_row = u32::from(read_u16(data, &mut off)?);
        let first_col = read_u16(data, &mut off)?;
        let last_col = read_u16(data, &mut off)?;
        Ok(Dimensions {
            first_row,
            last_row,
            first_col,
            last_col,
        })
    }
}

/// Parse a ROW record body into an address entry.
///
/// Layout: row index, first used column, first unused column, height
/// (bit 15 = default-height flag), 4 reserved bytes, then the option
/// flags (outline level bits 0-2, 0x20 hidden, 0x40 custom height).
fn parse_row(data: &[u8], block: usize, offset_in_block: usize) -> XlsResult<RowAddress> {
    let mut off = 0;
    let index = u32::from(read_u16(data, &mut off)?);
    let first_used_col = read_u16(data, &mut off)?;
    let first_unused_col = read_u16(data, &mut off)?;
    let height_raw = read_u16(data, &mut off)?;

    let flags = if data.len() >= 14 {
        off = 12;
        read_u16(data, &mut off)?
    } else {
        0
    };

    Ok(RowAddress {
        index,
        first_used_col,
        first_unused_col,
        height_twips: height_raw & 0x7FFF,
        custom_height: flags & 0x0040 != 0,
        hidden: flags & 0x0020 != 0,
        outline_level: (flags & 0x0007) as u8,
        block,
        offset_in_block,
    })
}
