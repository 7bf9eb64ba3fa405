//! Cell format (XF) records

/// A cell format captured from an XF record.
///
/// Every cell references one of these by index. The fields mirror the
/// record: alignment, rotation and border codes are the file's byte
/// values, and the `icv_*` fields are raw palette color indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Format {
    /// Index into the workbook font table.
    pub font_index: u16,
    /// Raw number-format index from the record.
    pub format_index: u16,
    /// The number-format string the index resolved to (built-in or from a
    /// FORMAT record).
    pub code: String,

    /// Cell is locked when the sheet is protected.
    pub locked: bool,
    /// Formula is hidden when the sheet is protected.
    pub hidden: bool,
    /// This is a style XF rather than a cell XF.
    pub style_xf: bool,
    /// Index of the parent style XF.
    pub parent_index: u16,

    // Alignment
    /// Horizontal alignment code (0 = general, 1 = left, 2 = center, ...).
    pub horizontal_align: u8,
    /// Vertical alignment code (0 = top, 1 = center, 2 = bottom, ...).
    pub vertical_align: u8,
    /// Wrap text
    pub wrap: bool,
    /// Rotation code (0, 1-90 CCW, 91-180 CW, 255 = stacked).
    pub rotation: u8,
    /// Indent level
    pub indent: u8,
    /// Shrink to fit
    pub shrink_to_fit: bool,
    /// Part of a merged cell range.
    pub merged: bool,
    /// Text direction (0 = context, 1 = left-to-right, 2 = right-to-left).
    pub text_direction: u8,

    // Borders: line-style codes (0 = none .. 13 = slant dash-dot) and raw
    // palette color indices per edge.
    /// Left border line style.
    pub border_left: u8,
    /// Right border line style.
    pub border_right: u8,
    /// Top border line style.
    pub border_top: u8,
    /// Bottom border line style.
    pub border_bottom: u8,
    /// Diagonal border line style.
    pub border_diagonal: u8,
    /// Left border color index.
    pub icv_left: u16,
    /// Right border color index.
    pub icv_right: u16,
    /// Top border color index.
    pub icv_top: u16,
    /// Bottom border color index.
    pub icv_bottom: u16,
    /// Diagonal border color index.
    pub icv_diagonal: u16,
    /// Diagonal direction (1 = down, 2 = up, 3 = both).
    pub diagonal_direction: u8,

    // Fill
    /// Fill pattern code (0 = none, 1 = solid, ...).
    pub fill_pattern: u8,
    /// Pattern (foreground) color index.
    pub icv_pattern: u16,
    /// Background color index.
    pub icv_background: u16,
}

impl Format {
    /// Whether the resolved number format is plain "General".
    pub fn is_general(&self) -> bool {
        self.code.eq_ignore_ascii_case("general")
    }
}
