//! Cell value types

use std::fmt;
use std::sync::Arc;

/// The value stored in a cell.
///
/// Integer and floating-point values are kept apart because the BIFF RK
/// encoding distinguishes them; callers that do not care can use
/// [`CellValue::as_number`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell (possibly carrying formatting).
    Empty,

    /// Boolean value (TRUE/FALSE).
    Bool(bool),

    /// Error value (#VALUE!, #REF!, ...).
    Error(CellError),

    /// Integer value (30-bit signed range).
    Int(i32),

    /// IEEE-754 double value.
    Number(f64),

    /// String resolved from the workbook's shared string table.
    Shared(SharedString),

    /// Inline string stored directly in the cell record.
    Text(SharedString),

    /// Rich-text inline string. The formatting run list is kept as the raw
    /// record bytes; it is not interpreted.
    Rich {
        /// The text content.
        text: SharedString,
        /// Raw formatting-run bytes (4 bytes per run).
        runs: Vec<u8>,
    },

    /// Formula cell: captured token bytes plus the decoded cached result.
    Formula(Box<FormulaCell>),
}

/// A formula cell. The expression is kept as the raw RPN token bytes from
/// the record; it is never evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaCell {
    /// Part of a shared-formula group.
    pub shared: bool,
    /// Raw RPN token bytes, exactly as stored in the record.
    pub tokens: Vec<u8>,
    /// The cached result stored alongside the formula.
    pub result: CellValue,
}

impl CellValue {
    /// Create an inline text value.
    pub fn text<S: AsRef<str>>(s: S) -> Self {
        CellValue::Text(SharedString::new(s))
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to read the value as a number. Integers and booleans coerce;
    /// formulas defer to their cached result.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            CellValue::Bool(true) => Some(1.0),
            CellValue::Bool(false) => Some(0.0),
            CellValue::Formula(f) => f.result.as_number(),
            _ => None,
        }
    }

    /// Try to read the value as a string slice. Shared, inline and rich
    /// strings all qualify; formulas defer to their cached result.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Shared(s) | CellValue::Text(s) => Some(s.as_str()),
            CellValue::Rich { text, .. } => Some(text.as_str()),
            CellValue::Formula(f) => f.result.as_str(),
            _ => None,
        }
    }

    /// Try to read the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Formula(f) => f.result.as_bool(),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error(e) => write!(f, "{}", e),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Shared(s) | CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Rich { text, .. } => write!(f, "{}", text),
            CellValue::Formula(cell) => write!(f, "{}", cell.result),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Excel error values, carrying the one-byte code used on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #NULL! - incorrect range operator
    Null,
    /// #DIV/0! - division by zero
    Div0,
    /// #VALUE! - wrong type of argument or operand
    Value,
    /// #REF! - invalid cell reference
    Ref,
    /// #NAME? - unrecognized formula name
    Name,
    /// #NUM! - invalid numeric value
    Num,
    /// #N/A - value not available
    Na,
    /// A code byte with no assigned meaning; preserved verbatim.
    Unknown(u8),
}

impl CellError {
    /// Map a BIFF error-code byte to an error value.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => CellError::Null,
            0x07 => CellError::Div0,
            0x0F => CellError::Value,
            0x17 => CellError::Ref,
            0x1D => CellError::Name,
            0x24 => CellError::Num,
            0x2A => CellError::Na,
            other => CellError::Unknown(other),
        }
    }

    /// The BIFF error-code byte.
    pub fn code(&self) -> u8 {
        match self {
            CellError::Null => 0x00,
            CellError::Div0 => 0x07,
            CellError::Value => 0x0F,
            CellError::Ref => 0x17,
            CellError::Name => 0x1D,
            CellError::Num => 0x24,
            CellError::Na => 0x2A,
            CellError::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::Null => write!(f, "#NULL!"),
            CellError::Div0 => write!(f, "#DIV/0!"),
            CellError::Value => write!(f, "#VALUE!"),
            CellError::Ref => write!(f, "#REF!"),
            CellError::Name => write!(f, "#NAME?"),
            CellError::Num => write!(f, "#NUM!"),
            CellError::Na => write!(f, "#N/A"),
            CellError::Unknown(code) => write!(f, "#ERR({:#04x})", code),
        }
    }
}

/// Interned string.
///
/// Shared-string-table entries are referenced by many cells; an `Arc<str>`
/// lets every referencing cell share one allocation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string.
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}

impl PartialEq<str> for SharedString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for SharedString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
