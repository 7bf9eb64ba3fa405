//! XLS error types

use thiserror::Error;

/// Result type for XLS operations
pub type XlsResult<T> = std::result::Result<T, XlsError>;

/// Errors that abort reading.
///
/// Recoverable anomalies (malformed records, a missing STRING follow-up,
/// unsupported BIFF versions) are not errors: the reader logs a warning
/// and continues.
#[derive(Debug, Error)]
pub enum XlsError {
    /// IO error (also covers CFB container errors, which use std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The container has no workbook stream, or the stream is not BIFF
    #[error("invalid XLS file: {0}")]
    InvalidFormat(String),

    /// The workbook is encrypted (FILEPASS record present)
    #[error("encrypted workbooks are not supported")]
    Encrypted,

    /// A CODEPAGE record named a code page with no known encoding
    #[error("unknown code page: {0}")]
    UnknownCodePage(u16),

    /// The stream ended inside a record before any EOF marker was seen
    #[error("truncated record stream at offset {0}")]
    TruncatedStream(usize),

    /// A record body did not parse
    #[error("parse error: {0}")]
    Parse(String),
}
