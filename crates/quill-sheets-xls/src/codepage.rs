//! Code-page resolution for 8-bit string payloads.
//!
//! BIFF5 byte strings and BIFF8 "compressed" string characters are stored
//! in the workbook's ANSI code page, announced by the CODEPAGE record.
//! Strings decoded before that record use Windows-1252.

use encoding_rs::{
    Encoding, BIG5, EUC_KR, GBK, MACINTOSH, SHIFT_JIS, UTF_8, WINDOWS_1250, WINDOWS_1251,
    WINDOWS_1252, WINDOWS_1253, WINDOWS_1254, WINDOWS_1255, WINDOWS_1256, WINDOWS_1257,
    WINDOWS_1258, WINDOWS_874,
};

use crate::error::{XlsError, XlsResult};

/// Decodes 8-bit byte runs using the workbook's code page.
#[derive(Clone, Copy)]
pub struct Encoder {
    code_page: u16,
    encoding: &'static Encoding,
}

impl Encoder {
    /// Resolve a Windows code-page identifier.
    ///
    /// Fails with [`XlsError::UnknownCodePage`] for identifiers with no
    /// known encoding; string decoding must not silently fall back once a
    /// CODEPAGE record has named a specific page.
    pub fn from_code_page(code_page: u16) -> XlsResult<Self> {
        let encoding = match u32::from(code_page) {
            874 => WINDOWS_874,
            932 => SHIFT_JIS,
            936 => GBK,
            949 => EUC_KR,
            950 => BIG5,
            // 1200 marks UTF-16 workbooks (BIFF8); their 8-bit payloads
            // are the low halves of UTF-16 code units, i.e. Latin-1.
            1200 => WINDOWS_1252,
            1250 => WINDOWS_1250,
            1251 => WINDOWS_1251,
            1252 => WINDOWS_1252,
            1253 => WINDOWS_1253,
            1254 => WINDOWS_1254,
            1255 => WINDOWS_1255,
            1256 => WINDOWS_1256,
            1257 => WINDOWS_1257,
            1258 => WINDOWS_1258,
            10000 => MACINTOSH,
            65001 => UTF_8,
            _ => return Err(XlsError::UnknownCodePage(code_page)),
        };
        Ok(Self {
            code_page,
            encoding,
        })
    }

    /// Decode a byte run.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (cow, _, _) = self.encoding.decode(bytes);
        cow.into_owned()
    }

    /// The code page this encoder was resolved from.
    pub fn code_page(&self) -> u16 {
        self.code_page
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            code_page: 1252,
            encoding: WINDOWS_1252,
        }
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("code_page", &self.code_page)
            .finish()
    }
}
