//! BIFF5 streams: byte strings everywhere, no SST.

mod common;

use common::*;
use quill_sheets_core::CellValue;
use quill_sheets_xls::{BiffVersion, XlsReader};

/// BIFF5 FONT: same fixed fields, name without a flags byte.
fn biff5_font(name: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&200u16.to_le_bytes());
    body.extend_from_slice(&[0u8; 8]);
    body.extend_from_slice(&[0, 0, 0, 0]);
    body.push(name.len() as u8);
    body.extend_from_slice(name.as_bytes());
    record(RECORD_FONT, &body)
}

/// BIFF5 LABEL: byte string with a 2-byte length, code-page encoded.
fn biff5_label(row: u16, col: u16, xf: u16, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&row.to_le_bytes());
    body.extend_from_slice(&col.to_le_bytes());
    body.extend_from_slice(&xf.to_le_bytes());
    body.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    body.extend_from_slice(bytes);
    record(RECORD_LABEL, &body)
}

#[test]
fn detects_biff5_and_reads_cells() {
    let globals = vec![biff5_font("Geneva"), xf(0, 0)];
    let sheet = Sheet::new("Plan1")
        .push(row(0, 0, 2))
        .push(rk(0, 0, 0, rk_int(12)))
        .push(number(0, 1, 0, 0.25));

    let stream = workbook_stream_versioned(BIFF5_VERSION, &globals, &[sheet]);
    let mut wb = XlsReader::read_workbook_stream(stream).unwrap();

    assert_eq!(wb.version(), BiffVersion::Biff5);
    assert_eq!(wb.biff_version_word(), 0x0500);
    assert_eq!(wb.worksheet(0).unwrap().name(), "Plan1");
    assert_eq!(wb.fonts()[0].name, "Geneva");

    let row = wb.row(0, 0).unwrap();
    assert_eq!(row.cell(0), Some(&CellValue::Int(12)));
    assert_eq!(row.cell(1), Some(&CellValue::Number(0.25)));
}

#[test]
fn byte_strings_decode_through_the_code_page() {
    // Windows-1252: 0xE9 is 'é'.
    let globals = vec![codepage(1252), biff5_font("Geneva"), xf(0, 0)];
    let sheet = Sheet::new("Plan1")
        .push(row(0, 0, 1))
        .push(biff5_label(0, 0, 0, &[b'c', b'a', b'f', 0xE9]));

    let stream = workbook_stream_versioned(BIFF5_VERSION, &globals, &[sheet]);
    let mut wb = XlsReader::read_workbook_stream(stream).unwrap();
    assert_eq!(wb.row(0, 0).unwrap().cell(0).unwrap().as_str(), Some("café"));
}

#[test]
fn cyrillic_code_page_applies_to_labels() {
    let globals = vec![codepage(1251), biff5_font("Arial Cyr"), xf(0, 0)];
    let sheet = Sheet::new("List1")
        .push(row(2, 0, 1))
        .push(biff5_label(2, 0, 0, &[0xC4, 0xC0])); // "ДА" in Windows-1251

    let stream = workbook_stream_versioned(BIFF5_VERSION, &globals, &[sheet]);
    let mut wb = XlsReader::read_workbook_stream(stream).unwrap();
    assert_eq!(wb.row(0, 2).unwrap().cell(0).unwrap().as_str(), Some("ДА"));
}

#[test]
fn biff5_formula_string_pairing() {
    // The STRING record is a 2-byte-length byte string in BIFF5.
    let mut string_body = Vec::new();
    string_body.extend_from_slice(&3u16.to_le_bytes());
    string_body.extend_from_slice(b"oui");

    let globals = vec![biff5_font("Geneva"), xf(0, 0)];
    let sheet = Sheet::new("Plan1")
        .push(row(0, 0, 1))
        .push(formula_typed(0, 0, 0, 0, 0, &[]))
        .push(record(RECORD_STRING, &string_body));

    let stream = workbook_stream_versioned(BIFF5_VERSION, &globals, &[sheet]);
    let mut wb = XlsReader::read_workbook_stream(stream).unwrap();

    match wb.row(0, 0).unwrap().cell(0).unwrap() {
        CellValue::Formula(f) => assert_eq!(f.result.as_str(), Some("oui")),
        other => panic!("expected a formula, got {other:?}"),
    }
}
