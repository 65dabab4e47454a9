// CSV import/export: ';' delimiter, quoting disabled, one sheet per file

use std::io::Read;
use std::path::Path;

use termsheet_engine::address::CellAddr;
use termsheet_engine::cell::CellValue;
use termsheet_engine::sheet::Sheet;
use termsheet_engine::workbook::Workbook;

use crate::FALLBACK_SHEET_NAME;

pub const DELIMITER: u8 = b';';

pub fn import(path: &Path) -> Result<Workbook, String> {
    let content = read_file_as_utf8(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_SHEET_NAME);
    let sheet = import_from_string(&content, name)?;
    Ok(Workbook::from_sheets(vec![sheet], FALLBACK_SHEET_NAME))
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(content: &str, sheet_name: &str) -> Result<Sheet, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(content.as_bytes());

    let mut sheet = Sheet::new(sheet_name);

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        for (col_idx, field) in record.iter().enumerate() {
            if !field.is_empty() {
                let addr = CellAddr { row: row_idx + 1, col: col_idx + 1 };
                sheet.set_cell(addr, CellValue::from_input(field));
            }
        }
    }

    Ok(sheet)
}

/// Write one sheet. Formula cells are written as their displayed result.
pub fn export(sheet: &Sheet, path: &Path) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(csv::QuoteStyle::Never)
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    let (max_row, max_col) = sheet.extent();
    for row in 1..=max_row {
        let record: Vec<String> = (1..=max_col)
            .map(|col| {
                let addr = CellAddr { row, col };
                match sheet.get_cell(addr) {
                    CellValue::Formula { .. } => sheet.display_text(addr),
                    value => value.literal_text(),
                }
            })
            .collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    log::debug!("csv export: {} rows x {} cols", max_row, max_col);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn a(label: &str) -> CellAddr {
        CellAddr::parse(label).unwrap()
    }

    #[test]
    fn test_semicolon_csv_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(&path, "Name;Age;City\nAlice;30;Paris\nBob;;London\n").unwrap();

        let wb = import(&path).unwrap();
        assert_eq!(wb.sheet_names(), vec!["people"]);
        let sheet = wb.active_sheet();
        assert_eq!(sheet.get_cell(a("A1")).edit_text(), "Name");
        assert_eq!(sheet.get_cell(a("B2")), &CellValue::Number(30.0));
        assert!(sheet.get_cell(a("B3")).is_empty());
        assert_eq!(sheet.get_cell(a("C3")).edit_text(), "London");
    }

    #[test]
    fn test_quotes_are_plain_characters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("q.csv");
        fs::write(&path, "\"a\";b,c\n").unwrap();

        let wb = import(&path).unwrap();
        let sheet = wb.active_sheet();
        assert_eq!(sheet.get_cell(a("A1")).edit_text(), "\"a\"");
        assert_eq!(sheet.get_cell(a("B1")).edit_text(), "b,c");
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "café" in Windows-1252
        fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        let content = read_file_as_utf8(&path).unwrap();
        assert_eq!(content, "café");
    }

    #[test]
    fn test_export_writes_display_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sheet = Sheet::new("s");
        sheet.set_value(a("A1"), "2");
        sheet.set_value(a("B1"), "3");
        sheet.set_formula(a("C1"), "A1+B1");
        sheet.set_value(a("A2"), "tail");

        export(&sheet, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["2;3;5", "tail;;"]);
    }
}
