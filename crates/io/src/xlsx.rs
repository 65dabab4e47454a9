// Excel file import (via calamine) and export (xlsx via rust_xlsxwriter)
//
// Every sheet is read and written. Formulas survive the round trip as
// formulas; cached results are not exported.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use termsheet_engine::address::CellAddr;
use termsheet_engine::cell::CellValue;
use termsheet_engine::sheet::Sheet;
use termsheet_engine::workbook::Workbook;

use crate::FALLBACK_SHEET_NAME;

pub fn import(path: &Path) -> Result<Workbook, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let mut sheet = Sheet::new(sheet_name);

        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

        // Range start offset (data may not begin at A1)
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        for (row_idx, row) in range.rows().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let addr = CellAddr {
                    row: start_row as usize + row_idx + 1,
                    col: start_col as usize + col_idx + 1,
                };
                let value = match cell {
                    Data::Empty => continue,
                    Data::String(s) if s.is_empty() => continue,
                    Data::String(s) => CellValue::Text(s.clone()),
                    Data::Float(n) => CellValue::Number(*n),
                    Data::Int(n) => CellValue::Number(*n as f64),
                    Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
                    Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
                    // Excel serial date number
                    Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
                    Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
                };
                sheet.set_cell(addr, value);
            }
        }

        // Formulas override the cached values read above
        if let Ok(formula_range) = workbook.worksheet_formula(sheet_name) {
            // Formula range may start at a different offset than data range
            let (start_row, start_col) = formula_range.start().unwrap_or((0, 0));

            for (row_idx, row) in formula_range.rows().enumerate() {
                for (col_idx, formula) in row.iter().enumerate() {
                    if formula.is_empty() {
                        continue;
                    }
                    let addr = CellAddr {
                        row: start_row as usize + row_idx + 1,
                        col: start_col as usize + col_idx + 1,
                    };
                    sheet.set_formula(addr, formula);
                }
            }
        }

        sheets.push(sheet);
    }

    Ok(Workbook::from_sheets(sheets, FALLBACK_SHEET_NAME))
}

pub fn export(workbook: &Workbook, active_index: usize, path: &Path) -> Result<(), String> {
    let mut xlsx_workbook = XlsxWorkbook::new();

    for sheet in workbook.sheets() {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet.name, e))?;

        for (addr, value) in sheet.cells_iter() {
            let row = u32::try_from(addr.row - 1)
                .map_err(|_| format!("Row {} is out of range for xlsx", addr.row))?;
            let col = u16::try_from(addr.col - 1)
                .map_err(|_| format!("Column {} is out of range for xlsx", addr.col))?;

            let written = match value {
                CellValue::Empty => continue,
                CellValue::Text(s) => worksheet.write_string(row, col, s).map(|_| ()),
                CellValue::Number(n) => worksheet.write_number(row, col, *n).map(|_| ()),
                CellValue::Formula { source, .. } => {
                    worksheet.write_formula(row, col, format!("={}", source).as_str()).map(|_| ())
                }
            };
            written.map_err(|e| format!("Failed to write cell {}: {}", addr, e))?;
        }
    }

    if let Ok(ws) = xlsx_workbook.worksheet_from_index(active_index) {
        let _ = ws.set_active(true);
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    Ok(())
}
