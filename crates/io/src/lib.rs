// File I/O operations
//
// Two formats are supported, selected by file extension:
// .xlsx (all sheets, formulas kept) and .csv (one sheet, ';' delimited, no quoting).

pub mod csv;
pub mod xlsx;

use std::fmt;
use std::path::Path;

use termsheet_engine::workbook::Workbook;

/// Name given to a sheet when a file provides none.
pub const FALLBACK_SHEET_NAME: &str = "Sheet1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xlsx,
    Csv,
}

impl FileFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        match extension.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(FileFormat::Xlsx),
            "csv" => Ok(FileFormat::Csv),
            _ => Err(IoError::UnsupportedExtension { extension }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    UnsupportedExtension { extension: String },
    Read { path: String, message: String },
    Write { path: String, message: String },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::UnsupportedExtension { extension } if extension.is_empty() => {
                write!(f, "file has no extension")
            }
            IoError::UnsupportedExtension { extension } => {
                write!(f, "unsupported file extension: .{}", extension)
            }
            IoError::Read { path, message } => write!(f, "failed to read {}: {}", path, message),
            IoError::Write { path, message } => write!(f, "failed to write {}: {}", path, message),
        }
    }
}

impl std::error::Error for IoError {}

/// Load a workbook, dispatching on the file extension.
pub fn read(path: &Path) -> Result<Workbook, IoError> {
    let format = FileFormat::from_path(path)?;
    let result = match format {
        FileFormat::Xlsx => xlsx::import(path),
        FileFormat::Csv => csv::import(path),
    };
    let workbook = result.map_err(|message| IoError::Read {
        path: path.display().to_string(),
        message,
    })?;
    log::info!("read {} sheet(s) from {}", workbook.sheet_count(), path.display());
    Ok(workbook)
}

/// Save a workbook, dispatching on the file extension. CSV only holds the
/// sheet at `sheet_index`; xlsx holds every sheet with that one active.
pub fn write(workbook: &Workbook, sheet_index: usize, path: &Path) -> Result<(), IoError> {
    let format = FileFormat::from_path(path)?;
    let result = match format {
        FileFormat::Xlsx => xlsx::export(workbook, sheet_index, path),
        FileFormat::Csv => match workbook.sheet(sheet_index) {
            Some(sheet) => csv::export(sheet, path),
            None => Err(format!("no sheet at index {}", sheet_index)),
        },
    };
    result.map_err(|message| IoError::Write {
        path: path.display().to_string(),
        message,
    })?;
    log::info!("wrote {:?} to {}", format, path.display());
    Ok(())
}
