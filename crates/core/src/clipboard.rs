use std::fmt;

use termsheet_engine::address::CellAddr;
use termsheet_engine::cell::CellValue;
use termsheet_engine::sheet::{GridError, Sheet};

/// What a yank or cut captured. Values are owned copies, so later grid edits
/// never change a held payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Cell(CellValue),
    Row(Vec<CellValue>),
    Column(Vec<CellValue>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Cell(_) => "cell",
            Payload::Row(_) => "row",
            Payload::Column(_) => "column",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteDirection {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteError {
    Empty,
    Grid(GridError),
}

impl fmt::Display for PasteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasteError::Empty => write!(f, "nothing to paste"),
            PasteError::Grid(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PasteError {}

impl From<GridError> for PasteError {
    fn from(e: GridError) -> Self {
        PasteError::Grid(e)
    }
}

/// Holds at most one payload; every yank or cut replaces it.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    payload: Option<Payload>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn yank(&mut self, payload: Payload) {
        self.payload = Some(payload);
    }

    pub fn yank_cell(&mut self, sheet: &Sheet, addr: CellAddr) {
        self.yank(Payload::Cell(sheet.get_cell(addr).clone()));
    }

    pub fn yank_row(&mut self, sheet: &Sheet, row: usize) {
        self.yank(Payload::Row(sheet.row_values(row)));
    }

    pub fn yank_column(&mut self, sheet: &Sheet, col: usize) {
        self.yank(Payload::Column(sheet.column_snapshot(col)));
    }

    /// Yank, then empty the source without shifting anything.
    pub fn cut_cell(&mut self, sheet: &mut Sheet, addr: CellAddr) {
        self.yank_cell(sheet, addr);
        sheet.clear_cell(addr);
    }

    pub fn cut_row(&mut self, sheet: &mut Sheet, row: usize) {
        self.yank_row(sheet, row);
        sheet.clear_row(row);
    }

    pub fn cut_column(&mut self, sheet: &mut Sheet, col: usize) {
        self.yank_column(sheet, col);
        sheet.clear_column(col);
    }

    /// Paste relative to `at` and return where the cursor should go.
    ///
    /// Rows and columns are inserted at the cursor (`Before`) or just past it
    /// (`After`) and the cursor moves onto the inserted line. A cell payload
    /// overwrites the cell at `at` regardless of direction.
    pub fn paste(&self, sheet: &mut Sheet, at: CellAddr, direction: PasteDirection) -> Result<CellAddr, PasteError> {
        let payload = self.payload.as_ref().ok_or(PasteError::Empty)?;
        let offset = match direction {
            PasteDirection::Before => 0,
            PasteDirection::After => 1,
        };
        match payload {
            Payload::Cell(value) => {
                sheet.set_cell(at, value.clone());
                Ok(at)
            }
            Payload::Row(values) => {
                let row = at.row.checked_add(offset).ok_or(GridError::OutOfRange)?;
                sheet.insert_row_with(row, values)?;
                Ok(CellAddr { row, col: at.col })
            }
            Payload::Column(values) => {
                let col = at.col.checked_add(offset).ok_or(GridError::OutOfRange)?;
                sheet.insert_column_at(col, values)?;
                Ok(CellAddr { row: at.row, col })
            }
        }
    }
}
