use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;

use super::address::{CellAddr, MAX_COL, MAX_ROW};
use super::cell::CellValue;
use super::formula::eval::{self, Resolver, Value};
use super::formula::parser;

/// Formula chains deeper than this are reported like a cycle instead of
/// exhausting the stack.
const MAX_EVAL_DEPTH: usize = 512;

static EMPTY: CellValue = CellValue::Empty;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Row and column indices start at 1.
    ZeroIndex,
    /// The index, or a cell an insert would push along, is past the last
    /// row or column.
    OutOfRange,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::ZeroIndex => write!(f, "row and column indices start at 1"),
            GridError::OutOfRange => write!(f, "beyond the last row or column of the sheet"),
        }
    }
}

impl std::error::Error for GridError {}

/// Sparse grid of cells. Only non-empty cells are stored; anything beyond the
/// populated extent reads as empty and is created on write.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    cells: FxHashMap<(usize, usize), CellValue>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: FxHashMap::default(),
        }
    }

    // =========================================================================
    // Cells
    // =========================================================================

    pub fn get_cell(&self, addr: CellAddr) -> &CellValue {
        self.cells.get(&(addr.row, addr.col)).unwrap_or(&EMPTY)
    }

    pub fn set_cell(&mut self, addr: CellAddr, value: CellValue) {
        if value.is_empty() {
            self.cells.remove(&(addr.row, addr.col));
        } else {
            self.cells.insert((addr.row, addr.col), value);
        }
    }

    /// Store a literal, replacing any formula.
    pub fn set_value(&mut self, addr: CellAddr, value: &str) {
        self.set_cell(addr, CellValue::literal(value));
    }

    /// Store a formula (with or without leading '='), replacing any literal.
    pub fn set_formula(&mut self, addr: CellAddr, formula: &str) {
        self.set_cell(addr, CellValue::formula(formula));
    }

    pub fn clear_cell(&mut self, addr: CellAddr) {
        self.cells.remove(&(addr.row, addr.col));
    }

    pub fn cells_iter(&self) -> impl Iterator<Item = (CellAddr, &CellValue)> {
        self.cells
            .iter()
            .map(|(&(row, col), value)| (CellAddr { row, col }, value))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Last populated (row, col), or (0, 0) for an empty sheet.
    pub fn extent(&self) -> (usize, usize) {
        self.cells.keys().fold((0, 0), |(max_r, max_c), &(r, c)| (max_r.max(r), max_c.max(c)))
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// The value a user sees: the literal, or the evaluated formula result.
    pub fn display_value(&self, addr: CellAddr) -> Value {
        SheetResolver::new(self).resolve_cell(addr)
    }

    pub fn display_text(&self, addr: CellAddr) -> String {
        self.display_value(addr).to_text()
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// Dense copy of a row from column 1 to its last populated column.
    pub fn row_values(&self, row: usize) -> Vec<CellValue> {
        let last = self.cells.keys().filter(|(r, _)| *r == row).map(|(_, c)| *c).max().unwrap_or(0);
        (1..=last)
            .map(|col| self.cells.get(&(row, col)).cloned().unwrap_or_default())
            .collect()
    }

    /// Insert a blank row at `index`, shifting that row and everything below down.
    pub fn insert_row_at(&mut self, index: usize) -> Result<(), GridError> {
        self.insert_row_with(index, &[])
    }

    /// Insert a row holding `values` (column 1 onwards) at `index`.
    pub fn insert_row_with(&mut self, index: usize, values: &[CellValue]) -> Result<(), GridError> {
        if index == 0 {
            return Err(GridError::ZeroIndex);
        }
        if index > MAX_ROW || values.len() > MAX_COL || self.cells.keys().any(|(r, _)| *r == MAX_ROW) {
            return Err(GridError::OutOfRange);
        }
        self.shift_rows(index, |r| r + 1);
        for (i, value) in values.iter().enumerate() {
            self.set_cell(CellAddr { row: index, col: i + 1 }, value.clone());
        }
        Ok(())
    }

    /// Remove row `index`, shifting everything below up. Returns the removed row.
    pub fn delete_row_at(&mut self, index: usize) -> Result<Vec<CellValue>, GridError> {
        if index == 0 {
            return Err(GridError::ZeroIndex);
        }
        if index > MAX_ROW {
            return Err(GridError::OutOfRange);
        }
        let removed = self.row_values(index);
        self.cells.retain(|(r, _), _| *r != index);
        self.shift_rows(index + 1, |r| r - 1);
        Ok(removed)
    }

    /// Overwrite a row in place with `values` (column 1 onwards). Cells past
    /// the end of `values` are cleared.
    pub fn write_row(&mut self, index: usize, values: &[CellValue]) -> Result<(), GridError> {
        if index == 0 {
            return Err(GridError::ZeroIndex);
        }
        self.clear_row(index);
        for (i, value) in values.iter().enumerate() {
            self.set_cell(CellAddr { row: index, col: i + 1 }, value.clone());
        }
        Ok(())
    }

    /// Empty every cell of a row without shifting.
    pub fn clear_row(&mut self, index: usize) {
        self.cells.retain(|(r, _), _| *r != index);
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Dense copy of a column from row 1 to its last populated row.
    pub fn column_snapshot(&self, col: usize) -> Vec<CellValue> {
        let last = self.cells.keys().filter(|(_, c)| *c == col).map(|(r, _)| *r).max().unwrap_or(0);
        (1..=last)
            .map(|row| self.cells.get(&(row, col)).cloned().unwrap_or_default())
            .collect()
    }

    /// Insert a column holding `values` (row 1 onwards) at `index`, shifting
    /// that column and everything to its right.
    pub fn insert_column_at(&mut self, index: usize, values: &[CellValue]) -> Result<(), GridError> {
        if index == 0 {
            return Err(GridError::ZeroIndex);
        }
        if index > MAX_COL || values.len() > MAX_ROW || self.cells.keys().any(|(_, c)| *c == MAX_COL) {
            return Err(GridError::OutOfRange);
        }
        self.shift_cols(index, |c| c + 1);
        for (i, value) in values.iter().enumerate() {
            self.set_cell(CellAddr { row: i + 1, col: index }, value.clone());
        }
        Ok(())
    }

    /// Remove column `index`, shifting everything to its right left. Returns the removed column.
    pub fn delete_column_at(&mut self, index: usize) -> Result<Vec<CellValue>, GridError> {
        if index == 0 {
            return Err(GridError::ZeroIndex);
        }
        if index > MAX_COL {
            return Err(GridError::OutOfRange);
        }
        let removed = self.column_snapshot(index);
        self.cells.retain(|(_, c), _| *c != index);
        self.shift_cols(index + 1, |c| c - 1);
        Ok(removed)
    }

    /// Empty every cell of a column without shifting.
    pub fn clear_column(&mut self, index: usize) {
        self.cells.retain(|(_, c), _| *c != index);
    }

    /// Non-empty cells of a column in row order.
    pub fn column_cells(&self, col: usize) -> Vec<(CellAddr, &CellValue)> {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .filter(|((_, c), _)| *c == col)
            .map(|(&(row, col), value)| (CellAddr { row, col }, value))
            .collect();
        cells.sort_by_key(|(addr, _)| addr.row);
        cells
    }

    /// Editable text of every non-empty cell in the column, duplicates kept.
    pub fn column_values(&self, col: usize) -> Vec<String> {
        self.column_cells(col)
            .into_iter()
            .map(|(_, value)| value.edit_text())
            .collect()
    }

    /// Like `column_values`, keeping only the first occurrence of each value.
    pub fn unique_column_values(&self, col: usize) -> Vec<String> {
        let mut seen = rustc_hash::FxHashSet::default();
        self.column_values(col)
            .into_iter()
            .filter(|v| seen.insert(v.clone()))
            .collect()
    }

    // =========================================================================
    // Shifting
    // =========================================================================

    fn shift_rows(&mut self, from_row: usize, shift: impl Fn(usize) -> usize) {
        // Collect all cells that need to be shifted
        let cells_to_shift: Vec<_> = self
            .cells
            .iter()
            .filter(|((r, _), _)| *r >= from_row)
            .map(|(&(r, c), value)| ((r, c), value.clone()))
            .collect();

        for ((r, c), _) in &cells_to_shift {
            self.cells.remove(&(*r, *c));
        }

        for ((r, c), value) in cells_to_shift {
            self.cells.insert((shift(r), c), value);
        }
    }

    fn shift_cols(&mut self, from_col: usize, shift: impl Fn(usize) -> usize) {
        let cells_to_shift: Vec<_> = self
            .cells
            .iter()
            .filter(|((_, c), _)| *c >= from_col)
            .map(|(&(r, c), value)| ((r, c), value.clone()))
            .collect();

        for ((r, c), _) in &cells_to_shift {
            self.cells.remove(&(*r, *c));
        }

        for ((r, c), value) in cells_to_shift {
            self.cells.insert((r, shift(c)), value);
        }
    }
}

/// Resolves references against one sheet, tracking the formula cells
/// currently being evaluated so a cycle yields `#CIRC!` instead of recursing.
pub struct SheetResolver<'a> {
    sheet: &'a Sheet,
    visiting: RefCell<Vec<CellAddr>>,
}

impl<'a> SheetResolver<'a> {
    pub fn new(sheet: &'a Sheet) -> Self {
        Self {
            sheet,
            visiting: RefCell::new(Vec::new()),
        }
    }
}

impl Resolver for SheetResolver<'_> {
    fn range_values(&self, top_left: CellAddr, bottom_right: CellAddr) -> Vec<Value> {
        let (min_row, max_row) = (top_left.row.min(bottom_right.row), top_left.row.max(bottom_right.row));
        let (min_col, max_col) = (top_left.col.min(bottom_right.col), top_left.col.max(bottom_right.col));

        // Only stored cells; the empty area contributes nothing
        let mut addrs: Vec<CellAddr> = self
            .sheet
            .cells
            .keys()
            .filter(|(r, c)| (min_row..=max_row).contains(r) && (min_col..=max_col).contains(c))
            .map(|&(row, col)| CellAddr { row, col })
            .collect();
        addrs.sort();

        addrs
            .into_iter()
            .map(|addr| self.resolve_cell(addr))
            .filter(|v| *v != Value::Empty)
            .collect()
    }

    fn resolve_cell(&self, addr: CellAddr) -> Value {
        match self.sheet.get_cell(addr) {
            CellValue::Empty => Value::Empty,
            CellValue::Text(s) => Value::Text(s.clone()),
            CellValue::Number(n) => Value::Number(*n),
            CellValue::Formula { ast: None, source } => match parser::parse(source) {
                Err(e) => Value::Error(e),
                Ok(_) => Value::Error("#VALUE!".to_string()),
            },
            CellValue::Formula { ast: Some(ast), .. } => {
                {
                    let visiting = self.visiting.borrow();
                    if visiting.contains(&addr) || visiting.len() >= MAX_EVAL_DEPTH {
                        return Value::Error("#CIRC!".to_string());
                    }
                }
                self.visiting.borrow_mut().push(addr);
                let result = eval::evaluate(ast, self);
                self.visiting.borrow_mut().pop();
                result
            }
        }
    }
}
