use termsheet_engine::address::{AddressParseError, CellAddr, MAX_COL, MAX_ROW};
use termsheet_engine::sheet::Sheet;

/// Current cell. Both axes stay between 1 and the sheet limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    addr: CellAddr,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { addr: CellAddr { row: 1, col: 1 } }
    }
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn addr(&self) -> CellAddr {
        self.addr
    }

    pub fn row(&self) -> usize {
        self.addr.row
    }

    pub fn col(&self) -> usize {
        self.addr.col
    }

    pub fn set(&mut self, addr: CellAddr) {
        self.addr = addr;
    }

    /// Apply the deltas, then clamp each axis to 1..=MAX_ROW / 1..=MAX_COL.
    pub fn move_by(&mut self, drow: isize, dcol: isize) {
        self.addr.row = step(self.addr.row, drow, MAX_ROW);
        self.addr.col = step(self.addr.col, dcol, MAX_COL);
    }

    /// Jump to an address label. On a malformed label the cursor is unchanged.
    pub fn goto(&mut self, label: &str) -> Result<CellAddr, AddressParseError> {
        let addr = CellAddr::parse(label)?;
        self.addr = addr;
        Ok(addr)
    }
}

fn step(value: usize, delta: isize, max: usize) -> usize {
    let moved = if delta < 0 {
        value.saturating_sub(delta.unsigned_abs())
    } else {
        value.saturating_add(delta as usize)
    };
    moved.clamp(1, max)
}

/// One-line cell report: `B2 : text` for literals, `C1 formula result = 5`
/// for formulas.
pub fn report(sheet: &Sheet, addr: CellAddr) -> String {
    let shown = sheet.display_text(addr);
    if sheet.get_cell(addr).is_formula() {
        format!("{} formula result = {}", addr, shown)
    } else {
        format!("{} : {}", addr, shown).trim_end().to_string()
    }
}
