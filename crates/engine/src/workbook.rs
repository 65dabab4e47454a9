use std::fmt;

use crate::sheet::Sheet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    EmptyName,
    Duplicate(String),
    NotFound(String),
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetError::EmptyName => write!(f, "sheet name must not be empty"),
            SheetError::Duplicate(name) => write!(f, "a sheet named {} already exists", name),
            SheetError::NotFound(_) => write!(f, "no such sheet."),
        }
    }
}

impl std::error::Error for SheetError {}

/// Case-insensitive key used for sheet name comparisons.
pub fn normalize_sheet_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// An ordered collection of sheets with one active sheet. Never empty.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active_sheet: usize,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new("Sheet1")
    }
}

impl Workbook {
    /// Create a workbook with one empty sheet
    pub fn new(default_name: &str) -> Self {
        Self {
            sheets: vec![Sheet::new(default_name)],
            active_sheet: 0,
        }
    }

    /// Build from loaded sheets. An empty list yields one sheet named `default_name`.
    pub fn from_sheets(mut sheets: Vec<Sheet>, default_name: &str) -> Self {
        if sheets.is_empty() {
            sheets.push(Sheet::new(default_name));
        }
        Self { sheets, active_sheet: 0 }
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn active_sheet_index(&self) -> usize {
        self.active_sheet
    }

    /// Set the active sheet by index
    pub fn set_active_sheet(&mut self, index: usize) -> bool {
        if index < self.sheets.len() {
            self.active_sheet = index;
            true
        } else {
            false
        }
    }

    pub fn active_sheet(&self) -> &Sheet {
        &self.sheets[self.active_sheet]
    }

    pub fn active_sheet_mut(&mut self) -> &mut Sheet {
        &mut self.sheets[self.active_sheet]
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Find a sheet index by name (case-insensitive)
    pub fn sheet_index_by_name(&self, name: &str) -> Option<usize> {
        let key = normalize_sheet_name(name);
        self.sheets.iter().position(|s| normalize_sheet_name(&s.name) == key)
    }

    /// Append an empty sheet. The new sheet does not become active.
    pub fn add_sheet(&mut self, name: &str) -> Result<usize, SheetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SheetError::EmptyName);
        }
        if self.sheet_index_by_name(name).is_some() {
            return Err(SheetError::Duplicate(name.to_string()));
        }
        self.sheets.push(Sheet::new(name));
        Ok(self.sheets.len() - 1)
    }

    /// Make the named sheet active and return its index
    pub fn select_sheet(&mut self, name: &str) -> Result<usize, SheetError> {
        let index = self
            .sheet_index_by_name(name)
            .ok_or_else(|| SheetError::NotFound(name.trim().to_string()))?;
        self.active_sheet = index;
        Ok(index)
    }

    /// Rename the sheet at `index`. Renaming a sheet to its own name in
    /// another case is allowed.
    pub fn rename_sheet(&mut self, index: usize, new_name: &str) -> Result<(), SheetError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(SheetError::EmptyName);
        }
        if let Some(existing) = self.sheet_index_by_name(new_name) {
            if existing != index {
                return Err(SheetError::Duplicate(new_name.to_string()));
            }
        }
        let sheet = self
            .sheets
            .get_mut(index)
            .ok_or_else(|| SheetError::NotFound(index.to_string()))?;
        sheet.name = new_name.to_string();
        Ok(())
    }
}
