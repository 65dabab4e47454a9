use super::formula::eval::format_number;
use super::formula::parser::{self, Expr};

/// Content of a single cell. A cell holds a literal or a formula, never both;
/// every setter replaces the whole value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// `source` is stored without the leading '='. `ast` is None when the
    /// source does not parse; evaluation then reports the parse error.
    Formula { source: String, ast: Option<Expr> },
}

impl CellValue {
    /// Interpret editor input: a leading '=' makes a formula, numeric text
    /// becomes a number, blank input clears the cell.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if let Some(source) = trimmed.strip_prefix('=') {
            return CellValue::formula(source);
        }

        CellValue::literal(trimmed)
    }

    /// A literal value: numbers when the text parses as a finite number, text otherwise.
    pub fn literal(value: &str) -> Self {
        if value.is_empty() {
            return CellValue::Empty;
        }
        match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(value.to_string()),
        }
    }

    pub fn formula(source: &str) -> Self {
        let source = source.trim();
        let source = source.strip_prefix('=').unwrap_or(source).to_string();
        let ast = parser::parse(&source).ok();
        CellValue::Formula { source, ast }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula { .. })
    }

    pub fn formula_source(&self) -> Option<&str> {
        match self {
            CellValue::Formula { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Literal text of a non-formula cell (empty string for formulas and empty cells).
    pub fn literal_text(&self) -> String {
        match self {
            CellValue::Empty | CellValue::Formula { .. } => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// Text shown in the line editor when the cell is edited: "=formula" or the literal.
    pub fn edit_text(&self) -> String {
        match self {
            CellValue::Formula { source, .. } => format!("={}", source),
            other => other.literal_text(),
        }
    }
}
