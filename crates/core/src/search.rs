// Column search: regex over displayed values, hits listed as `B1 : foo`

use regex::RegexBuilder;
use termsheet_engine::address::{AddressParseError, CellAddr};
use termsheet_engine::sheet::Sheet;

const HIT_SEPARATOR: &str = " : ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub addr: CellAddr,
    pub value: String,
}

impl SearchHit {
    pub fn label(&self) -> String {
        format!("{}{}{}", self.addr, HIT_SEPARATOR, self.value)
    }
}

/// Non-empty cells of `col` whose displayed value matches `pattern`
/// (case-insensitive), in row order.
pub fn search_column(sheet: &Sheet, col: usize, pattern: &str) -> Result<Vec<SearchHit>, regex::Error> {
    let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
    Ok(sheet
        .column_cells(col)
        .into_iter()
        .map(|(addr, _)| SearchHit { addr, value: sheet.display_text(addr) })
        .filter(|hit| re.is_match(&hit.value))
        .collect())
}

/// Address from a picked hit: either a full `B3 : boo` label or a bare address.
pub fn parse_pick(input: &str) -> Result<CellAddr, AddressParseError> {
    let address = input.split(HIT_SEPARATOR).next().unwrap_or(input);
    CellAddr::parse(address).map_err(|_| AddressParseError { input: input.trim().to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(label: &str) -> CellAddr {
        CellAddr::parse(label).unwrap()
    }

    fn sheet() -> Sheet {
        let mut sheet = Sheet::new("s");
        sheet.set_value(a("B1"), "foo");
        sheet.set_value(a("B2"), "bar");
        sheet.set_value(a("B3"), "BOO");
        sheet.set_formula(a("B4"), "CONCAT(\"zo\", \"o\")");
        sheet.set_value(a("A1"), "food");
        sheet
    }

    #[test]
    fn test_matches_in_row_order() {
        let hits = search_column(&sheet(), 2, "oo").unwrap();
        let labels: Vec<String> = hits.iter().map(SearchHit::label).collect();
        assert_eq!(labels, vec!["B1 : foo", "B3 : BOO", "B4 : zoo"]);
    }

    #[test]
    fn test_anchored_pattern_and_no_hits() {
        assert_eq!(search_column(&sheet(), 2, "^b").unwrap().len(), 2);
        assert!(search_column(&sheet(), 2, "xyz").unwrap().is_empty());
        assert!(search_column(&sheet(), 2, "(").is_err());
    }

    #[test]
    fn test_parse_pick() {
        assert_eq!(parse_pick("B3 : boo").unwrap(), a("B3"));
        assert_eq!(parse_pick("c12").unwrap(), a("C12"));
        assert_eq!(parse_pick("nonsense : x").unwrap_err().to_string(), "nonsense : x is not a valid cell address");
    }
}
