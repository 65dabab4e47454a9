// Cell addresses: 1-based (row, col) pairs and their A1-style labels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Last addressable row, matching the xlsx sheet limit.
pub const MAX_ROW: usize = 1_048_576;
/// Last addressable column ("XFD").
pub const MAX_COL: usize = 16_384;

/// A cell position. Both components are 1-based; (1, 1) is "A1".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddr {
    pub row: usize,
    pub col: usize,
}

impl CellAddr {
    /// Returns None if either index is zero or past `MAX_ROW` / `MAX_COL`.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row == 0 || col == 0 || row > MAX_ROW || col > MAX_COL {
            None
        } else {
            Some(Self { row, col })
        }
    }

    /// Parse an A1-style label such as "B12" (case-insensitive).
    pub fn parse(label: &str) -> Result<Self, AddressParseError> {
        let err = || AddressParseError { input: label.to_string() };
        let trimmed = label.trim();

        let split = trimmed
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (letters, digits) = trimmed.split_at(split);

        if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let col = letter_to_col(letters).ok_or_else(err)?;
        let row: usize = digits.parse().map_err(|_| err())?;
        CellAddr::new(row, col).ok_or_else(err)
    }

    pub fn label(&self) -> String {
        format!("{}{}", col_to_letter(self.col), self.row)
    }
}

impl fmt::Display for CellAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letter(self.col), self.row)
    }
}

impl FromStr for CellAddr {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellAddr::parse(s)
    }
}

/// A goto/search target that is not a letter prefix followed by a row number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParseError {
    pub input: String,
}

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a valid cell address", self.input)
    }
}

impl std::error::Error for AddressParseError {}

/// Convert a 1-based column index to letters (1 -> A, 26 -> Z, 27 -> AA).
/// Column 0 has no label and yields an empty string.
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        result.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    result
}

/// Convert column letters to a 1-based index (A -> 1, AA -> 27).
/// Returns None for empty input, non-letters, or overflow.
pub fn letter_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_col_letters() {
        assert_eq!(col_to_letter(1), "A");
        assert_eq!(col_to_letter(26), "Z");
        assert_eq!(col_to_letter(27), "AA");
        assert_eq!(col_to_letter(52), "AZ");
        assert_eq!(col_to_letter(53), "BA");
        assert_eq!(col_to_letter(702), "ZZ");
        assert_eq!(col_to_letter(703), "AAA");
    }

    #[test]
    fn test_letters_to_col() {
        for (letters, col) in [("A", 1), ("Z", 26), ("AA", 27), ("AZ", 52), ("BA", 53)] {
            assert_eq!(letter_to_col(letters), Some(col));
        }
        assert_eq!(letter_to_col("ba"), Some(53));
        assert_eq!(letter_to_col(""), None);
        assert_eq!(letter_to_col("A1"), None);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(CellAddr::parse("A1"), Ok(CellAddr { row: 1, col: 1 }));
        assert_eq!(CellAddr::parse(" c13 "), Ok(CellAddr { row: 13, col: 3 }));
        assert_eq!("AA100".parse::<CellAddr>(), Ok(CellAddr { row: 100, col: 27 }));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "A", "12", "A0", "1A", "A1B", "A-1", "hello world"] {
            let err = CellAddr::parse(bad).unwrap_err();
            assert_eq!(err.input, bad);
        }
    }

    #[test]
    fn test_parse_error_message() {
        let err = CellAddr::parse("zz").unwrap_err();
        assert_eq!(err.to_string(), "zz is not a valid cell address");
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(CellAddr::new(0, 1).is_none());
        assert!(CellAddr::new(1, 0).is_none());
        assert_eq!(CellAddr::new(2, 3).map(|a| a.label()), Some("C2".to_string()));
    }

    #[test]
    fn test_parse_rejects_beyond_sheet_limits() {
        assert_eq!(CellAddr::parse("XFD1048576"), Ok(CellAddr { row: MAX_ROW, col: MAX_COL }));
        for bad in ["A1048577", "XFE1", "A18446744073709551615", "A99999999999999999999999"] {
            let err = CellAddr::parse(bad).unwrap_err();
            assert_eq!(err.to_string(), format!("{} is not a valid cell address", bad));
        }
        assert!(CellAddr::new(MAX_ROW + 1, 1).is_none());
        assert!(CellAddr::new(1, MAX_COL + 1).is_none());
    }

    proptest! {
        #[test]
        fn prop_column_letters_roundtrip(col in 1usize..100_000) {
            prop_assert_eq!(letter_to_col(&col_to_letter(col)), Some(col));
        }

        #[test]
        fn prop_label_roundtrip(row in 1usize..=MAX_ROW, col in 1usize..=MAX_COL) {
            let addr = CellAddr { row, col };
            prop_assert_eq!(CellAddr::parse(&addr.to_string()), Ok(addr));
        }
    }
}
