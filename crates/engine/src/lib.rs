pub mod address;
pub mod cell;
pub mod formula;
pub mod sheet;
pub mod workbook;
