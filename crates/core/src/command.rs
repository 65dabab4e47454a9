// Normal-mode commands

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandId {
    Quit,
    EditCell,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    InsertRowBelow,
    InsertRowAbove,
    DeleteRow,
    DeleteColumn,
    YankCell,
    YankRow,
    YankColumn,
    CutCell,
    CutRow,
    CutColumn,
    PasteAfter,
    PasteBefore,
    NewSheet,
    PickSheet,
    RenameSheet,
    WriteWorkbook,
    Goto,
    SearchColumn,
    ColumnHeader,
    RowHeader,
    SubRepl,
    Help,
}

impl CommandId {
    pub const ALL: &'static [CommandId] = &[
        CommandId::Quit,
        CommandId::EditCell,
        CommandId::MoveUp,
        CommandId::MoveDown,
        CommandId::MoveLeft,
        CommandId::MoveRight,
        CommandId::InsertRowBelow,
        CommandId::InsertRowAbove,
        CommandId::DeleteRow,
        CommandId::DeleteColumn,
        CommandId::YankCell,
        CommandId::YankRow,
        CommandId::YankColumn,
        CommandId::CutCell,
        CommandId::CutRow,
        CommandId::CutColumn,
        CommandId::PasteAfter,
        CommandId::PasteBefore,
        CommandId::NewSheet,
        CommandId::PickSheet,
        CommandId::RenameSheet,
        CommandId::WriteWorkbook,
        CommandId::Goto,
        CommandId::SearchColumn,
        CommandId::ColumnHeader,
        CommandId::RowHeader,
        CommandId::SubRepl,
        CommandId::Help,
    ];

    /// Name used in `keys.bindings`
    pub fn name(&self) -> &'static str {
        match self {
            CommandId::Quit => "quit",
            CommandId::EditCell => "edit_cell",
            CommandId::MoveUp => "move_up",
            CommandId::MoveDown => "move_down",
            CommandId::MoveLeft => "move_left",
            CommandId::MoveRight => "move_right",
            CommandId::InsertRowBelow => "insert_row_below",
            CommandId::InsertRowAbove => "insert_row_above",
            CommandId::DeleteRow => "delete_row",
            CommandId::DeleteColumn => "delete_column",
            CommandId::YankCell => "yank_cell",
            CommandId::YankRow => "yank_row",
            CommandId::YankColumn => "yank_column",
            CommandId::CutCell => "cut_cell",
            CommandId::CutRow => "cut_row",
            CommandId::CutColumn => "cut_column",
            CommandId::PasteAfter => "paste_after",
            CommandId::PasteBefore => "paste_before",
            CommandId::NewSheet => "new_sheet",
            CommandId::PickSheet => "pick_sheet",
            CommandId::RenameSheet => "rename_sheet",
            CommandId::WriteWorkbook => "write_workbook",
            CommandId::Goto => "goto",
            CommandId::SearchColumn => "search_column",
            CommandId::ColumnHeader => "column_header",
            CommandId::RowHeader => "row_header",
            CommandId::SubRepl => "sub_repl",
            CommandId::Help => "help",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            CommandId::Quit => "quit the program, no questions asked",
            CommandId::EditCell => "edit the current cell (start with = for a formula)",
            CommandId::MoveUp => "move one cell up",
            CommandId::MoveDown => "move one cell down",
            CommandId::MoveLeft => "move one cell left",
            CommandId::MoveRight => "move one cell right",
            CommandId::InsertRowBelow => "insert a blank row below and move onto it",
            CommandId::InsertRowAbove => "insert a blank row above",
            CommandId::DeleteRow => "delete the current row (kept in the clipboard)",
            CommandId::DeleteColumn => "delete the current column (kept in the clipboard)",
            CommandId::YankCell => "yank the current cell",
            CommandId::YankRow => "yank the current row",
            CommandId::YankColumn => "yank the current column",
            CommandId::CutCell => "cut the current cell",
            CommandId::CutRow => "cut the current row",
            CommandId::CutColumn => "cut the current column",
            CommandId::PasteAfter => "paste below / right of the cursor",
            CommandId::PasteBefore => "paste above / left of the cursor",
            CommandId::NewSheet => "create a new sheet",
            CommandId::PickSheet => "select a sheet by name",
            CommandId::RenameSheet => "rename the current sheet",
            CommandId::WriteWorkbook => "write the workbook to a file (.xlsx or .csv)",
            CommandId::Goto => "go to a cell address",
            CommandId::SearchColumn => "search the current column",
            CommandId::ColumnHeader => "show the column header (row 1)",
            CommandId::RowHeader => "show the row header (column A)",
            CommandId::SubRepl => "open the scripting repl (.q to leave)",
            CommandId::Help => "print this help message",
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CommandId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        CommandId::ALL
            .iter()
            .copied()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("unknown command '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_parse() {
        let mut names: Vec<&str> = CommandId::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CommandId::ALL.len());
        assert_eq!("write-workbook".parse::<CommandId>(), Ok(CommandId::WriteWorkbook));
        assert!("explode".parse::<CommandId>().is_err());
    }
}
