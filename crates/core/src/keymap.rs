// Key sequence → command table, stored as a trie so prefixes are cheap to test

use std::collections::BTreeMap;

use crate::command::CommandId;
use crate::keys::{format_sequence, parse_sequence, Key};

/// Built-in bindings, in help order. Several sequences may share a command.
const DEFAULT_BINDINGS: &[(&str, CommandId)] = &[
    ("q", CommandId::Quit),
    ("<C-c>", CommandId::Quit),
    ("i", CommandId::EditCell),
    ("<up>", CommandId::MoveUp),
    ("<down>", CommandId::MoveDown),
    ("<enter>", CommandId::MoveDown),
    ("<left>", CommandId::MoveLeft),
    ("<right>", CommandId::MoveRight),
    ("o", CommandId::InsertRowBelow),
    ("O", CommandId::InsertRowAbove),
    ("dd", CommandId::DeleteRow),
    ("dc", CommandId::DeleteColumn),
    ("y", CommandId::YankCell),
    ("yy", CommandId::YankRow),
    ("yc", CommandId::YankColumn),
    ("x", CommandId::CutCell),
    ("xx", CommandId::CutRow),
    ("xc", CommandId::CutColumn),
    ("p", CommandId::PasteAfter),
    ("P", CommandId::PasteBefore),
    ("ns", CommandId::NewSheet),
    ("ps", CommandId::PickSheet),
    ("rs", CommandId::RenameSheet),
    ("wb", CommandId::WriteWorkbook),
    ("g", CommandId::Goto),
    ("/", CommandId::SearchColumn),
    ("ch", CommandId::ColumnHeader),
    ("rh", CommandId::RowHeader),
    (":", CommandId::SubRepl),
    ("h", CommandId::Help),
    ("?", CommandId::Help),
];

/// Result of matching a (partial) key sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// No command starts with this sequence
    NoMatch,
    /// The sequence is a command and nothing longer extends it
    Exact(CommandId),
    /// Longer commands start with this sequence; `exact` is set when the
    /// sequence is itself a command too
    Prefix { exact: Option<CommandId> },
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: BTreeMap<Key, Node>,
    command: Option<CommandId>,
}

#[derive(Debug, Clone, Default)]
pub struct Keymap {
    root: Node,
    /// Insertion order, for help output
    entries: Vec<(Vec<Key>, CommandId)>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut keymap = Self::new();
        for (seq, command) in DEFAULT_BINDINGS {
            // Covered by test_every_default_parses
            if let Ok(keys) = parse_sequence(seq) {
                keymap.bind(keys, *command);
            }
        }
        keymap
    }

    /// Bind a sequence, replacing any command it was bound to.
    pub fn bind(&mut self, keys: Vec<Key>, command: CommandId) {
        if keys.is_empty() {
            return;
        }
        let mut node = &mut self.root;
        for key in &keys {
            node = node.children.entry(*key).or_default();
        }
        node.command = Some(command);

        match self.entries.iter_mut().find(|(k, _)| *k == keys) {
            Some(entry) => entry.1 = command,
            None => self.entries.push((keys, command)),
        }
    }

    /// Add bindings from settings (`sequence → command name`). Bad entries are
    /// skipped; the returned strings describe each one.
    pub fn apply_overrides(&mut self, bindings: &BTreeMap<String, String>) -> Vec<String> {
        let mut problems = Vec::new();
        for (seq, name) in bindings {
            let keys = match parse_sequence(seq) {
                Ok(keys) => keys,
                Err(e) => {
                    problems.push(format!("binding '{}': {}", seq, e));
                    continue;
                }
            };
            match name.parse::<CommandId>() {
                Ok(command) => {
                    log::debug!("binding {} to {}", seq, command);
                    self.bind(keys, command);
                }
                Err(e) => problems.push(format!("binding '{}': {}", seq, e)),
            }
        }
        for problem in &problems {
            log::warn!("{}", problem);
        }
        problems
    }

    pub fn lookup(&self, keys: &[Key]) -> Lookup {
        let mut node = &self.root;
        for key in keys {
            match node.children.get(key) {
                Some(next) => node = next,
                None => return Lookup::NoMatch,
            }
        }
        if !node.children.is_empty() {
            return Lookup::Prefix { exact: node.command };
        }
        match node.command {
            Some(command) => Lookup::Exact(command),
            None => Lookup::NoMatch,
        }
    }

    pub fn sequences_for(&self, command: CommandId) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, c)| *c == command)
            .map(|(keys, _)| format_sequence(keys))
            .collect()
    }

    /// One line per command, all its sequences together: `h, ? - print this help message`
    pub fn help_lines(&self) -> Vec<String> {
        let mut seen: Vec<CommandId> = Vec::new();
        for (_, command) in &self.entries {
            if !seen.contains(command) {
                seen.push(*command);
            }
        }
        seen.into_iter()
            .map(|command| format!("{} - {}", self.sequences_for(command).join(", "), command.help()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::NamedKey;

    fn keys(s: &str) -> Vec<Key> {
        parse_sequence(s).unwrap()
    }

    #[test]
    fn test_every_default_parses() {
        for (seq, _) in DEFAULT_BINDINGS {
            assert!(parse_sequence(seq).is_ok(), "bad default sequence {}", seq);
        }
        assert_eq!(Keymap::with_defaults().entries.len(), DEFAULT_BINDINGS.len());
    }

    #[test]
    fn test_lookup_kinds() {
        let keymap = Keymap::with_defaults();
        assert_eq!(keymap.lookup(&keys("q")), Lookup::Exact(CommandId::Quit));
        assert_eq!(keymap.lookup(&keys("dd")), Lookup::Exact(CommandId::DeleteRow));
        assert_eq!(keymap.lookup(&keys("d")), Lookup::Prefix { exact: None });
        assert_eq!(keymap.lookup(&keys("y")), Lookup::Prefix { exact: Some(CommandId::YankCell) });
        assert_eq!(keymap.lookup(&keys("p")), Lookup::Prefix { exact: Some(CommandId::PasteAfter) });
        assert_eq!(keymap.lookup(&keys("dz")), Lookup::NoMatch);
        assert_eq!(keymap.lookup(&keys("Z")), Lookup::NoMatch);
        assert_eq!(
            keymap.lookup(&[Key::Named(NamedKey::Enter)]),
            Lookup::Exact(CommandId::MoveDown)
        );
    }

    #[test]
    fn test_help_groups_aliases() {
        let lines = Keymap::with_defaults().help_lines();
        assert_eq!(lines[0], "q, <C-c> - quit the program, no questions asked");
        assert!(lines.contains(&"<down>, <enter> - move one cell down".to_string()));
        assert!(lines.contains(&"h, ? - print this help message".to_string()));
        assert_eq!(lines.len(), CommandId::ALL.len());
    }

    #[test]
    fn test_overrides() {
        let mut keymap = Keymap::with_defaults();
        let mut bindings = BTreeMap::new();
        bindings.insert("<C-s>".to_string(), "write_workbook".to_string());
        bindings.insert("q".to_string(), "help".to_string());
        bindings.insert("zz".to_string(), "explode".to_string());
        bindings.insert("<nope>".to_string(), "quit".to_string());

        let problems = keymap.apply_overrides(&bindings);
        assert_eq!(problems.len(), 2);
        assert_eq!(keymap.lookup(&[Key::Ctrl('s')]), Lookup::Exact(CommandId::WriteWorkbook));
        assert_eq!(keymap.lookup(&keys("q")), Lookup::Exact(CommandId::Help));
        assert_eq!(keymap.lookup(&keys("z")), Lookup::NoMatch);
        assert_eq!(keymap.sequences_for(CommandId::Quit), vec!["<C-c>"]);
    }

    #[test]
    fn test_binding_a_prefix_makes_it_exact_and_prefix() {
        let mut keymap = Keymap::with_defaults();
        keymap.bind(keys("d"), CommandId::CutCell);
        assert_eq!(keymap.lookup(&keys("d")), Lookup::Prefix { exact: Some(CommandId::CutCell) });
    }
}
