// Insert-mode line editor: editable text, cursor, history, submit/cancel

use crate::keys::{Key, NamedKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    Editing,
    Submit(String),
    Cancel,
}

/// A single-line editor. History is ordered oldest first; `<up>` walks
/// towards older entries, `<down>` back towards the draft.
#[derive(Debug, Clone)]
pub struct LineEditor {
    label: String,
    text: Vec<char>,
    cursor: usize,
    history: Vec<String>,
    history_pos: Option<usize>,
    /// Text typed before history navigation started
    draft: String,
}

impl LineEditor {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            text: Vec::new(),
            cursor: 0,
            history: Vec::new(),
            history_pos: None,
            draft: String::new(),
        }
    }

    /// Prefill the editable text, cursor at the end.
    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self.draft = text.to_string();
        self
    }

    /// Attach a history list. `preselect` recalls that entry into the text
    /// right away.
    pub fn with_history(mut self, history: Vec<String>, preselect: Option<usize>) -> Self {
        self.history = history;
        if let Some(i) = preselect.filter(|i| *i < self.history.len()) {
            self.history_pos = Some(i);
            let entry = self.history[i].clone();
            self.set_text(&entry);
        }
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn history_pos(&self) -> Option<usize> {
        self.history_pos
    }

    pub fn handle_key(&mut self, key: Key) -> PromptEvent {
        match key {
            Key::Named(NamedKey::Enter) => return PromptEvent::Submit(self.text()),
            Key::Named(NamedKey::Esc) | Key::Ctrl('c') => return PromptEvent::Cancel,
            Key::Char(c) => {
                self.text.insert(self.cursor, c);
                self.cursor += 1;
            }
            Key::Named(NamedKey::Backspace) | Key::Ctrl('h') => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.text.remove(self.cursor);
                }
            }
            Key::Named(NamedKey::Delete) | Key::Ctrl('d') => {
                if self.cursor < self.text.len() {
                    self.text.remove(self.cursor);
                }
            }
            Key::Named(NamedKey::Left) | Key::Ctrl('b') => self.cursor = self.cursor.saturating_sub(1),
            Key::Named(NamedKey::Right) | Key::Ctrl('f') => self.cursor = (self.cursor + 1).min(self.text.len()),
            Key::Named(NamedKey::Home) | Key::Ctrl('a') => self.cursor = 0,
            Key::Named(NamedKey::End) | Key::Ctrl('e') => self.cursor = self.text.len(),
            Key::Ctrl('u') => {
                self.text.drain(..self.cursor);
                self.cursor = 0;
            }
            Key::Named(NamedKey::Up) => self.history_older(),
            Key::Named(NamedKey::Down) => self.history_newer(),
            _ => {}
        }
        PromptEvent::Editing
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.cursor = self.text.len();
    }

    fn history_older(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => {
                self.draft = self.text();
                self.history.len() - 1
            }
            Some(pos) => pos.saturating_sub(1),
        };
        self.history_pos = Some(pos);
        let entry = self.history[pos].clone();
        self.set_text(&entry);
    }

    fn history_newer(&mut self) {
        let Some(pos) = self.history_pos else {
            return;
        };
        if pos + 1 < self.history.len() {
            self.history_pos = Some(pos + 1);
            let entry = self.history[pos + 1].clone();
            self.set_text(&entry);
        } else {
            self.history_pos = None;
            let draft = self.draft.clone();
            self.set_text(&draft);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(editor: &mut LineEditor, s: &str) {
        for c in s.chars() {
            editor.handle_key(Key::Char(c));
        }
    }

    fn history() -> Vec<String> {
        vec!["one".to_string(), "two".to_string(), "three".to_string()]
    }

    #[test]
    fn test_edit_and_submit() {
        let mut editor = LineEditor::new("goto> ").with_text("A1");
        assert_eq!(editor.cursor(), 2);
        editor.handle_key(Key::Named(NamedKey::Backspace));
        type_str(&mut editor, "5");
        editor.handle_key(Key::Named(NamedKey::Home));
        editor.handle_key(Key::Named(NamedKey::Delete));
        type_str(&mut editor, "C");
        assert_eq!(editor.handle_key(Key::Named(NamedKey::Enter)), PromptEvent::Submit("C5".to_string()));
    }

    #[test]
    fn test_cancel_keys() {
        let mut editor = LineEditor::new("x> ");
        type_str(&mut editor, "abc");
        assert_eq!(editor.handle_key(Key::Named(NamedKey::Esc)), PromptEvent::Cancel);
        assert_eq!(editor.handle_key(Key::Ctrl('c')), PromptEvent::Cancel);
    }

    #[test]
    fn test_history_walk_restores_draft() {
        let mut editor = LineEditor::new("> ").with_history(history(), None);
        type_str(&mut editor, "dra");
        editor.handle_key(Key::Named(NamedKey::Up));
        assert_eq!(editor.text(), "three");
        editor.handle_key(Key::Named(NamedKey::Up));
        editor.handle_key(Key::Named(NamedKey::Up));
        editor.handle_key(Key::Named(NamedKey::Up));
        assert_eq!(editor.text(), "one");
        editor.handle_key(Key::Named(NamedKey::Down));
        editor.handle_key(Key::Named(NamedKey::Down));
        editor.handle_key(Key::Named(NamedKey::Down));
        assert_eq!(editor.text(), "dra");
        assert_eq!(editor.history_pos(), None);
    }

    #[test]
    fn test_preselect() {
        let mut editor = LineEditor::new("> ").with_history(history(), Some(0));
        assert_eq!(editor.text(), "one");
        editor.handle_key(Key::Named(NamedKey::Down));
        assert_eq!(editor.text(), "two");
        assert_eq!(editor.handle_key(Key::Named(NamedKey::Enter)), PromptEvent::Submit("two".to_string()));
    }

    #[test]
    fn test_clear_to_start() {
        let mut editor = LineEditor::new("> ").with_text("untitled.xlsx");
        editor.handle_key(Key::Ctrl('u'));
        assert_eq!(editor.text(), "");
        type_str(&mut editor, "ü→x");
        editor.handle_key(Key::Named(NamedKey::Left));
        editor.handle_key(Key::Named(NamedKey::Backspace));
        assert_eq!(editor.text(), "üx");
    }
}
