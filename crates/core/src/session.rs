// Editor session: one workbook, one cursor, one clipboard, and the modal
// input state that drives them.
//
// Input handling is synchronous. `handle_key` fully applies a key (including
// any mode change) before returning; `tick` resolves a pending key sequence
// once its deadline passes. Time is passed in so callers control it.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use termsheet_config::settings::Settings;
use termsheet_engine::address::{col_to_letter, CellAddr};
use termsheet_engine::cell::CellValue;
use termsheet_engine::sheet::{GridError, Sheet};
use termsheet_engine::workbook::Workbook;
use termsheet_io::{FileFormat, IoError};

use crate::clipboard::{Clipboard, PasteDirection, Payload};
use crate::command::CommandId;
use crate::cursor::{self, Cursor};
use crate::keymap::Keymap;
use crate::keys::{format_sequence, Key};
use crate::prompt::{LineEditor, PromptEvent};
use crate::search;
use crate::sequencer::{Feed, Sequencer};

/// Save target offered when the session did not start from a file
pub const UNTITLED: &str = "untitled.xlsx";

const MAX_MESSAGES: usize = 500;
const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Keys are command sequences
    Normal,
    /// A prompt is collecting a line
    Insert,
    /// Lines go to the scripting repl
    Repl,
}

/// What a submitted prompt line is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    EditCell(CellAddr),
    Goto,
    NewSheet,
    PickSheet,
    RenameSheet,
    WriteWorkbook,
    Search,
    SearchPick,
    Repl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
    /// A repl line for the caller to run against this session
    ReplLine(String),
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    UnsupportedExtension { extension: String },
    Read(IoError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::UnsupportedExtension { extension } => write!(f, "extension is: {}", extension),
            LoadError::Read(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LoadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    EmptyName,
    UnsupportedExtension { extension: String },
    Write(IoError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::EmptyName => write!(f, "no filename given"),
            SaveError::UnsupportedExtension { .. } => {
                write!(f, "please use either .xlsx or .csv file extension to specify file format")
            }
            SaveError::Write(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SaveError {}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    workbook: Workbook,
    cursor: Cursor,
    clipboard: Clipboard,
    keymap: Keymap,
    sequencer: Sequencer,
    mode: Mode,
    prompt: Option<(PromptKind, LineEditor)>,
    /// Every filename used this session, most recent last
    filenames: Vec<String>,
    search_history: Vec<String>,
    repl_history: Vec<String>,
    messages: Vec<String>,
    dirty: bool,
    show_help: bool,
    should_quit: bool,
}

impl Session {
    pub fn new(workbook: Workbook, filename: Option<&str>, settings: &Settings) -> Self {
        let mut keymap = Keymap::with_defaults();
        let problems = keymap.apply_overrides(&settings.bindings);

        let mut session = Self {
            workbook,
            cursor: Cursor::new(),
            clipboard: Clipboard::new(),
            keymap,
            sequencer: Sequencer::new(Duration::from_millis(settings.sequence_timeout_ms)),
            mode: Mode::Normal,
            prompt: None,
            filenames: vec![filename.unwrap_or(UNTITLED).to_string()],
            search_history: Vec::new(),
            repl_history: Vec::new(),
            messages: Vec::new(),
            dirty: false,
            show_help: false,
            should_quit: false,
        };
        for problem in problems {
            session.say(format!("ignored {}", problem));
        }
        session.report_current();
        session
    }

    /// Open `path`, or start an empty workbook when there is none. A path
    /// with a supported extension that does not exist yet starts empty and
    /// is created on the first write.
    pub fn load(path: Option<&Path>, settings: &Settings) -> Result<Self, LoadError> {
        let Some(path) = path else {
            log::info!("starting with an empty workbook");
            return Ok(Self::new(Workbook::new(&settings.default_sheet_name), None, settings));
        };

        FileFormat::from_path(path).map_err(|e| match e {
            IoError::UnsupportedExtension { extension } => LoadError::UnsupportedExtension { extension },
            other => LoadError::Read(other),
        })?;

        let workbook = if path.exists() {
            termsheet_io::read(path).map_err(LoadError::Read)?
        } else {
            log::info!("{} does not exist yet, starting empty", path.display());
            Workbook::new(&settings.default_sheet_name)
        };

        let name = path.display().to_string();
        Ok(Self::new(workbook, Some(&name), settings))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    pub fn cursor(&self) -> CellAddr {
        self.cursor.addr()
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn prompt(&self) -> Option<&LineEditor> {
        self.prompt.as_ref().map(|(_, editor)| editor)
    }

    pub fn prompt_kind(&self) -> Option<PromptKind> {
        self.prompt.as_ref().map(|(kind, _)| *kind)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    /// Current filename: the one most recently used
    pub fn filename(&self) -> &str {
        self.filenames.last().map(String::as_str).unwrap_or(UNTITLED)
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn help_lines(&self) -> Vec<String> {
        self.keymap.help_lines()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Keys typed so far in Normal mode, in `<name>` notation
    pub fn pending_keys(&self) -> String {
        self.sequencer.pending_display()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.sequencer.deadline()
    }

    // =========================================================================
    // Input
    // =========================================================================

    pub fn handle_key(&mut self, key: Key, now: Instant) -> Outcome {
        if self.show_help {
            // Any key dismisses help
            self.show_help = false;
            return Outcome::Continue;
        }

        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        // An expired sequence resolves before the new key is considered
        if let Some(feed) = self.sequencer.poll(&self.keymap, now) {
            let outcome = self.apply_feed(feed);
            if outcome != Outcome::Continue {
                return outcome;
            }
            if self.prompt.is_some() || self.show_help {
                return self.handle_key(key, now);
            }
        }

        let feed = self.sequencer.feed(&self.keymap, key, now);
        self.apply_feed(feed)
    }

    /// Resolve a pending sequence whose deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Outcome {
        if self.prompt.is_some() {
            return Outcome::Continue;
        }
        match self.sequencer.poll(&self.keymap, now) {
            Some(feed) => self.apply_feed(feed),
            None => Outcome::Continue,
        }
    }

    fn apply_feed(&mut self, feed: Feed) -> Outcome {
        match feed {
            Feed::Pending => Outcome::Continue,
            Feed::Dropped(keys) => {
                log::debug!("dropped unbound sequence {}", format_sequence(&keys));
                Outcome::Continue
            }
            Feed::Dispatch(command) => {
                log::debug!("dispatch {}", command);
                self.execute(command)
            }
        }
    }

    fn handle_prompt_key(&mut self, key: Key) -> Outcome {
        let Some((kind, editor)) = self.prompt.as_mut() else {
            return Outcome::Continue;
        };
        let kind = *kind;
        let event = editor.handle_key(key);
        match event {
            PromptEvent::Editing => Outcome::Continue,
            PromptEvent::Cancel => {
                self.prompt = None;
                if kind == PromptKind::Repl {
                    self.leave_repl();
                } else {
                    self.mode = Mode::Normal;
                    log::debug!("cancelled {:?} prompt", kind);
                }
                Outcome::Continue
            }
            PromptEvent::Submit(text) => {
                self.prompt = None;
                self.mode = Mode::Normal;
                self.submit(kind, text)
            }
        }
    }

    fn open_prompt(&mut self, kind: PromptKind, editor: LineEditor) {
        self.sequencer.reset();
        self.mode = if kind == PromptKind::Repl { Mode::Repl } else { Mode::Insert };
        self.prompt = Some((kind, editor));
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Run a Normal-mode command.
    pub fn execute(&mut self, command: CommandId) -> Outcome {
        let addr = self.cursor.addr();
        match command {
            CommandId::Quit => {
                log::info!("quit");
                self.should_quit = true;
                return Outcome::Quit;
            }
            CommandId::Help => self.show_help = true,

            CommandId::MoveUp => self.move_cursor(-1, 0),
            CommandId::MoveDown => self.move_cursor(1, 0),
            CommandId::MoveLeft => self.move_cursor(0, -1),
            CommandId::MoveRight => self.move_cursor(0, 1),

            CommandId::EditCell => {
                let sheet = self.workbook.active_sheet();
                let editor = LineEditor::new("cell value> ")
                    .with_text(&sheet.get_cell(addr).edit_text())
                    .with_history(sheet.unique_column_values(addr.col), None);
                self.open_prompt(PromptKind::EditCell(addr), editor);
            }

            CommandId::InsertRowBelow => {
                if self.grid_edit(|sheet| sheet.insert_row_at(addr.row.saturating_add(1))) {
                    self.move_cursor(1, 0);
                }
            }
            CommandId::InsertRowAbove => {
                self.grid_edit(|sheet| sheet.insert_row_at(addr.row));
                self.report_current();
            }
            CommandId::DeleteRow => {
                match self.workbook.active_sheet_mut().delete_row_at(addr.row) {
                    Ok(removed) => {
                        self.clipboard.yank(Payload::Row(removed));
                        self.dirty = true;
                        self.say(format!("deleted row {}", addr.row));
                    }
                    Err(e) => self.say(e.to_string()),
                }
                self.report_current();
            }
            CommandId::DeleteColumn => {
                match self.workbook.active_sheet_mut().delete_column_at(addr.col) {
                    Ok(removed) => {
                        self.clipboard.yank(Payload::Column(removed));
                        self.dirty = true;
                        self.say(format!("deleted column {}", col_to_letter(addr.col)));
                    }
                    Err(e) => self.say(e.to_string()),
                }
                self.report_current();
            }

            CommandId::YankCell => {
                self.clipboard.yank_cell(self.workbook.active_sheet(), addr);
                self.say(format!("yanked cell {}", addr));
            }
            CommandId::YankRow => {
                self.clipboard.yank_row(self.workbook.active_sheet(), addr.row);
                self.say(format!("yanked row {}", addr.row));
            }
            CommandId::YankColumn => {
                self.clipboard.yank_column(self.workbook.active_sheet(), addr.col);
                self.say(format!("yanked column {}", col_to_letter(addr.col)));
            }
            CommandId::CutCell => {
                self.clipboard.cut_cell(self.workbook.active_sheet_mut(), addr);
                self.dirty = true;
                self.say(format!("cut cell {}", addr));
            }
            CommandId::CutRow => {
                self.clipboard.cut_row(self.workbook.active_sheet_mut(), addr.row);
                self.dirty = true;
                self.say(format!("cut row {}", addr.row));
            }
            CommandId::CutColumn => {
                self.clipboard.cut_column(self.workbook.active_sheet_mut(), addr.col);
                self.dirty = true;
                self.say(format!("cut column {}", col_to_letter(addr.col)));
            }
            CommandId::PasteAfter => self.paste(PasteDirection::After),
            CommandId::PasteBefore => self.paste(PasteDirection::Before),

            CommandId::NewSheet => {
                self.open_prompt(PromptKind::NewSheet, LineEditor::new("sheetname? "));
            }
            CommandId::PickSheet => {
                let names: Vec<String> = self.workbook.sheet_names().into_iter().map(String::from).collect();
                let active = self.workbook.active_sheet_index();
                let preselect = (0..names.len()).find(|i| *i != active).or(Some(active));
                let editor = LineEditor::new("ws> ").with_history(names, preselect);
                self.open_prompt(PromptKind::PickSheet, editor);
            }
            CommandId::RenameSheet => {
                let name = self.workbook.active_sheet().name.clone();
                let editor = LineEditor::new("rename sheet> ").with_text(&name);
                self.open_prompt(PromptKind::RenameSheet, editor);
            }
            CommandId::WriteWorkbook => {
                self.say("enter new filename, or use up/down arrow to choose previous");
                let preselect = self.filenames.len().checked_sub(1);
                let editor = LineEditor::new("filename> ").with_history(self.filenames.clone(), preselect);
                self.open_prompt(PromptKind::WriteWorkbook, editor);
            }
            CommandId::Goto => {
                let editor = LineEditor::new("goto> ").with_text(&addr.label());
                self.open_prompt(PromptKind::Goto, editor);
            }
            CommandId::SearchColumn => {
                let editor = LineEditor::new("search> ").with_history(self.search_history.clone(), None);
                self.open_prompt(PromptKind::Search, editor);
            }
            CommandId::ColumnHeader => {
                let header = CellAddr { row: 1, col: addr.col };
                self.say(cursor::report(self.workbook.active_sheet(), header));
            }
            CommandId::RowHeader => {
                let header = CellAddr { row: addr.row, col: 1 };
                self.say(cursor::report(self.workbook.active_sheet(), header));
            }
            CommandId::SubRepl => {
                self.say("repl: enter Lua, .q to leave");
                self.open_repl_prompt();
            }
        }
        Outcome::Continue
    }

    fn submit(&mut self, kind: PromptKind, text: String) -> Outcome {
        match kind {
            PromptKind::EditCell(addr) => self.set_cell_input(addr, &text),
            PromptKind::Goto => {
                if let Err(e) = self.cursor.goto(&text) {
                    log::debug!("{}", e);
                    self.say(e.to_string());
                }
                self.report_current();
            }
            PromptKind::NewSheet => match self.workbook.add_sheet(&text) {
                Ok(index) => {
                    let name = self.workbook.sheet_names()[index].to_string();
                    log::info!("created sheet {}", name);
                    self.dirty = true;
                    self.workbook.set_active_sheet(index);
                    self.say(format!("created sheet {}", name));
                    self.report_current();
                }
                Err(e) => {
                    log::warn!("new sheet: {}", e);
                    self.say(e.to_string());
                }
            },
            PromptKind::PickSheet => match self.workbook.select_sheet(&text) {
                Ok(_) => {
                    let name = self.workbook.active_sheet().name.clone();
                    self.say(format!("selected ws {}", name));
                    self.report_current();
                }
                Err(e) => self.say(e.to_string()),
            },
            PromptKind::RenameSheet => {
                let index = self.workbook.active_sheet_index();
                match self.workbook.rename_sheet(index, &text) {
                    Ok(()) => {
                        self.dirty = true;
                        self.say(format!("renamed sheet to {}", self.workbook.active_sheet().name));
                    }
                    Err(e) => self.say(e.to_string()),
                }
            }
            PromptKind::WriteWorkbook => {
                // save() reports the result itself
                let _ = self.save(&text);
            }
            PromptKind::Search => self.search(&text),
            PromptKind::SearchPick => match search::parse_pick(&text) {
                Ok(addr) => self.goto(addr),
                Err(e) => self.say(e.to_string()),
            },
            PromptKind::Repl => {
                let line = text.trim().to_string();
                if line == ".q" {
                    self.leave_repl();
                    return Outcome::Continue;
                }
                if line.is_empty() {
                    self.open_repl_prompt();
                    return Outcome::Continue;
                }
                remember(&mut self.repl_history, &line);
                self.open_repl_prompt();
                return Outcome::ReplLine(line);
            }
        }
        Outcome::Continue
    }

    fn search(&mut self, pattern: &str) {
        if pattern.is_empty() {
            return;
        }
        remember(&mut self.search_history, pattern);
        let col = self.cursor.col();
        match search::search_column(self.workbook.active_sheet(), col, pattern) {
            Err(e) => {
                let detail = e.to_string();
                let detail = detail.lines().last().unwrap_or("").trim().to_string();
                self.say(format!("invalid pattern: {}", detail));
            }
            Ok(hits) if hits.is_empty() => self.say(format!("no matches for {}", pattern)),
            Ok(hits) => {
                self.say(format!("{} match(es) in column {}", hits.len(), col_to_letter(col)));
                let labels = hits.iter().map(search::SearchHit::label).collect();
                let editor = LineEditor::new("match> ").with_history(labels, Some(0));
                self.open_prompt(PromptKind::SearchPick, editor);
            }
        }
    }

    fn paste(&mut self, direction: PasteDirection) {
        let at = self.cursor.addr();
        match self.clipboard.paste(self.workbook.active_sheet_mut(), at, direction) {
            Ok(target) => {
                self.dirty = true;
                self.cursor.set(target);
                self.report_current();
            }
            Err(e) => {
                log::debug!("paste: {}", e);
                self.say(e.to_string());
            }
        }
    }

    /// Apply an edit to the active sheet. Returns false (after reporting the
    /// error) when the sheet refused it.
    fn grid_edit(&mut self, edit: impl FnOnce(&mut Sheet) -> Result<(), GridError>) -> bool {
        match edit(self.workbook.active_sheet_mut()) {
            Ok(()) => {
                self.dirty = true;
                true
            }
            Err(e) => {
                self.say(e.to_string());
                false
            }
        }
    }

    fn move_cursor(&mut self, drow: isize, dcol: isize) {
        self.cursor.move_by(drow, dcol);
        self.report_current();
    }

    fn open_repl_prompt(&mut self) {
        let editor = LineEditor::new("repl> ").with_history(self.repl_history.clone(), None);
        self.open_prompt(PromptKind::Repl, editor);
    }

    fn leave_repl(&mut self) {
        self.prompt = None;
        self.mode = Mode::Normal;
        self.say("left repl");
    }

    // =========================================================================
    // Operations shared with the repl
    // =========================================================================

    /// Commit editor input to a cell: a leading '=' stores a formula, anything
    /// else a literal; blank input clears the cell.
    pub fn set_cell_input(&mut self, addr: CellAddr, input: &str) {
        self.workbook.active_sheet_mut().set_cell(addr, CellValue::from_input(input));
        self.dirty = true;
        log::debug!("set {} on {}", addr, self.workbook.active_sheet().name);
        self.say(cursor::report(self.workbook.active_sheet(), addr));
    }

    pub fn goto(&mut self, addr: CellAddr) {
        self.cursor.set(addr);
        self.report_current();
    }

    /// Push a line to the message log.
    pub fn say(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
        if self.messages.len() > MAX_MESSAGES {
            let excess = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..excess);
        }
    }

    /// Report the cell under the cursor.
    pub fn report_current(&mut self) {
        let line = cursor::report(self.workbook.active_sheet(), self.cursor.addr());
        self.say(line);
    }

    /// Write the workbook (active sheet only for CSV). The filename is
    /// remembered only once the write succeeds. Result is also reported.
    pub fn save(&mut self, filename: &str) -> Result<(), SaveError> {
        let filename = filename.trim();
        if filename.is_empty() {
            self.say(SaveError::EmptyName.to_string());
            return Err(SaveError::EmptyName);
        }
        let result = termsheet_io::write(
            &self.workbook,
            self.workbook.active_sheet_index(),
            Path::new(filename),
        )
        .map_err(|e| match e {
            IoError::UnsupportedExtension { extension } => SaveError::UnsupportedExtension { extension },
            other => SaveError::Write(other),
        });

        match &result {
            Ok(()) => {
                remember(&mut self.filenames, filename);
                self.dirty = false;
                self.say(format!("sheet written to {}", filename));
            }
            Err(e) => {
                log::warn!("save to {} failed: {}", filename, e);
                self.say(e.to_string());
            }
        }
        result
    }
}

/// Append to a history list, moving an existing equal entry to the end.
fn remember(list: &mut Vec<String>, item: &str) {
    list.retain(|existing| existing != item);
    list.push(item.to_string());
    if list.len() > MAX_HISTORY {
        list.remove(0);
    }
}
