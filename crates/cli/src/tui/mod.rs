use std::io::stdout;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEvent},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use termsheet_core::session::{Mode, Outcome, Session};
use termsheet_engine::address::{col_to_letter, CellAddr};

use crate::input;
use crate::repl::Repl;
use crate::util;

/// Upper bound on one event wait when no key sequence is pending
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Lines of the message log kept on screen
const MESSAGE_LINES: u16 = 4;

/// Title + message pane + bottom line
const CHROME_HEIGHT: u16 = 1 + MESSAGE_LINES + 1;

struct TuiApp {
    session: Session,
    repl: Repl,
    /// First visible row / column, 1-based like cell addresses
    scroll_row: usize,
    scroll_col: usize,
    column_width: usize,
    row_num_width: usize,
}

impl TuiApp {
    fn new(session: Session, repl: Repl, column_width: u16) -> Self {
        Self {
            session,
            repl,
            scroll_row: 1,
            scroll_col: 1,
            column_width: column_width as usize,
            row_num_width: 4,
        }
    }

    fn handle_key(&mut self, event: KeyEvent) {
        let Some(key) = input::translate(event) else {
            return;
        };
        let outcome = self.session.handle_key(key, Instant::now());
        self.apply(outcome);
    }

    fn tick(&mut self) {
        let outcome = self.session.tick(Instant::now());
        self.apply(outcome);
    }

    fn apply(&mut self, outcome: Outcome) {
        if let Outcome::ReplLine(line) = outcome {
            self.repl.run_line(&mut self.session, &line);
        }
    }

    /// How long the next event wait may block
    fn poll_timeout(&self) -> Duration {
        match self.session.deadline() {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()).min(IDLE_POLL),
            None => IDLE_POLL,
        }
    }

    fn ensure_visible(&mut self, visible_rows: usize, area_width: u16) {
        let cursor = self.session.cursor();
        let digits = self.scroll_row.saturating_add(visible_rows).to_string().len();
        self.row_num_width = digits.max(3) + 1;

        if cursor.row < self.scroll_row {
            self.scroll_row = cursor.row;
        }
        if visible_rows > 0 && cursor.row >= self.scroll_row.saturating_add(visible_rows) {
            self.scroll_row = cursor.row + 1 - visible_rows;
        }

        let vis_cols = self.visible_column_count(area_width);
        if cursor.col < self.scroll_col {
            self.scroll_col = cursor.col;
        }
        if cursor.col >= self.scroll_col.saturating_add(vis_cols) {
            self.scroll_col = cursor.col + 1 - vis_cols;
        }
    }

    fn visible_column_count(&self, area_width: u16) -> usize {
        let available = (area_width as usize).saturating_sub(self.row_num_width + 1);
        (available / (self.column_width + 1)).max(1)
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(2),
            Constraint::Length(MESSAGE_LINES),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_grid(frame, chunks[1]);
        self.draw_messages(frame, chunks[2]);
        self.draw_bottom_line(frame, chunks[3]);

        if self.session.show_help() {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let workbook = self.session.workbook();
        let dirty = if self.session.is_dirty() { " [+]" } else { "" };
        let mode = match self.session.mode() {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Repl => "REPL",
        };
        let title = format!(
            " termsheet: {}{} | sheet: {} ({}/{}) | {} ",
            self.session.filename(),
            dirty,
            workbook.active_sheet().name,
            workbook.active_sheet_index() + 1,
            workbook.sheet_count(),
            mode,
        );
        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect) {
        let sheet = self.session.workbook().active_sheet();
        let cursor = self.session.cursor();
        let width = self.column_width;
        let vis_cols = self.scroll_col..self.scroll_col.saturating_add(self.visible_column_count(area.width));
        let visible_rows = area.height.saturating_sub(1) as usize;

        // Header line
        let mut header_spans = vec![Span::styled(
            format!("{} ", " ".repeat(self.row_num_width)),
            Style::default().fg(Color::DarkGray),
        )];
        for c in vis_cols.clone() {
            let style = if c == cursor.col {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            };
            header_spans.push(Span::styled(format!("{} ", util::pad_right(&col_to_letter(c), width)), style));
        }

        let mut lines: Vec<Line> = Vec::with_capacity(visible_rows + 1);
        lines.push(Line::from(header_spans));

        for r in self.scroll_row..self.scroll_row.saturating_add(visible_rows) {
            let is_cursor_row = r == cursor.row;
            let row_num_style = if is_cursor_row {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let mut spans = vec![Span::styled(
                format!("{:>width$} ", r, width = self.row_num_width),
                row_num_style,
            )];

            for c in vis_cols.clone() {
                let text = CellAddr::new(r, c).map(|addr| sheet.display_text(addr)).unwrap_or_default();
                let style = if is_cursor_row && c == cursor.col {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::White)
                        .add_modifier(Modifier::BOLD)
                } else if is_cursor_row {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::Gray)
                };
                spans.push(Span::styled(format!("{} ", util::pad_right(&text, width)), style));
            }
            lines.push(Line::from(spans));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_messages(&self, frame: &mut Frame, area: Rect) {
        let messages = self.session.messages();
        let start = messages.len().saturating_sub(area.height as usize);
        let newest = messages.len().saturating_sub(1);
        let lines: Vec<Line> = messages[start..]
            .iter()
            .enumerate()
            .map(|(i, message)| {
                let style = if start + i == newest {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Line::from(Span::styled(format!(" {}", message), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_bottom_line(&self, frame: &mut Frame, area: Rect) {
        let bar = Style::default().fg(Color::Black).bg(Color::DarkGray);

        if let Some(editor) = self.session.prompt() {
            let label = editor.label();
            let text = editor.text();
            let split = text.char_indices().nth(editor.cursor()).map(|(i, _)| i).unwrap_or(text.len());
            let room = (area.width as usize).saturating_sub(util::display_width(label) + 1);
            let before = util::tail_to_width(&text[..split], room);
            let after = &text[split..];

            let para = Paragraph::new(Line::from(vec![
                Span::styled(label.to_string(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::raw(format!("{}{}", before, after)),
            ]));
            frame.render_widget(para, area);

            let x = area.x + (util::display_width(label) + util::display_width(before)) as u16;
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let pending = self.session.pending_keys();
        let left = if pending.is_empty() {
            format!(" {}", self.session.cursor())
        } else {
            format!(" {}  {}", self.session.cursor(), pending)
        };
        let right = "h: help ";
        let padding = (area.width as usize).saturating_sub(util::display_width(&left) + right.len());
        let status = format!("{}{:pad$}{}", left, "", right, pad = padding);
        let para = Paragraph::new(Line::from(vec![Span::styled(status, bar)])).style(bar);
        frame.render_widget(para, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let mut help_lines = vec![String::new(), "  Normal mode".to_string(), "  -----------".to_string()];
        help_lines.extend(self.session.help_lines().into_iter().map(|line| format!("  {}", line)));
        help_lines.extend(
            [
                "",
                "  Prompts",
                "  -------",
                "  <enter> - accept the line",
                "  <esc>, <C-c> - cancel",
                "  <up>, <down> - walk the history",
                "  <C-u> - clear to start of line",
                "  .q - leave the repl",
                "",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        let widest = help_lines.iter().map(|s| util::display_width(s)).max().unwrap_or(0);
        let help_width = (widest as u16 + 4).min(area.width);
        let help_height = (help_lines.len() as u16 + 2).min(area.height);
        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let popup = Rect::new(area.x + x, area.y + y, help_width, help_height);

        let lines: Vec<Line> = help_lines
            .into_iter()
            .map(|s| Line::from(Span::styled(s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

/// Run the editor until the quit command.
pub fn run(session: Session, column_width: u16) -> Result<(), String> {
    let repl = Repl::new()?;
    run_app(TuiApp::new(session, repl, column_width))
}

fn run_app(mut app: TuiApp) -> Result<(), String> {
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        let term_size = terminal
            .size()
            .map(|s| Rect::new(0, 0, s.width, s.height))
            .unwrap_or_default();
        // Grid header takes one more line
        let visible_rows = term_size.height.saturating_sub(CHROME_HEIGHT + 1) as usize;
        app.ensure_visible(visible_rows, term_size.width);

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if event::poll(app.poll_timeout()).map_err(|e| format!("event poll error: {}", e))? {
            if let Event::Key(key) = event::read().map_err(|e| format!("event read error: {}", e))? {
                app.handle_key(key);
            }
        }
        app.tick();

        if app.session.should_quit() {
            break;
        }
    }

    tracing::info!("editor closed");
    Ok(())
}
