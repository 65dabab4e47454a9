// Session scenarios driven by key presses with injected time

use std::path::Path;
use std::time::{Duration, Instant};

use tempfile::tempdir;
use termsheet_config::settings::Settings;
use termsheet_core::clipboard::Payload;
use termsheet_core::keys::parse_sequence;
use termsheet_core::session::{LoadError, Mode, Outcome, PromptKind, Session};
use termsheet_engine::address::CellAddr;
use termsheet_engine::cell::CellValue;
use termsheet_engine::workbook::Workbook;

const KEY_GAP: Duration = Duration::from_millis(10);

struct Driver {
    session: Session,
    now: Instant,
}

impl Driver {
    fn new() -> Self {
        Self {
            session: Session::new(Workbook::default(), None, &Settings::default()),
            now: Instant::now(),
        }
    }

    /// Press each key of `seq` 10ms apart; returns the last outcome.
    fn keys(&mut self, seq: &str) -> Outcome {
        let mut outcome = Outcome::Continue;
        for key in parse_sequence(seq).unwrap() {
            self.now += KEY_GAP;
            outcome = self.session.handle_key(key, self.now);
        }
        outcome
    }

    /// Let any pending sequence time out.
    fn settle(&mut self) -> Outcome {
        self.now += Duration::from_secs(1);
        self.session.tick(self.now)
    }

    fn seed(&mut self, label: &str, input: &str) {
        self.session
            .workbook_mut()
            .active_sheet_mut()
            .set_cell(a(label), CellValue::from_input(input));
    }

    fn text(&self, label: &str) -> String {
        self.session.workbook().active_sheet().get_cell(a(label)).edit_text()
    }

    fn last(&self) -> &str {
        self.session.last_message().unwrap_or("")
    }
}

fn a(label: &str) -> CellAddr {
    CellAddr::parse(label).unwrap()
}

#[test]
fn formula_from_typed_cells() {
    let mut d = Driver::new();
    d.keys("i2<enter>");
    assert_eq!(d.last(), "A1 : 2");
    d.keys("<right>i3<enter>");
    d.keys("<right>i=A1+B1<enter>");
    assert_eq!(d.last(), "C1 formula result = 5");
    assert_eq!(d.session.mode(), Mode::Normal);
    assert!(d.session.is_dirty());
}

#[test]
fn literal_replaces_formula() {
    let mut d = Driver::new();
    d.keys("i=1+2<enter>");
    assert_eq!(d.last(), "A1 formula result = 3");
    d.keys("i<C-u>x<enter>");
    assert_eq!(d.last(), "A1 : x");
    assert_eq!(d.session.workbook().active_sheet().get_cell(a("A1")).formula_source(), None);
}

#[test]
fn edit_prefills_formula_and_column_history() {
    let mut d = Driver::new();
    d.seed("A1", "=1+2");
    d.seed("A2", "red");
    d.seed("A3", "red");
    d.keys("i");
    let prompt = d.session.prompt().unwrap();
    assert_eq!(prompt.label(), "cell value> ");
    assert_eq!(prompt.text(), "=1+2");
    assert_eq!(prompt.history(), ["=1+2", "red"]);
}

#[test]
fn cancel_discards_edit() {
    let mut d = Driver::new();
    d.keys("iabc<esc>");
    assert_eq!(d.session.mode(), Mode::Normal);
    assert!(d.session.prompt().is_none());
    assert_eq!(d.text("A1"), "");
    assert!(!d.session.is_dirty());
}

#[test]
fn search_column_and_pick_second_hit() {
    let mut d = Driver::new();
    d.seed("B1", "foo");
    d.seed("B2", "bar");
    d.seed("B3", "boo");
    d.keys("<right>/oo<enter>");

    assert_eq!(d.session.prompt_kind(), Some(PromptKind::SearchPick));
    let prompt = d.session.prompt().unwrap();
    assert_eq!(prompt.history(), ["B1 : foo", "B3 : boo"]);
    assert_eq!(prompt.text(), "B1 : foo");

    d.keys("<down><enter>");
    assert_eq!(d.session.cursor(), a("B3"));
    assert_eq!(d.last(), "B3 : boo");
}

#[test]
fn search_reports_misses_and_bad_patterns() {
    let mut d = Driver::new();
    d.seed("A1", "foo");
    d.keys("/zzz<enter>");
    assert_eq!(d.last(), "no matches for zzz");
    d.keys("/(<enter>");
    assert!(d.last().starts_with("invalid pattern: "));
    assert_eq!(d.session.mode(), Mode::Normal);
}

#[test]
fn delete_row_then_paste_before_restores_it() {
    let mut d = Driver::new();
    d.seed("A1", "h");
    d.seed("A2", "x");
    d.seed("B2", "=A2");
    d.seed("A3", "z");

    d.keys("<down>dd");
    assert_eq!(d.text("A2"), "z");
    assert!(matches!(d.session.clipboard().payload(), Some(Payload::Row(_))));

    d.keys("P");
    assert_eq!(d.text("A1"), "h");
    assert_eq!(d.text("A2"), "x");
    assert_eq!(d.text("B2"), "=A2");
    assert_eq!(d.text("A3"), "z");
    assert_eq!(d.session.cursor(), a("A2"));
}

#[test]
fn paste_after_waits_for_the_deadline() {
    let mut d = Driver::new();
    d.seed("A1", "x");
    d.seed("A2", "z");

    d.keys("dd");
    assert_eq!(d.text("A1"), "z");

    d.keys("p");
    assert_eq!(d.session.pending_keys(), "p");
    assert_eq!(d.text("A2"), "");

    d.settle();
    assert_eq!(d.text("A1"), "z");
    assert_eq!(d.text("A2"), "x");
    assert_eq!(d.session.cursor(), a("A2"));
}

#[test]
fn single_and_double_yank() {
    let mut d = Driver::new();
    d.seed("A1", "a");
    d.seed("B1", "b");

    d.keys("y");
    assert!(d.session.clipboard().payload().is_none());
    d.settle();
    assert_eq!(d.session.clipboard().payload(), Some(&Payload::Cell(CellValue::Text("a".to_string()))));

    d.keys("yy");
    assert_eq!(d.session.pending_keys(), "");
    assert_eq!(d.session.clipboard().payload().map(Payload::kind), Some("row"));

    d.keys("yc");
    assert_eq!(d.session.clipboard().payload().map(Payload::kind), Some("column"));
}

#[test]
fn expired_prefix_fires_before_next_key() {
    let mut d = Driver::new();
    d.seed("A1", "a");
    d.keys("y");
    d.now += Duration::from_secs(1);
    d.keys("<right>");
    assert_eq!(d.session.clipboard().payload().map(Payload::kind), Some("cell"));
    assert_eq!(d.session.cursor(), a("B1"));
}

#[test]
fn lone_d_is_dropped() {
    let mut d = Driver::new();
    d.seed("A1", "keep");
    d.keys("d");
    d.settle();
    assert_eq!(d.text("A1"), "keep");
    assert!(d.session.clipboard().payload().is_none());
    assert_eq!(d.session.pending_keys(), "");
}

#[test]
fn p_then_s_picks_sheet_instead_of_pasting() {
    let mut d = Driver::new();
    d.session.workbook_mut().add_sheet("Data").unwrap();

    d.keys("p");
    assert!(d.session.prompt().is_none());
    d.keys("s");
    assert_eq!(d.session.prompt_kind(), Some(PromptKind::PickSheet));
    assert_eq!(d.session.prompt().unwrap().text(), "Data");

    d.keys("<enter>");
    assert_eq!(d.session.workbook().active_sheet().name, "Data");
    assert!(d.session.messages().iter().any(|m| m == "selected ws Data"));
}

#[test]
fn sheets_reject_duplicates_and_unknown_names() {
    let mut d = Driver::new();
    d.keys("nsSheet1<enter>");
    assert_eq!(d.last(), "a sheet named Sheet1 already exists");
    assert_eq!(d.session.workbook().sheet_count(), 1);

    d.seed("A1", "on sheet1");
    d.keys("nsData<enter>");
    let messages = d.session.messages();
    assert_eq!(messages[messages.len() - 2], "created sheet Data");
    assert_eq!(d.last(), "A1 :");
    assert_eq!(d.session.workbook().active_sheet().name, "Data");
    assert_eq!(d.session.workbook().active_sheet_index(), 1);

    d.keys("ps<C-u>nope<enter>");
    assert_eq!(d.last(), "no such sheet.");
    assert_eq!(d.session.workbook().active_sheet().name, "Data");

    d.keys("rs<C-u>Main<enter>");
    assert_eq!(d.last(), "renamed sheet to Main");
    assert_eq!(d.session.workbook().sheet_names(), vec!["Sheet1", "Main"]);

    d.keys("ps<C-u>sheet1<enter>");
    assert_eq!(d.text("A1"), "on sheet1");
}

#[test]
fn goto_valid_and_invalid() {
    let mut d = Driver::new();
    d.keys("g");
    assert_eq!(d.session.prompt().unwrap().text(), "A1");
    d.keys("<C-u>c7<enter>");
    assert_eq!(d.session.cursor(), a("C7"));

    d.keys("g<C-u>zz<enter>");
    let messages = d.session.messages();
    assert_eq!(messages[messages.len() - 2], "zz is not a valid cell address");
    assert_eq!(d.last(), "C7 :");
    assert_eq!(d.session.cursor(), a("C7"));
}

#[test]
fn unsupported_save_keeps_session_editable() {
    let mut d = Driver::new();
    d.keys("wb");
    assert_eq!(d.session.prompt().unwrap().text(), "untitled.xlsx");

    d.keys("<C-u>out.tsv<enter>");
    assert_eq!(d.last(), "please use either .xlsx or .csv file extension to specify file format");
    assert!(!Path::new("out.tsv").exists());
    assert_eq!(d.session.mode(), Mode::Normal);
    assert!(!d.session.should_quit());

    d.keys("i7<enter>");
    assert_eq!(d.last(), "A1 : 7");

    assert_eq!(d.session.filename(), "untitled.xlsx");
    d.keys("wb");
    assert_eq!(d.session.prompt().unwrap().text(), "untitled.xlsx");
    assert_eq!(d.session.prompt().unwrap().history(), ["untitled.xlsx"]);
}

#[test]
fn save_csv_writes_active_sheet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let name = path.display().to_string();

    let mut d = Driver::new();
    d.keys("i2<enter><right>i=A1*3<enter>");
    assert!(d.session.is_dirty());

    d.session.save(&name).unwrap();
    assert_eq!(d.last(), format!("sheet written to {}", name));
    assert!(!d.session.is_dirty());
    assert_eq!(d.session.filename(), name);
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim_end(), "2;6");
}

#[test]
fn insert_rows_below_and_above() {
    let mut d = Driver::new();
    d.seed("A1", "a");
    d.seed("A2", "b");

    d.keys("o");
    assert_eq!(d.session.cursor(), a("A2"));
    assert_eq!(d.text("A2"), "");
    assert_eq!(d.text("A3"), "b");

    d.keys("O");
    assert_eq!(d.session.cursor(), a("A2"));
    assert_eq!(d.text("A4"), "b");
}

#[test]
fn addresses_past_the_sheet_limits_are_refused() {
    let mut d = Driver::new();
    d.keys("g<C-u>A18446744073709551615<enter>");
    let messages = d.session.messages();
    assert_eq!(messages[messages.len() - 2], "A18446744073709551615 is not a valid cell address");
    assert_eq!(d.session.cursor(), a("A1"));

    d.seed("B1048576", "bottom");
    d.keys("g<C-u>A1048576<enter>");
    assert_eq!(d.session.cursor(), a("A1048576"));
    d.keys("o");
    assert_eq!(d.last(), "beyond the last row or column of the sheet");
    assert_eq!(d.session.cursor(), a("A1048576"));

    d.keys("<down>");
    assert_eq!(d.session.cursor(), a("A1048576"));
    d.keys("O");
    assert_eq!(d.text("B1048576"), "bottom");
    assert_eq!(d.session.mode(), Mode::Normal);
}

#[test]
fn headers_report_without_moving() {
    let mut d = Driver::new();
    d.seed("A1", "Name");
    d.seed("B1", "Age");
    d.seed("A3", "Bob");
    d.seed("B3", "42");
    d.keys("g<C-u>B3<enter>");

    d.keys("ch");
    assert_eq!(d.last(), "B1 : Age");
    d.keys("rh");
    assert_eq!(d.last(), "A3 : Bob");
    assert_eq!(d.session.cursor(), a("B3"));
}

#[test]
fn cut_cell_clears_without_shifting() {
    let mut d = Driver::new();
    d.seed("A1", "a");
    d.seed("A2", "b");
    d.keys("x");
    d.settle();
    assert_eq!(d.text("A1"), "");
    assert_eq!(d.text("A2"), "b");
    d.keys("<down>P");
    assert_eq!(d.text("A2"), "a");
}

#[test]
fn quit_and_help() {
    let mut d = Driver::new();
    d.keys("h");
    assert!(d.session.show_help());
    assert_eq!(d.keys("q"), Outcome::Continue);
    assert!(!d.session.show_help());
    assert!(!d.session.should_quit());

    assert_eq!(d.keys("q"), Outcome::Quit);
    assert!(d.session.should_quit());
}

#[test]
fn repl_lines_are_handed_to_caller() {
    let mut d = Driver::new();
    d.keys(":");
    assert_eq!(d.session.mode(), Mode::Repl);
    assert_eq!(d.keys("1+1<enter>"), Outcome::ReplLine("1+1".to_string()));
    assert_eq!(d.session.mode(), Mode::Repl);
    assert_eq!(d.session.prompt().unwrap().label(), "repl> ");

    d.keys(".q<enter>");
    assert_eq!(d.session.mode(), Mode::Normal);
    assert_eq!(d.last(), "left repl");
}

#[test]
fn load_dispatches_on_extension() {
    let settings = Settings::default();
    let err = Session::load(Some(Path::new("data.tsv")), &settings).err().unwrap();
    assert_eq!(err, LoadError::UnsupportedExtension { extension: "tsv".to_string() });

    let dir = tempdir().unwrap();
    let fresh = dir.path().join("new.csv");
    let session = Session::load(Some(fresh.as_path()), &settings).unwrap();
    assert_eq!(session.filename(), fresh.display().to_string());
    assert!(session.workbook().active_sheet().is_empty());

    let mut settings = Settings::default();
    settings.default_sheet_name = "Mappe 1".to_string();
    let session = Session::load(None, &settings).unwrap();
    assert_eq!(session.workbook().sheet_names(), vec!["Mappe 1"]);
    assert_eq!(session.filename(), "untitled.xlsx");
}

#[test]
fn load_existing_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "Name;Age\nAda;36\n").unwrap();

    let session = Session::load(Some(path.as_path()), &Settings::default()).unwrap();
    let sheet = session.workbook().active_sheet();
    assert_eq!(sheet.name, "people");
    assert_eq!(sheet.display_text(a("B2")), "36");
}
