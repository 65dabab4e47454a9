// termsheet - modal spreadsheet editor for the terminal

mod exit_codes;
mod input;
mod logging;
mod repl;
mod tui;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use termsheet_config::settings::Settings;
use termsheet_core::session::{LoadError, Session};

use exit_codes::{EXIT_ERROR, EXIT_READ_FAILED, EXIT_SUCCESS, EXIT_UNSUPPORTED_FORMAT};

#[derive(Parser)]
#[command(name = "termsheet")]
#[command(about = "Modal spreadsheet editor for the terminal")]
#[command(version)]
struct Cli {
    /// Workbook to open (.xlsx or .csv). A missing file is created on first save.
    file: Option<PathBuf>,

    /// Read settings from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    // Held until exit so buffered records are flushed
    let _log_guard = match logging::init(&settings.effective_log_file(), settings.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            // Not fatal: the editor works without a log
            eprintln!("warning: {}", e);
            None
        }
    };
    tracing::info!("termsheet {} starting", env!("CARGO_PKG_VERSION"));

    let session = Session::load(cli.file.as_deref(), &settings).map_err(CliError::load)?;
    tui::run(session, settings.column_width).map_err(CliError::general)
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Map a failed workbook load to its exit code and hint.
    pub fn load(err: LoadError) -> Self {
        tracing::warn!("load failed: {}", err);
        match err {
            LoadError::UnsupportedExtension { .. } => Self {
                code: EXIT_UNSUPPORTED_FORMAT,
                message: err.to_string(),
                hint: Some("please provide a filename with either .xlsx or .csv extension.".to_string()),
            },
            LoadError::Read(_) => Self { code: EXIT_READ_FAILED, message: err.to_string(), hint: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termsheet_io::IoError;

    #[test]
    fn test_unsupported_extension_maps_to_format_code() {
        let err = CliError::load(LoadError::UnsupportedExtension { extension: "tsv".to_string() });
        assert_eq!(err.code, EXIT_UNSUPPORTED_FORMAT);
        assert_eq!(err.message, "extension is: tsv");
        assert!(err.hint.unwrap().contains(".xlsx or .csv"));
    }

    #[test]
    fn test_read_failure_maps_to_read_code() {
        let err = CliError::load(LoadError::Read(IoError::Read {
            path: "a.csv".to_string(),
            message: "denied".to_string(),
        }));
        assert_eq!(err.code, EXIT_READ_FAILED);
        assert_eq!(err.message, "failed to read a.csv: denied");
        assert!(err.hint.is_none());
    }

    #[test]
    fn test_cli_parses_optional_file() {
        let cli = Cli::try_parse_from(["termsheet", "book.xlsx"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("book.xlsx")));
        let cli = Cli::try_parse_from(["termsheet"]).unwrap();
        assert!(cli.file.is_none());
        assert!(Cli::try_parse_from(["termsheet", "a.csv", "b.csv"]).is_err());
    }
}
