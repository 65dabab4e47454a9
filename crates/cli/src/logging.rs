// File logging. The terminal belongs to the UI, so records go to a file
// through a non-blocking tracing writer. `log::` calls from the library
// crates are bridged into the same subscriber.

use std::path::Path;

use termsheet_config::settings::LogLevel;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;

pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

/// Appender writing to exactly `path`, never rotated. Missing parent
/// directories are created.
fn file_appender(path: &Path) -> Result<RollingFileAppender, String> {
    let name = path
        .file_name()
        .ok_or_else(|| format!("log file {} has no file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .map_err(|e| format!("failed to open log file {}: {}", path.display(), e))
}

/// Install the global subscriber, appending to `path`. With `LogLevel::Off`
/// nothing is opened. The returned guard flushes pending records on drop and
/// must outlive the editor.
pub fn init(path: &Path, level: LogLevel) -> Result<Option<WorkerGuard>, String> {
    let level = level_filter(level);
    if level == LevelFilter::OFF {
        return Ok(None);
    }

    let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| format!("failed to install logger: {}", e))?;
    Ok(Some(guard))
}
