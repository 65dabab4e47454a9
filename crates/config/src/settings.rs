// Application settings
// Loaded from ~/.config/termsheet/settings.json

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Verbosity of the log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Keys
    /// Milliseconds to wait for the next key of a multi-key command
    #[serde(rename = "keys.sequenceTimeout")]
    pub sequence_timeout_ms: u64,

    /// Extra key sequences mapped to command names, e.g. `{"<C-s>": "write_workbook"}`
    #[serde(rename = "keys.bindings")]
    pub bindings: BTreeMap<String, String>,

    // Sheet
    #[serde(rename = "sheet.defaultName")]
    pub default_sheet_name: String,

    // Grid
    #[serde(rename = "grid.columnWidth")]
    pub column_width: u16,

    // Logging
    #[serde(rename = "log.file")]
    pub log_file: Option<PathBuf>,  // None = <config dir>/termsheet.log

    #[serde(rename = "log.level")]
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sequence_timeout_ms: 500,
            bindings: BTreeMap::new(),
            default_sheet_name: "Sheet1".to_string(),
            column_width: 12,
            log_file: None,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Directory holding settings.json and the default log file
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("termsheet")
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Log file from settings, or the default next to settings.json
    pub fn effective_log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("termsheet.log"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific file, falling back to defaults on error
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error parsing settings.json: {}", e);
                    eprintln!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading settings.json: {}", e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring lines that start with `//`
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut settings: Settings = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;
        if settings.default_sheet_name.trim().is_empty() {
            settings.default_sheet_name = Self::default().default_sheet_name;
        }
        if settings.column_width < 3 {
            settings.column_width = 3;
        }
        Ok(settings)
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Keys
    // Milliseconds to wait for the next key of a multi-key command
    "keys.sequenceTimeout": 500,
    // Extra bindings: sequence -> command name
    // Sequences use plain characters, <up> <down> <left> <right> <enter> <esc>
    // <tab> <backspace> <del> <home> <end>, and <C-x> for Ctrl+x.
    "keys.bindings": {},

    // Sheet
    "sheet.defaultName": "Sheet1",

    // Grid
    "grid.columnWidth": 12,

    // Logging
    // null = <config dir>/termsheet.log
    "log.file": null,
    // off, error, warn, info, debug, trace
    "log.level": "info"
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            eprintln!("Error writing default settings.json: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.sequence_timeout_ms, 500);
        assert_eq!(settings.default_sheet_name, "Sheet1");
        assert_eq!(settings.log_level, LogLevel::Info);
        assert!(settings.bindings.is_empty());
    }

    #[test]
    fn test_parse_with_comments_and_partial_keys() {
        let json = r#"{
            // faster chords
            "keys.sequenceTimeout": 250,
            "keys.bindings": { "<C-s>": "write_workbook" },
            "log.level": "debug"
        }"#;
        let settings = Settings::parse(json).unwrap();
        assert_eq!(settings.sequence_timeout_ms, 250);
        assert_eq!(settings.bindings.get("<C-s>").map(String::as_str), Some("write_workbook"));
        assert_eq!(settings.log_level, LogLevel::Debug);
        assert_eq!(settings.default_sheet_name, "Sheet1");
    }

    #[test]
    fn test_blank_sheet_name_falls_back() {
        let settings = Settings::parse(r#"{ "sheet.defaultName": "  " }"#).unwrap();
        assert_eq!(settings.default_sheet_name, "Sheet1");
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_default_file_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        Settings::default().create_default_file(&path);
        assert_eq!(Settings::load_from(&path), Settings::default());
    }
}
