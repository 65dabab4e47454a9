//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract: scripts launching the editor
//! rely on them to tell a bad invocation from a bad file.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success (editor exited normally)                |
//! | 1    | General error (terminal setup or I/O failure)   |
//! | 2    | Usage error (clap rejects the arguments)        |
//! | 3    | File extension is neither `.xlsx` nor `.csv`    |
//! | 4    | File exists but could not be read               |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - editor exited normally.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - terminal setup failed or the UI loop hit an I/O error.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments. Emitted by clap itself; listed for reference.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Load (3-4)
// =============================================================================

/// The file to open has an extension other than `.xlsx` / `.csv`.
pub const EXIT_UNSUPPORTED_FORMAT: u8 = 3;

/// The file exists but reading or parsing it failed.
pub const EXIT_READ_FAILED: u8 = 4;
