// Editor core: everything between a key press and a grid mutation

pub mod clipboard;
pub mod command;
pub mod cursor;
pub mod keymap;
pub mod keys;
pub mod prompt;
pub mod search;
pub mod sequencer;
pub mod session;
