// Normal-mode key accumulation with a single debounce deadline
//
// A key that completes a command with no longer continuation fires at once.
// A key that leaves the buffer a proper prefix (re)arms the deadline; when it
// passes, the buffer fires if it is itself a command and is dropped otherwise.
// A buffer no command starts with is dropped on the key that produced it,
// without waiting for the deadline; nothing typed later could complete it.

use std::time::{Duration, Instant};

use crate::command::CommandId;
use crate::keymap::{Keymap, Lookup};
use crate::keys::{format_sequence, Key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// Waiting for more keys or the deadline
    Pending,
    Dispatch(CommandId),
    /// Buffer matched nothing and was discarded
    Dropped(Vec<Key>),
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    buffer: Vec<Key>,
    deadline: Option<Instant>,
    timeout: Duration,
}

impl Sequencer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: Vec::new(),
            deadline: None,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pending(&self) -> &[Key] {
        &self.buffer
    }

    pub fn pending_display(&self) -> String {
        format_sequence(&self.buffer)
    }

    /// When the buffered sequence resolves if no key arrives first
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.deadline = None;
    }

    /// Append a key. Callers `poll` first so an expired buffer resolves
    /// before the new key joins it.
    pub fn feed(&mut self, keymap: &Keymap, key: Key, now: Instant) -> Feed {
        self.buffer.push(key);
        match keymap.lookup(&self.buffer) {
            // Dead buffer: drop now rather than at the deadline
            Lookup::NoMatch => {
                self.deadline = None;
                Feed::Dropped(std::mem::take(&mut self.buffer))
            }
            Lookup::Exact(command) => {
                self.reset();
                Feed::Dispatch(command)
            }
            Lookup::Prefix { .. } => {
                self.deadline = Some(now + self.timeout);
                Feed::Pending
            }
        }
    }

    /// Resolve the buffer if its deadline has passed. Returns None when
    /// nothing was due.
    pub fn poll(&mut self, keymap: &Keymap, now: Instant) -> Option<Feed> {
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return None,
        }
        self.deadline = None;
        let buffer = std::mem::take(&mut self.buffer);
        let exact = match keymap.lookup(&buffer) {
            Lookup::Exact(command) => Some(command),
            Lookup::Prefix { exact } => exact,
            Lookup::NoMatch => None,
        };
        Some(match exact {
            Some(command) => Feed::Dispatch(command),
            None => Feed::Dropped(buffer),
        })
    }
}
