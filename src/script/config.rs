//! Reader for the `#key(value)` configuration grammar
//!
//! ```text
//! #target(x86_64-unknown-linux-gnu)
//! #profile(release)
//! ```
//!
//! There is no escaping: the first `)` after a value closes the entry, and an
//! entry that never closes is dropped.

use super::model::{ConfigEntries, ConfigEntry};

/// Marker that starts a new entry
const ENTRY_PREFIX: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Key,
    Value,
}

/// In-progress scan state
#[derive(Debug)]
struct Reader {
    mode: Mode,
    key: String,
    value: String,
    entries: ConfigEntries,
}

impl Reader {
    fn new() -> Self {
        Self {
            mode: Mode::Idle,
            key: String::new(),
            value: String::new(),
            entries: ConfigEntries::new(),
        }
    }

    fn feed(&mut self, c: char) {
        match (self.mode, c) {
            (_, ENTRY_PREFIX) => {
                if self.mode != Mode::Idle {
                    tracing::debug!("Discarding unterminated config entry '{}'", self.key.trim());
                }
                self.key.clear();
                self.value.clear();
                self.mode = Mode::Key;
            }
            (Mode::Key, '(') => self.mode = Mode::Value,
            (Mode::Value, ')') => {
                let key = std::mem::take(&mut self.key);
                let value = std::mem::take(&mut self.value);
                self.entries.push(ConfigEntry::new(key.trim(), value));
                self.mode = Mode::Idle;
            }
            (Mode::Key, c) => self.key.push(c),
            (Mode::Value, c) => self.value.push(c),
            (Mode::Idle, _) => {}
        }
    }

    fn finish(self) -> ConfigEntries {
        if self.mode != Mode::Idle {
            tracing::debug!("Dropping unterminated config entry '{}'", self.key.trim());
        }
        self.entries
    }
}

/// Parse configuration text into ordered entries
pub fn parse_config(text: &str) -> ConfigEntries {
    let mut reader = Reader::new();
    for c in text.chars() {
        reader.feed(c);
    }
    reader.finish()
}
