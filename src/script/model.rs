//! Data types shared by the config reader, tokenizer and executor

use serde::Serialize;

/// Operation name that runs before the requested operation
pub const PRE_OPERATION: &str = "pre";

/// Operation name that runs after the requested operation
pub const POST_OPERATION: &str = "post";

/// Case-insensitive name comparison used for operations and config keys
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// A single `#key(value)` configuration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered configuration entries
///
/// Duplicate keys are kept; lookups return the first entry in declaration
/// order whose key matches case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigEntries {
    entries: Vec<ConfigEntry>,
}

impl ConfigEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping declaration order
    pub fn push(&mut self, entry: ConfigEntry) {
        self.entries.push(entry);
    }

    /// Look up a value by key (case-insensitive, first match wins)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| names_match(&e.key, key))
            .map(|e| e.value.as_str())
    }

    /// Put `overrides` in front of the existing entries so they win lookups
    pub fn with_overrides<I>(self, overrides: I) -> Self
    where
        I: IntoIterator<Item = ConfigEntry>,
    {
        let mut entries: Vec<ConfigEntry> = overrides.into_iter().collect();
        entries.extend(self.entries);
        Self { entries }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ConfigEntry> for ConfigEntries {
    fn from_iter<I: IntoIterator<Item = ConfigEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConfigEntries {
    type Item = &'a ConfigEntry;
    type IntoIter = std::slice::Iter<'a, ConfigEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One literal shell command line, substitutions already resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
    /// Create a command from a body line; blank lines yield `None`
    pub fn from_line(line: &str) -> Option<Self> {
        if line.trim().is_empty() {
            None
        } else {
            Some(Self(line.to_string()))
        }
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named, ordered group of commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    name: String,
    commands: Vec<Command>,
}

impl Operation {
    pub fn new(name: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            name: name.into(),
            commands,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Whether this operation answers to `name` (case-insensitive)
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

/// A parsed script: operations in the order they were closed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Script {
    operations: Vec<Operation>,
}

impl Script {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// All operations answering to `name`, in source order
    pub fn find<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Operation> + 'a {
        self.operations.iter().filter(move |op| op.is_named(name))
    }

    /// Distinct operation names in order of first appearance
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for op in &self.operations {
            if !names.iter().any(|n| names_match(n, op.name())) {
                names.push(op.name());
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub(crate) fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }
}
