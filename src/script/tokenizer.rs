//! Script tokenizer
//!
//! Turns script text into a [`Script`]. The grammar is a sequence of
//! operations, each a prefixed name followed by a parenthesized body:
//!
//! ```text
//! #pre(
//!     mkdir -p .build
//! )
//! #build(
//!     cargo build --target ${target}
//! )
//! ```
//!
//! Every non-blank body line becomes one command. `${key}` inside a body is
//! replaced by the first config entry whose key matches case-insensitively
//! (nothing if there is none). A second `$` inside a reference abandons it
//! and resumes the body. Fragments that never close are dropped.
//!
//! `(`, `)` and `$` keep their meaning outside an operation too: a stray
//! `)` closes a nameless operation, and `(` or `$` start collecting a body
//! for one. Other text between operations is ignored. Spaces (but no other
//! whitespace) are dropped from names and reference keys.

use super::model::{Command, ConfigEntries, Operation, Script};

/// Default marker that starts an operation
pub const DEFAULT_PREFIX: char = '#';

/// Scanner mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Between operations
    Idle,
    /// After the prefix, before `(`
    Name,
    /// Inside `( ... )`
    Body,
    /// After `$`, until `}` (the `{` itself is skipped)
    ConfigRef,
}

/// Buffers for the operation being built
///
/// Owned by a single [`Tokenizer::tokenize`] call.
#[derive(Debug)]
struct State<'c> {
    mode: Mode,
    name: String,
    body: String,
    key: String,
    config: &'c ConfigEntries,
    script: Script,
}

impl<'c> State<'c> {
    fn new(config: &'c ConfigEntries) -> Self {
        Self {
            mode: Mode::Idle,
            name: String::new(),
            body: String::new(),
            key: String::new(),
            config,
            script: Script::default(),
        }
    }

    fn in_operation(&self) -> bool {
        self.mode != Mode::Idle
    }

    fn begin_operation(&mut self) {
        if self.in_operation() {
            tracing::debug!("Discarding unterminated operation '{}'", self.name);
        }
        self.reset();
        self.mode = Mode::Name;
    }

    fn close_operation(&mut self) {
        let commands: Vec<Command> = self.body.split('\n').filter_map(Command::from_line).collect();
        let name = std::mem::take(&mut self.name);
        tracing::trace!("Closed operation '{}' with {} command(s)", name, commands.len());
        self.script.push(Operation::new(name, commands));
        self.reset();
    }

    fn begin_ref(&mut self) {
        self.key.clear();
        self.mode = Mode::ConfigRef;
    }

    fn abort_ref(&mut self) {
        self.key.clear();
        self.mode = Mode::Body;
    }

    fn resolve_ref(&mut self) {
        match self.config.get(&self.key) {
            Some(value) => self.body.push_str(value),
            None => tracing::debug!("Config key '{}' not found, substituting nothing", self.key),
        }
        self.key.clear();
        self.mode = Mode::Body;
    }

    fn reset(&mut self) {
        self.name.clear();
        self.body.clear();
        self.key.clear();
        self.mode = Mode::Idle;
    }

    fn feed(&mut self, c: char, prefix: char) {
        if c == prefix {
            self.begin_operation();
            return;
        }

        match (self.mode, c) {
            (_, '(') => self.mode = Mode::Body,
            (_, ')') => self.close_operation(),
            (Mode::ConfigRef, '$') => self.abort_ref(),
            (_, '$') => self.begin_ref(),
            (Mode::ConfigRef, '{') => {}
            (Mode::ConfigRef, '}') => self.resolve_ref(),
            (Mode::ConfigRef, c) if c != ' ' => self.key.push(c),
            (Mode::Name, c) if c != ' ' => self.name.push(c),
            (Mode::Body, c) if c != '\r' => self.body.push(c),
            _ => {}
        }
    }

    fn finish(self) -> Script {
        if self.in_operation() {
            tracing::debug!("Dropping unterminated operation '{}'", self.name);
        }
        self.script
    }
}

/// Script tokenizer with a configurable operation prefix
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    prefix: char,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX,
        }
    }

    /// Use a different character to start operations
    pub fn with_prefix(mut self, prefix: char) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Tokenize `text`, resolving `${key}` references against `config`
    pub fn tokenize(&self, text: &str, config: &ConfigEntries) -> Script {
        let mut state = State::new(config);
        for c in text.chars() {
            state.feed(c, self.prefix);
        }
        state.finish()
    }
}

/// Tokenize with the default `#` prefix
pub fn tokenize(text: &str, config: &ConfigEntries) -> Script {
    Tokenizer::new().tokenize(text, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::config::parse_config;

    fn commands<'a>(script: &'a Script, name: &'a str) -> Vec<&'a str> {
        script
            .find(name)
            .flat_map(|op| op.commands().iter().map(|c| c.text()))
            .collect()
    }

    #[test]
    fn test_single_operation() {
        let script = tokenize("#build(echo A)", &ConfigEntries::new());

        assert_eq!(script.len(), 1);
        assert_eq!(script.operations()[0].name(), "build");
        assert_eq!(commands(&script, "build"), vec!["echo A"]);
    }

    #[test]
    fn test_body_split_on_newlines_blank_lines_removed() {
        let text = "#build(\n  cargo fmt\n\n   \ncargo build\n)";
        let script = tokenize(text, &ConfigEntries::new());

        assert_eq!(commands(&script, "BUILD"), vec!["  cargo fmt", "cargo build"]);
    }

    #[test]
    fn test_carriage_returns_stripped() {
        let script = tokenize("#build(\r\necho A\r\necho B\r\n)", &ConfigEntries::new());
        assert_eq!(commands(&script, "build"), vec!["echo A", "echo B"]);
    }

    #[test]
    fn test_name_whitespace_ignored() {
        let script = tokenize("#  clean  (rm -rf .build)", &ConfigEntries::new());
        assert_eq!(script.operations()[0].name(), "clean");
    }

    #[test]
    fn test_operations_in_closing_order() {
        let script = tokenize("#pre(a)\n#build(b)\n#post(c)", &ConfigEntries::new());
        assert_eq!(script.names(), vec!["pre", "build", "post"]);
    }

    #[test]
    fn test_empty_body_yields_operation_without_commands() {
        let script = tokenize("#noop()", &ConfigEntries::new());
        assert_eq!(script.len(), 1);
        assert!(script.operations()[0].commands().is_empty());
    }

    #[test]
    fn test_config_substitution() {
        let config = parse_config("#Target(x86_64-unknown-linux-gnu)");
        let script = tokenize("#build(cargo build --target ${target})", &config);

        assert_eq!(
            commands(&script, "build"),
            vec!["cargo build --target x86_64-unknown-linux-gnu"]
        );
    }

    #[test]
    fn test_missing_config_key_substitutes_nothing() {
        let script = tokenize("#build(echo [${nothing}])", &ConfigEntries::new());
        assert_eq!(commands(&script, "build"), vec!["echo []"]);
    }

    #[test]
    fn test_first_config_entry_wins() {
        let config = parse_config("#mode(debug)#MODE(release)");
        let script = tokenize("#build(echo ${Mode})", &config);
        assert_eq!(commands(&script, "build"), vec!["echo debug"]);
    }

    #[test]
    fn test_substitution_not_rescanned() {
        let config = parse_config("#outer(${inner})#inner(deep)");
        let script = tokenize("#build(echo ${outer})", &config);
        assert_eq!(commands(&script, "build"), vec!["echo ${inner}"]);
    }

    #[test]
    fn test_key_whitespace_ignored() {
        let config = parse_config("#name(pearl)");
        let script = tokenize("#build(echo ${ name })", &config);
        assert_eq!(commands(&script, "build"), vec!["echo pearl"]);
    }

    #[test]
    fn test_second_dollar_aborts_reference() {
        let config = parse_config("#ab(X)");
        let script = tokenize("#build(echo $a$b)", &config);

        assert_eq!(commands(&script, "build"), vec!["echo b"]);
    }

    #[test]
    fn test_substitution_spanning_multiple_lines() {
        let config = parse_config("#steps(echo one\necho two)");
        let script = tokenize("#build(\n${steps}\necho three\n)", &config);

        assert_eq!(
            commands(&script, "build"),
            vec!["echo one", "echo two", "echo three"]
        );
    }

    #[test]
    fn test_unterminated_operation_dropped() {
        let script = tokenize("#build(echo A", &ConfigEntries::new());
        assert!(script.is_empty());
    }

    #[test]
    fn test_unterminated_name_dropped() {
        let script = tokenize("#build", &ConfigEntries::new());
        assert!(script.is_empty());
    }

    #[test]
    fn test_prefix_discards_dangling_operation() {
        let script = tokenize("#broken(echo lost\n#build(echo kept)", &ConfigEntries::new());

        assert_eq!(script.len(), 1);
        assert_eq!(script.operations()[0].name(), "build");
        assert_eq!(commands(&script, "build"), vec!["echo kept"]);
    }

    #[test]
    fn test_stray_parens_after_operation_make_nameless_operation() {
        let script = tokenize("#a(x)(echo stray)", &ConfigEntries::new());

        assert_eq!(script.names(), vec!["a", ""]);
        assert_eq!(commands(&script, ""), vec!["echo stray"]);
    }

    #[test]
    fn test_close_paren_outside_operation_closes_empty_operation() {
        let script = tokenize(") stray text\n#build(echo A)", &ConfigEntries::new());

        assert_eq!(script.names(), vec!["", "build"]);
        assert!(script.operations()[0].commands().is_empty());
        assert_eq!(commands(&script, "build"), vec!["echo A"]);
    }

    #[test]
    fn test_reference_outside_operation_starts_body() {
        let config = parse_config("#x(oops)");
        let script = tokenize("cost ${x} here)", &config);

        assert_eq!(script.len(), 1);
        assert_eq!(script.operations()[0].name(), "");
        assert_eq!(commands(&script, ""), vec!["oops here"]);
    }

    #[test]
    fn test_plain_text_outside_operations_ignored() {
        let script = tokenize("notes go here\n#build(echo A)\nmore notes", &ConfigEntries::new());

        assert_eq!(script.names(), vec!["build"]);
        assert_eq!(commands(&script, "build"), vec!["echo A"]);
    }

    #[test]
    fn test_only_spaces_dropped_from_names_and_keys() {
        let config = parse_config("#name(pearl)");
        let script = tokenize("#build\t(echo ${ name })#\ttest(echo ${\tname})", &config);

        assert_eq!(script.names(), vec!["build\t", "\ttest"]);
        assert_eq!(commands(&script, "build\t"), vec!["echo pearl"]);
        assert_eq!(commands(&script, "\ttest"), vec!["echo "]);
    }

    #[test]
    fn test_close_paren_ends_body() {
        let script = tokenize("#build(echo (nested))", &ConfigEntries::new());
        assert_eq!(commands(&script, "build"), vec!["echo nested"]);
    }

    #[test]
    fn test_duplicate_names_kept() {
        let script = tokenize("#pre(echo 1)#pre(echo 2)", &ConfigEntries::new());
        assert_eq!(script.len(), 2);
        assert_eq!(commands(&script, "pre"), vec!["echo 1", "echo 2"]);
    }

    #[test]
    fn test_custom_prefix() {
        let tokenizer = Tokenizer::new().with_prefix('@');
        let script = tokenizer.tokenize("@build(echo #1)", &ConfigEntries::new());

        assert_eq!(tokenizer.prefix(), '@');
        assert_eq!(commands(&script, "build"), vec!["echo #1"]);
    }

    #[test]
    fn test_state_not_shared_between_calls() {
        let tokenizer = Tokenizer::new();
        let first = tokenizer.tokenize("#build(echo A", &ConfigEntries::new());
        let second = tokenizer.tokenize("echo B)", &ConfigEntries::new());

        assert!(first.is_empty());
        assert_eq!(second.len(), 1);
        assert!(second.operations()[0].commands().is_empty());
    }
}
