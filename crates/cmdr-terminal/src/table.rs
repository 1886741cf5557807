//! Command table supplied by the embedder, and the length index derived
//! from it.

use std::fmt;

use cmdr_types::error::Result;

use crate::context::Context;

/// What a handler did with the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The line was acted on.
    Handled,
    /// The handler declined the line. For the fallback handler this makes the
    /// line an unknown command.
    NotHandled,
}

/// Something that can act on a dispatched line.
pub trait Handler {
    fn handle(&self, ctx: &mut Context<'_, '_>) -> Result<Outcome>;
}

impl<F> Handler for F
where
    F: Fn(&mut Context<'_, '_>) -> Result<Outcome>,
{
    fn handle(&self, ctx: &mut Context<'_, '_>) -> Result<Outcome> {
        self(ctx)
    }
}

/// One registered command.
pub struct CommandEntry {
    name: String,
    help: String,
    handler: Box<dyn Handler>,
}

impl CommandEntry {
    /// Register a closure or function as a command.
    pub fn new<F>(name: impl Into<String>, help: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Context<'_, '_>) -> Result<Outcome> + 'static,
    {
        Self::with_handler(name, help, Box::new(handler))
    }

    /// Register a boxed handler (e.g. a struct implementing [`Handler`]).
    pub fn with_handler(
        name: impl Into<String>,
        help: impl Into<String>,
        handler: Box<dyn Handler>,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            handler,
        }
    }

    /// The command string matched against the start of a line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description for `help`.
    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

/// Ordered list of commands. Never mutated by the interpreter.
#[derive(Debug, Default)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn command<F>(mut self, name: &str, help: &str, handler: F) -> Self
    where
        F: Fn(&mut Context<'_, '_>) -> Result<Outcome> + 'static,
    {
        self.entries.push(CommandEntry::new(name, help, handler));
        self
    }

    pub fn push(&mut self, entry: CommandEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CommandEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }
}

impl FromIterator<CommandEntry> for CommandTable {
    fn from_iter<I: IntoIterator<Item = CommandEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Byte length of every command string, plus the longest.
///
/// Rebuilt whenever a table is attached so matching never reads lengths
/// belonging to a different table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandIndex {
    lengths: Vec<usize>,
    longest: usize,
}

impl CommandIndex {
    pub fn build(table: &CommandTable) -> Self {
        let lengths: Vec<usize> = table.iter().map(|e| e.name().len()).collect();
        let longest = lengths.iter().copied().max().unwrap_or(0);
        Self { lengths, longest }
    }

    /// Length of entry `index`, or 0 when out of range.
    pub fn length(&self, index: usize) -> usize {
        self.lengths.get(index).copied().unwrap_or(0)
    }

    pub fn longest(&self) -> usize {
        self.longest
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// The index was built from a table of this shape.
    pub fn covers(&self, table: &CommandTable) -> bool {
        self.lengths.len() == table.len()
            && table
                .iter()
                .zip(&self.lengths)
                .all(|(e, &len)| e.name().len() == len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_ctx: &mut Context<'_, '_>) -> Result<Outcome> {
        Ok(Outcome::Handled)
    }

    fn sample() -> CommandTable {
        CommandTable::new()
            .command("st", "short status", noop)
            .command("status", "full status", noop)
            .command("led ", "set the led", noop)
    }

    #[test]
    fn builder_keeps_order() {
        let table = sample();
        assert_eq!(table.len(), 3);
        let names: Vec<&str> = table.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["st", "status", "led "]);
        assert_eq!(table.get(1).unwrap().help(), "full status");
        assert!(table.get(3).is_none());
    }

    #[test]
    fn index_lengths_and_longest() {
        let table = sample();
        let index = CommandIndex::build(&table);
        assert_eq!(index.len(), 3);
        assert_eq!(index.length(0), 2);
        assert_eq!(index.length(1), 6);
        assert_eq!(index.length(2), 4);
        assert_eq!(index.length(9), 0);
        assert_eq!(index.longest(), 6);
        assert!(index.covers(&table));
    }

    #[test]
    fn index_of_empty_table() {
        let index = CommandIndex::build(&CommandTable::new());
        assert!(index.is_empty());
        assert_eq!(index.longest(), 0);
    }

    #[test]
    fn stale_index_detected() {
        let index = CommandIndex::build(&sample());
        let other = CommandTable::new().command("go", "", noop);
        assert!(!index.covers(&other));
    }

    #[test]
    fn from_iterator_collects_entries() {
        let table: CommandTable = ["a", "bb"]
            .into_iter()
            .map(|n| CommandEntry::new(n, "", noop))
            .collect();
        assert_eq!(table.len(), 2);
        assert!(format!("{:?}", table.get(0).unwrap()).contains("\"a\""));
    }
}
