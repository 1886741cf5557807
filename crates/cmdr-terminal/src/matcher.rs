//! Line classification: comment, registered command, number, internal
//! administrative command, or unknown.
//!
//! Registered commands are matched by longest prefix, and only when the byte
//! after the command name is a boundary (space, end of line, the alternate
//! end-of-command character) or the name itself ends in a space. Without the
//! boundary check `st` would fire on `status`.

use crate::buffer::is_end_of_line;
use crate::table::{CommandIndex, CommandTable};

/// Built-in administrative commands, recognised by line prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalCommand {
    Unlock,
    Lock,
    Help,
    Status,
    Echo,
    EchoAux,
    Enable,
    Errors,
}

impl InternalCommand {
    /// Every internal command, in help-listing order.
    pub const ALL: [InternalCommand; 8] = [
        Self::Unlock,
        Self::Lock,
        Self::Help,
        Self::Status,
        Self::Echo,
        Self::EchoAux,
        Self::Enable,
        Self::Errors,
    ];

    /// The (case-sensitive) text that selects this command.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unlock => "U",
            Self::Lock => "X",
            Self::Help => "help",
            Self::Status => "?",
            Self::Echo => "echo",
            Self::EchoAux => "echo aux",
            Self::Enable => "enable",
            Self::Errors => "errors",
        }
    }

    /// Takes an `on`/`off` argument.
    pub fn is_toggle(self) -> bool {
        matches!(self, Self::Echo | Self::EchoAux | Self::Enable | Self::Errors)
    }

    /// Longest internal name the line starts with.
    pub fn from_line(line: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|cmd| line.starts_with(cmd.name().as_bytes()))
            .max_by_key(|cmd| cmd.name().len())
    }
}

/// How a completed line should be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    Comment,
    Internal(InternalCommand),
    /// Numeric line for the fallback handler.
    Custom,
    Unknown,
    /// Index into the attached command table.
    Matched(usize),
}

/// Marker bytes that affect classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRules {
    pub comment: u8,
    pub end_of_command: u8,
}

/// Starts with a digit, or a minus sign followed by a digit.
pub fn is_number(line: &[u8]) -> bool {
    match line {
        [first, ..] if first.is_ascii_digit() => true,
        [b'-', second, ..] => second.is_ascii_digit(),
        _ => false,
    }
}

/// `line` starts with `name` and the name is properly delimited.
pub fn command_fits(line: &[u8], name: &[u8], end_of_command: u8) -> bool {
    if name.is_empty() || !line.starts_with(name) {
        return false;
    }
    if name.ends_with(b" ") {
        return true;
    }
    match line.get(name.len()) {
        None => true,
        Some(&b) => b == b' ' || is_end_of_line(b) || b == end_of_command,
    }
}

/// Longest registered command that fits the line. Ties go to the entry
/// registered first.
pub fn find_command(
    line: &[u8],
    table: &CommandTable,
    index: &CommandIndex,
    end_of_command: u8,
) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, entry) in table.iter().enumerate() {
        let len = index.length(i);
        let longest_so_far = best.map_or(0, |(_, l)| l);
        if len > longest_so_far && command_fits(line, entry.name().as_bytes(), end_of_command) {
            best = Some((i, len));
        }
    }
    best.map(|(i, _)| i)
}

/// Classify a completed line.
///
/// Registered commands take precedence over numbers and internal commands,
/// so an embedder can override `help` or `?`.
pub fn classify(
    line: &[u8],
    table: &CommandTable,
    index: &CommandIndex,
    rules: &MatchRules,
) -> Classified {
    if line.first() == Some(&rules.comment) {
        return Classified::Comment;
    }
    if let Some(i) = find_command(line, table, index, rules.end_of_command) {
        return Classified::Matched(i);
    }
    if is_number(line) {
        return Classified::Custom;
    }
    match InternalCommand::from_line(line) {
        Some(cmd) => Classified::Internal(cmd),
        None => Classified::Unknown,
    }
}
