//! Incremental numeric token parser.
//!
//! A handler pulls successive numbers out of its line through a
//! [`ParserCursor`]. Each extraction finds the next numeral at or after the
//! cursor, parses the leading number there, then moves the cursor to the
//! next delimiter so the following call sees the next token. Once no numeral
//! remains the cursor is exhausted and every further call fails.

use crate::buffer::is_end_of_line;
use crate::matcher::is_number;

/// A number type that can be read from the front of a byte slice.
pub trait Numeral: Sized + Copy {
    /// Parse the number at the start of `bytes`, ignoring whatever follows.
    fn parse_leading(bytes: &[u8]) -> Option<Self>;
}

/// Length of `-?[0-9]+` at the start of `bytes`, or 0.
fn int_span(bytes: &[u8]) -> usize {
    let sign = usize::from(bytes.first() == Some(&b'-'));
    let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 { 0 } else { sign + digits }
}

/// Length of `-?[0-9]+(\.[0-9]*)?` at the start of `bytes`, or 0.
fn float_span(bytes: &[u8]) -> usize {
    let int = int_span(bytes);
    if int == 0 {
        return 0;
    }
    if bytes.get(int) != Some(&b'.') {
        return int;
    }
    let frac = bytes[int + 1..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    int + 1 + frac
}

fn parse_span<T: std::str::FromStr>(bytes: &[u8], span: usize) -> Option<T> {
    if span == 0 {
        return None;
    }
    std::str::from_utf8(&bytes[..span]).ok()?.parse().ok()
}

macro_rules! int_numeral {
    ($($t:ty),*) => {$(
        impl Numeral for $t {
            fn parse_leading(bytes: &[u8]) -> Option<Self> {
                parse_span(bytes, int_span(bytes))
            }
        }
    )*};
}

macro_rules! float_numeral {
    ($($t:ty),*) => {$(
        impl Numeral for $t {
            fn parse_leading(bytes: &[u8]) -> Option<Self> {
                parse_span(bytes, float_span(bytes))
            }
        }
    )*};
}

int_numeral!(i32, i64);
float_numeral!(f32, f64);

/// A byte that ends a numeric token: anything except a digit, `.`, `-`,
/// an end-of-line byte or NUL.
pub fn is_delimiter(byte: u8) -> bool {
    !(byte.is_ascii_digit() || byte == b'.' || byte == b'-' || is_end_of_line(byte) || byte == 0)
}

/// Index of the first number start at or after `from`, stopping at the
/// line terminator.
pub fn find_numeral(line: &[u8], from: usize, terminator: u8) -> Option<usize> {
    let tail = line.get(from..)?;
    for (i, &b) in tail.iter().enumerate() {
        if b == terminator || is_end_of_line(b) {
            return None;
        }
        if is_number(&tail[i..]) {
            return Some(from + i);
        }
    }
    None
}

/// Index of the first delimiter at or after `from`.
pub fn next_delimiter(line: &[u8], from: usize) -> Option<usize> {
    line.get(from..)?
        .iter()
        .position(|&b| is_delimiter(b))
        .map(|i| from + i)
}

/// Read position into the current line for argument extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserCursor {
    /// `None` once the line has no more numerals.
    pos: Option<usize>,
    /// End of the matched command; the cursor never reads before it.
    command_end: usize,
}

impl ParserCursor {
    /// Cursor positioned just past a matched command of `command_end` bytes.
    pub fn at(command_end: usize) -> Self {
        Self {
            pos: Some(command_end),
            command_end,
        }
    }

    pub fn position(&self) -> Option<usize> {
        self.pos
    }

    pub fn command_end(&self) -> usize {
        self.command_end
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos.is_none()
    }

    /// Move to the next numeral. Fails, exhausting the cursor, when the
    /// terminator comes first.
    pub fn advance_to_numeral(&mut self, line: &[u8], terminator: u8) -> bool {
        let Some(pos) = self.pos else {
            return false;
        };
        if pos < self.command_end {
            return false;
        }
        self.pos = find_numeral(line, pos, terminator);
        self.pos.is_some()
    }

    /// Extract the next number token. The cursor moves past the token even
    /// when it does not fit `T`, so repeated calls always make progress.
    pub fn extract<T: Numeral>(&mut self, line: &[u8], terminator: u8) -> Option<T> {
        if !self.advance_to_numeral(line, terminator) {
            return None;
        }
        let start = self.pos?;
        let value = T::parse_leading(&line[start..]);
        self.pos = next_delimiter(line, start);
        value
    }
}

/// First index of `needle` in `haystack`.
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Value of a `name value` quick option anywhere in the line.
///
/// The value must start one byte after the name (`speed 10`, `speed=10`).
pub fn quick_value<T: Numeral>(line: &[u8], name: &str) -> Option<T> {
    let at = find_bytes(line, name.as_bytes())?;
    let rest = line.get(at + name.len() + 1..)?;
    if !is_number(rest) {
        return None;
    }
    T::parse_leading(rest)
}
