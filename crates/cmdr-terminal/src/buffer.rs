//! Line buffer and the byte-at-a-time line state machine.
//!
//! The buffer holds at most `capacity - 1` bytes. Its contents survive a
//! [`LineBuffer::reset`] so the reload character can replay the previous
//! line; they are only wiped when a new line starts.

use cmdr_types::error::{CmdrError, Result};

/// Where the state machine is in assembling a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// Discarding bytes until a printable one starts a line.
    WaitingForStart,
    /// Appending bytes until the terminator arrives.
    Buffering,
    /// A complete line is waiting to be dispatched.
    Received,
}

/// Result of feeding one byte to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing to act on yet.
    Idle,
    /// A terminated line is ready for dispatch.
    Ready,
    /// The reload character replayed the previous line; it is ready again.
    Reload,
    /// The line outgrew the buffer and was dropped.
    Overflow,
}

/// Bytes with special meaning while a line is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMarkers {
    pub reload: u8,
    pub terminator: u8,
    pub strip_cr: bool,
}

/// `true` for bytes that may begin a command line (printable, not space).
pub fn is_command_start(byte: u8) -> bool {
    byte.is_ascii_graphic()
}

/// `true` for carriage return and line feed.
pub fn is_end_of_line(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Fixed-capacity line storage plus the state machine that fills it.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    /// Bytes written since the last reset.
    cursor: usize,
    full: bool,
    newline: bool,
    state: LineState,
}

impl LineBuffer {
    /// Create a buffer holding lines of up to `capacity - 1` bytes.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            full: false,
            newline: false,
            state: LineState::WaitingForStart,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Write position; never exceeds `capacity - 1`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// No bytes written since the last reset.
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// A write was refused because the buffer reached capacity.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// The terminator has been written.
    pub fn has_newline(&self) -> bool {
        self.newline
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    /// Current (or, after a reset, previous) line contents.
    pub fn line(&self) -> &[u8] {
        &self.bytes
    }

    /// Append one byte without any translation.
    ///
    /// Fails once `capacity - 1` bytes are held; the byte is dropped and the
    /// full flag set.
    pub fn push_raw(&mut self, byte: u8) -> Result<()> {
        if self.cursor >= self.capacity - 1 {
            self.full = true;
            return Err(CmdrError::BufferOverflow {
                capacity: self.capacity,
            });
        }
        self.bytes.push(byte);
        self.cursor += 1;
        Ok(())
    }

    /// Append one line byte, honouring CR stripping and noting the terminator.
    pub fn write(&mut self, byte: u8, markers: &LineMarkers) -> Result<()> {
        if self.full {
            return Err(CmdrError::BufferOverflow {
                capacity: self.capacity,
            });
        }
        if markers.strip_cr && byte == b'\r' && byte != markers.terminator {
            return Ok(());
        }
        self.push_raw(byte)?;
        if byte == markers.terminator {
            self.newline = true;
        }
        Ok(())
    }

    /// Return to `WaitingForStart` with an empty write position. The line
    /// contents are kept for a later reload.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.full = false;
        self.newline = false;
        self.state = LineState::WaitingForStart;
    }

    /// Reset and forget the previous line.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.reset();
    }

    /// Replace the contents with an injected line, terminating it if needed.
    pub fn load(&mut self, line: &[u8], terminator: u8) {
        self.bytes.clear();
        self.bytes.extend_from_slice(line);
        if !self.bytes.last().is_some_and(|&b| is_end_of_line(b)) {
            self.bytes.push(terminator);
        }
    }

    /// Terminate whatever is held so it can be dispatched as a line.
    pub fn append_terminator(&mut self, terminator: u8) {
        self.bytes.push(terminator);
        self.newline = true;
    }

    /// Drop the first `count` bytes of the held line.
    pub fn consume_front(&mut self, count: usize) {
        let count = count.min(self.bytes.len());
        self.bytes.drain(..count);
    }

    /// Feed one byte to the state machine.
    pub fn process(&mut self, byte: u8, markers: &LineMarkers) -> Step {
        match self.state {
            LineState::WaitingForStart => {
                if byte == markers.reload {
                    if self.bytes.is_empty() {
                        return Step::Idle;
                    }
                    self.newline = true;
                    self.state = LineState::Received;
                    return Step::Reload;
                }
                if is_command_start(byte) {
                    self.bytes.clear();
                    self.state = LineState::Buffering;
                    return self.buffer_byte(byte, markers);
                }
                Step::Idle
            },
            LineState::Buffering => self.buffer_byte(byte, markers),
            LineState::Received => Step::Idle,
        }
    }

    fn buffer_byte(&mut self, byte: u8, markers: &LineMarkers) -> Step {
        if self.write(byte, markers).is_err() {
            self.clear();
            return Step::Overflow;
        }
        if self.newline {
            self.state = LineState::Received;
            return Step::Ready;
        }
        Step::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKERS: LineMarkers = LineMarkers {
        reload: b'/',
        terminator: b'\n',
        strip_cr: true,
    };

    fn feed(buf: &mut LineBuffer, input: &[u8]) -> Vec<Step> {
        input.iter().map(|&b| buf.process(b, &MARKERS)).collect()
    }

    #[test]
    fn new_buffer_waits_for_start() {
        let buf = LineBuffer::new(16);
        assert_eq!(buf.state(), LineState::WaitingForStart);
        assert!(buf.is_empty());
        assert!(!buf.is_full());
        assert!(buf.line().is_empty());
    }

    #[test]
    fn assembles_a_line() {
        let mut buf = LineBuffer::new(16);
        let steps = feed(&mut buf, b"led on\n");
        assert_eq!(steps.last(), Some(&Step::Ready));
        assert!(steps[..steps.len() - 1].iter().all(|s| *s == Step::Idle));
        assert_eq!(buf.line(), b"led on\n");
        assert_eq!(buf.state(), LineState::Received);
        assert!(buf.has_newline());
    }

    #[test]
    fn leading_noise_is_discarded() {
        let mut buf = LineBuffer::new(16);
        feed(&mut buf, b"\r\n  \x01go\n");
        assert_eq!(buf.line(), b"go\n");
    }

    #[test]
    fn carriage_returns_stripped() {
        let mut buf = LineBuffer::new(16);
        feed(&mut buf, b"go\r\n");
        assert_eq!(buf.line(), b"go\n");
    }

    #[test]
    fn carriage_returns_kept_when_not_stripping() {
        let mut buf = LineBuffer::new(16);
        let markers = LineMarkers {
            strip_cr: false,
            ..MARKERS
        };
        for &b in b"go\r\n" {
            buf.process(b, &markers);
        }
        assert_eq!(buf.line(), b"go\r\n");
    }

    #[test]
    fn received_ignores_stray_bytes() {
        let mut buf = LineBuffer::new(16);
        feed(&mut buf, b"a\n");
        assert_eq!(feed(&mut buf, b"\nzz"), vec![Step::Idle; 3]);
        assert_eq!(buf.line(), b"a\n");
    }

    #[test]
    fn reset_keeps_line_for_reload() {
        let mut buf = LineBuffer::new(16);
        feed(&mut buf, b"ping\n");
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.state(), LineState::WaitingForStart);
        assert_eq!(buf.process(b'/', &MARKERS), Step::Reload);
        assert_eq!(buf.state(), LineState::Received);
        assert_eq!(buf.line(), b"ping\n");
    }

    #[test]
    fn reload_without_previous_line_is_noop() {
        let mut buf = LineBuffer::new(16);
        assert_eq!(buf.process(b'/', &MARKERS), Step::Idle);
        assert_eq!(buf.state(), LineState::WaitingForStart);
    }

    #[test]
    fn reload_char_inside_line_is_data() {
        let mut buf = LineBuffer::new(16);
        feed(&mut buf, b"a/b\n");
        assert_eq!(buf.line(), b"a/b\n");
    }

    #[test]
    fn overflow_drops_partial_line() {
        let mut buf = LineBuffer::new(4);
        let steps = feed(&mut buf, b"abcd");
        assert_eq!(steps, vec![Step::Idle, Step::Idle, Step::Idle, Step::Overflow]);
        assert_eq!(buf.state(), LineState::WaitingForStart);
        assert!(buf.line().is_empty());
        // Next line is unaffected.
        feed(&mut buf, b"\nok\n");
        assert_eq!(buf.line(), b"ok\n");
        assert_eq!(buf.state(), LineState::Received);
    }

    #[test]
    fn write_sets_full_flag_at_capacity() {
        let mut buf = LineBuffer::new(3);
        buf.write(b'a', &MARKERS).unwrap();
        buf.write(b'b', &MARKERS).unwrap();
        let err = buf.write(b'c', &MARKERS).unwrap_err();
        assert!(matches!(err, CmdrError::BufferOverflow { capacity: 3 }));
        assert!(buf.is_full());
        assert_eq!(buf.cursor(), 2);
        // Stays full until reset.
        assert!(buf.write(b'd', &MARKERS).is_err());
        buf.reset();
        assert!(!buf.is_full());
    }

    #[test]
    fn line_of_capacity_minus_one_fits() {
        let mut buf = LineBuffer::new(5);
        let steps = feed(&mut buf, b"abc\n");
        assert_eq!(steps.last(), Some(&Step::Ready));
    }

    #[test]
    fn load_appends_terminator() {
        let mut buf = LineBuffer::new(16);
        buf.load(b"status", b'\n');
        assert_eq!(buf.line(), b"status\n");
        buf.load(b"status\r", b'\n');
        assert_eq!(buf.line(), b"status\r");
    }

    #[test]
    fn consume_front_strips_command() {
        let mut buf = LineBuffer::new(16);
        buf.load(b"menu led on\n", b'\n');
        buf.consume_front(5);
        assert_eq!(buf.line(), b"led on\n");
        buf.consume_front(100);
        assert!(buf.line().is_empty());
    }

    #[test]
    fn carriage_return_terminator_is_not_stripped() {
        let mut buf = LineBuffer::new(16);
        let markers = LineMarkers {
            terminator: b'\r',
            ..MARKERS
        };
        let steps: Vec<Step> = b"go\r".iter().map(|&b| buf.process(b, &markers)).collect();
        assert_eq!(steps.last(), Some(&Step::Ready));
        assert_eq!(buf.line(), b"go\r");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn write_then_reset_leaves_buffer_empty(line in "[a-z][a-z0-9 ]{0,20}") {
                let mut buf = LineBuffer::new(32);
                let mut input = line.clone().into_bytes();
                input.push(b'\n');
                let mut ready = false;
                for &b in &input {
                    ready |= buf.process(b, &MARKERS) == Step::Ready;
                }
                prop_assert!(ready);
                buf.reset();
                prop_assert!(buf.is_empty());
                prop_assert_eq!(buf.state(), LineState::WaitingForStart);
            }

            #[test]
            fn cursor_never_exceeds_capacity(
                cap in 2usize..32,
                data in proptest::collection::vec(any::<u8>(), 0..128),
            ) {
                let mut buf = LineBuffer::new(cap);
                for &b in &data {
                    buf.process(b, &MARKERS);
                    prop_assert!(buf.cursor() <= cap - 1);
                    prop_assert!(buf.line().len() <= cap - 1);
                }
            }

            #[test]
            fn overflow_never_corrupts_next_line(extra in 1usize..40) {
                let cap = 8;
                let mut buf = LineBuffer::new(cap);
                let long = vec![b'x'; cap + extra];
                for &b in &long {
                    buf.process(b, &MARKERS);
                }
                buf.process(b'\n', &MARKERS);
                buf.reset();
                let mut last = Step::Idle;
                for &b in b"ok\n" {
                    last = buf.process(b, &MARKERS);
                }
                prop_assert_eq!(last, Step::Ready);
                prop_assert_eq!(buf.line(), b"ok\n");
            }
        }
    }
}
