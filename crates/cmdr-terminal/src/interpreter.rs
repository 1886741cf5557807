//! The interpreter: poll loop, lock gate, classification and dispatch.
//!
//! A [`Commander`] is driven by repeated calls to [`Commander::update`]. Each
//! call drains the bytes currently available on the input stream, assembles
//! at most one line, dispatches it, resets the buffer and reprints the
//! prompt. Nothing blocks and nothing runs re-entrantly: a handler finishes
//! before the next byte is read.

use std::borrow::Cow;
use std::rc::Rc;

use cmdr_types::config::{CommanderConfig, FormatConfig, PortSettings};
use cmdr_types::error::{CmdrError, Result};

use crate::buffer::{LineBuffer, LineMarkers, LineState, Step, is_end_of_line};
use crate::context::Context;
use crate::lock::LockGate;
use crate::matcher::{Classified, MatchRules, classify};
use crate::numeric::ParserCursor;
use crate::ports::Ports;
use crate::table::{CommandIndex, CommandTable, Handler, Outcome};

/// Why a line is waiting for the next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// Loaded by the embedder; processed without a prompt.
    Injected,
    /// Payload forwarded to a newly attached command table.
    Transferred,
}

/// Line-oriented command interpreter.
pub struct Commander {
    pub(crate) name: String,
    pub(crate) prompt_char: char,
    pub(crate) reload: u8,
    pub(crate) terminator: u8,
    pub(crate) eof: u8,
    pub(crate) rules: MatchRules,
    pub(crate) unlock_message: String,
    pub(crate) lock_message: String,
    pub(crate) settings: PortSettings,
    pub(crate) lock: LockGate,
    pub(crate) format: FormatConfig,
    pub(crate) buffer: LineBuffer,
    pub(crate) cursor: ParserCursor,
    /// End of the most recently matched command; outlives the line.
    pub(crate) command_end: usize,
    /// Where the payload of the last matched command begins.
    payload_start: usize,
    pub(crate) table: Rc<CommandTable>,
    pub(crate) index: CommandIndex,
    pub(crate) fallback: Option<Rc<dyn Handler>>,
    pending: Option<Pending>,
    handled: bool,
    pub(crate) quick_help: bool,
    pub(crate) streaming: bool,
    suppress_prompt: bool,
    pub(crate) forward_payload: bool,
}

impl Commander {
    /// Interpreter with the default configuration and an empty table.
    pub fn new() -> Self {
        Self::from_valid(&CommanderConfig::default())
    }

    /// Interpreter built from a validated configuration.
    pub fn with_config(config: &CommanderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: &CommanderConfig) -> Self {
        Self {
            name: config.name.clone(),
            prompt_char: config.prompt_char,
            reload: ascii(config.reload_char),
            terminator: ascii(config.end_of_line),
            eof: ascii(config.eof_char),
            rules: MatchRules {
                comment: ascii(config.comment_char),
                end_of_command: ascii(config.end_of_command_char),
            },
            unlock_message: config.unlock_message.clone(),
            lock_message: config.lock_message.clone(),
            settings: config.settings,
            lock: LockGate::from_config(&config.lock),
            format: config.format.clone(),
            buffer: LineBuffer::new(config.buffer_size),
            cursor: ParserCursor::default(),
            command_end: 0,
            payload_start: 0,
            table: Rc::new(CommandTable::new()),
            index: CommandIndex::default(),
            fallback: None,
            pending: None,
            handled: false,
            quick_help: false,
            streaming: false,
            suppress_prompt: false,
            forward_payload: false,
        }
    }

    // -- Command table and fallback --

    /// Attach a command table, rebuilding the length index.
    pub fn attach_commands(&mut self, table: Rc<CommandTable>) {
        self.index = CommandIndex::build(&table);
        self.table = table;
        log::debug!(
            "{}: attached {} commands (longest {})",
            self.name,
            self.table.len(),
            self.index.longest()
        );
    }

    pub fn commands(&self) -> &Rc<CommandTable> {
        &self.table
    }

    /// Set the handler for numeric lines and passthrough data.
    pub fn set_fallback<F>(&mut self, handler: F)
    where
        F: Fn(&mut Context<'_, '_>) -> Result<Outcome> + 'static,
    {
        self.fallback = Some(Rc::new(handler));
    }

    pub fn set_fallback_handler(&mut self, handler: Rc<dyn Handler>) {
        self.fallback = Some(handler);
    }

    pub fn clear_fallback(&mut self) {
        self.fallback = None;
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    // -- Configuration surface --

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_prompt_char(&mut self, ch: char) {
        self.prompt_char = ch;
    }

    pub fn settings(&self) -> &PortSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PortSettings {
        &mut self.settings
    }

    /// Replace the line buffer with one of a new capacity. Any held line is
    /// discarded.
    pub fn set_buffer_size(&mut self, capacity: usize) -> Result<()> {
        if capacity < 2 {
            return Err(CmdrError::Config(format!(
                "buffer size must be at least 2, got {capacity}"
            )));
        }
        self.buffer = LineBuffer::new(capacity);
        Ok(())
    }

    pub fn set_comment_char(&mut self, byte: u8) {
        self.rules.comment = byte;
    }

    pub fn set_end_of_command_char(&mut self, byte: u8) {
        self.rules.end_of_command = byte;
    }

    pub fn set_reload_char(&mut self, byte: u8) {
        self.reload = byte;
    }

    pub fn set_end_of_line(&mut self, byte: u8) {
        self.terminator = byte;
    }

    pub fn set_eof_char(&mut self, byte: u8) {
        self.eof = byte;
    }

    pub fn set_unlock_message(&mut self, message: impl Into<String>) {
        self.unlock_message = message.into();
    }

    pub fn set_lock_message(&mut self, message: impl Into<String>) {
        self.lock_message = message.into();
    }

    pub fn set_format(&mut self, format: FormatConfig) {
        self.format = format;
    }

    // -- Lock --

    pub fn lock(&mut self) {
        self.lock.lock();
    }

    pub fn unlock(&mut self) {
        self.lock.unlock();
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn set_hard_lock(&mut self, hard: bool) {
        self.lock.set_hard(hard);
    }

    pub fn set_passphrase(&mut self, passphrase: Option<String>) {
        self.lock.set_passphrase(passphrase);
    }

    pub fn lock_gate(&self) -> &LockGate {
        &self.lock
    }

    // -- State --

    /// Outcome of the most recent dispatch.
    pub fn handled(&self) -> bool {
        self.handled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn line_state(&self) -> LineState {
        self.buffer.state()
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// Current (or last) line.
    pub fn line(&self) -> &[u8] {
        self.buffer.line()
    }

    /// Bytes following the last matched command and its boundary byte.
    pub fn payload(&self) -> &[u8] {
        self.buffer.line().get(self.payload_start..).unwrap_or(&[])
    }

    /// Something other than line terminators follows the last matched command.
    pub fn has_payload(&self) -> bool {
        !trim_end_of_line(self.payload()).is_empty()
    }

    /// Switch to passthrough: bytes go to the fallback handler until the EOF
    /// byte arrives.
    pub fn start_stream(&mut self) {
        log::debug!("{}: passthrough started", self.name);
        self.streaming = true;
    }

    pub fn stop_stream(&mut self) {
        self.streaming = false;
    }

    /// Allow prompts again after injected lines in multi-commander mode.
    pub fn resume_prompt(&mut self) {
        self.suppress_prompt = false;
    }

    // -- Poll loop --

    /// Process whatever input is available.
    ///
    /// Returns `true` while unread bytes or a pending line remain, so the
    /// embedder can poll again straight away.
    pub fn update(&mut self, ports: &mut Ports<'_>) -> bool {
        if self.streaming {
            self.update_stream(ports);
            return self.more_work(ports);
        }
        if self.pending.is_some() {
            self.run_pending(ports);
            return self.more_work(ports);
        }

        self.handled = false;
        if !self.settings.parser_enabled {
            if self.settings.echo_aux {
                ports.bridge();
            }
            return self.more_work(ports);
        }

        let markers = self.markers();
        let mut ready = false;
        while let Some(byte) = ports.read() {
            self.echo(ports, byte);
            match self.buffer.process(byte, &markers) {
                Step::Idle => {},
                Step::Ready => {
                    ready = true;
                    break;
                },
                Step::Reload => {
                    ports.output().write_all(self.buffer.line());
                    ready = true;
                    break;
                },
                Step::Overflow => self.report_overflow(ports),
            }
        }
        if self.settings.echo_aux && !self.lock.is_locked() {
            ports.drain_aux_to_output();
        }
        if ready {
            self.handled = self.handle_line(ports);
        }
        ports.flush();
        self.more_work(ports)
    }

    /// Process a line queued by [`Commander::load_string`] or a transfer.
    pub fn update_pending(&mut self, ports: &mut Ports<'_>) -> bool {
        if self.pending.is_some() {
            self.run_pending(ports);
        }
        self.more_work(ports)
    }

    fn more_work(&self, ports: &Ports<'_>) -> bool {
        ports.available() > 0 || self.pending.is_some()
    }

    fn run_pending(&mut self, ports: &mut Ports<'_>) {
        let Some(kind) = self.pending.take() else {
            return;
        };
        match kind {
            Pending::Injected => self.handled = self.handle_injected(ports),
            Pending::Transferred => self.handled = self.handle_line(ports),
        }
        ports.flush();
    }

    // -- Programmatic input --

    /// Dispatch `line` immediately, bypassing the input stream. No prompt is
    /// printed. Returns whether the line was handled.
    pub fn feed_string(&mut self, line: &str, ports: &mut Ports<'_>) -> bool {
        self.feed_bytes(line.as_bytes(), ports)
    }

    pub fn feed_bytes(&mut self, line: &[u8], ports: &mut Ports<'_>) -> bool {
        self.buffer.load(line, self.terminator);
        self.handled = self.handle_injected(ports);
        ports.flush();
        self.handled
    }

    /// Dispatch the payload of another interpreter's last command.
    pub fn feed_from(&mut self, other: &Commander, ports: &mut Ports<'_>) -> bool {
        let payload = other.payload().to_vec();
        self.feed_bytes(&payload, ports)
    }

    /// Queue `line` for the next poll.
    pub fn load_string(&mut self, line: &str) {
        self.buffer.load(line.as_bytes(), self.terminator);
        self.pending = Some(Pending::Injected);
    }

    /// Terminate whatever is buffered and dispatch it (e.g. the last line of
    /// a file that lacks a trailing newline).
    pub fn end_line(&mut self, ports: &mut Ports<'_>) -> bool {
        self.buffer.append_terminator(self.terminator);
        self.handled = self.handle_line(ports);
        ports.flush();
        self.handled
    }

    fn handle_injected(&mut self, ports: &mut Ports<'_>) -> bool {
        self.suppress_prompt = true;
        let handled = self.handle_line(ports);
        if !self.settings.multi_commander {
            self.suppress_prompt = false;
        }
        handled
    }

    // -- Dispatch --

    fn markers(&self) -> LineMarkers {
        LineMarkers {
            reload: self.reload,
            terminator: self.terminator,
            strip_cr: self.settings.strip_cr,
        }
    }

    fn prompt_visible(&self) -> bool {
        self.settings.prompt_enabled && !self.suppress_prompt
    }

    /// Print the interpreter name and prompt character, if enabled.
    pub fn print_prompt(&self, ports: &mut Ports<'_>) {
        if self.prompt_visible() {
            ports.print(&format!("{}{}", self.name, self.prompt_char));
        }
    }

    fn echo(&self, ports: &mut Ports<'_>, byte: u8) {
        let open = !self.lock.is_locked();
        ports.echo(
            byte,
            open && self.settings.echo_terminal,
            open && self.settings.echo_aux,
        );
    }

    /// Run one completed line through the lock gate and dispatcher, then
    /// reset for the next line.
    fn handle_line(&mut self, ports: &mut Ports<'_>) -> bool {
        if self.lock.blocks_all() {
            let unlocked = self.lock.try_unlock(self.buffer.line());
            self.finish_line();
            if unlocked {
                log::info!("{}: unlocked", self.name);
                ports.println(&self.unlock_message);
                self.print_prompt(ports);
            }
            return false;
        }

        if self.prompt_visible() && !self.settings.echo_terminal {
            ports.write(b'\n');
        }

        debug_assert!(self.index.covers(&self.table), "command index out of date");
        let class = classify(self.buffer.line(), &self.table, &self.index, &self.rules);
        let handled = match class {
            Classified::Comment => {
                if self.settings.print_comments {
                    ports.output().write_all(self.buffer.line());
                }
                false
            },
            Classified::Internal(cmd) => {
                self.run_internal(cmd, ports);
                false
            },
            Classified::Unknown => {
                self.report_unknown(ports);
                false
            },
            Classified::Custom => self.lock.permits_dispatch() && self.dispatch_fallback(ports),
            Classified::Matched(i) => self.lock.permits_dispatch() && self.dispatch_matched(i, ports),
        };

        let forwarded = self.queue_forwarded_payload();
        self.finish_line();
        if !forwarded {
            self.print_prompt(ports);
        }
        handled
    }

    fn dispatch_matched(&mut self, index: usize, ports: &mut Ports<'_>) -> bool {
        let table = Rc::clone(&self.table);
        let Some(entry) = table.get(index) else {
            return false;
        };
        self.command_end = self.index.length(index);
        // A name ending in a space already contains its boundary byte.
        self.payload_start = if entry.name().ends_with(' ') {
            self.command_end
        } else {
            self.command_end + 1
        };
        self.cursor = ParserCursor::at(self.command_end);
        log::debug!("{}: dispatching '{}'", self.name, entry.name());
        let result = entry.handler().handle(&mut Context::new(self, ports));
        match result {
            Ok(outcome) => outcome == Outcome::Handled,
            Err(e) => {
                self.report_error(entry.name(), &e, ports);
                false
            },
        }
    }

    fn dispatch_fallback(&mut self, ports: &mut Ports<'_>) -> bool {
        let Some(handler) = self.fallback.as_ref().map(Rc::clone) else {
            self.report_unknown(ports);
            return false;
        };
        self.command_end = 0;
        self.payload_start = 1;
        self.cursor = ParserCursor::at(0);
        match handler.handle(&mut Context::new(self, ports)) {
            Ok(Outcome::Handled) => true,
            Ok(Outcome::NotHandled) => {
                self.report_unknown(ports);
                false
            },
            Err(e) => {
                self.report_error("fallback", &e, ports);
                false
            },
        }
    }

    /// After a transfer, strip the command and queue the rest of the line
    /// for the new table.
    fn queue_forwarded_payload(&mut self) -> bool {
        if !std::mem::take(&mut self.forward_payload) || !self.has_payload() {
            return false;
        }
        self.buffer.consume_front(self.payload_start);
        self.pending = Some(Pending::Transferred);
        true
    }

    fn finish_line(&mut self) {
        self.buffer.reset();
        self.cursor = ParserCursor::default();
        self.quick_help = false;
    }

    // -- Passthrough --

    fn update_stream(&mut self, ports: &mut Ports<'_>) {
        self.buffer.clear();
        while let Some(byte) = ports.read() {
            if byte == self.eof {
                log::debug!("{}: end of passthrough", self.name);
                self.streaming = false;
                while matches!(ports.peek(), Some(b) if is_end_of_line(b)) {
                    ports.read();
                }
                self.handled = self.deliver_stream(ports);
                self.buffer.clear();
                self.print_prompt(ports);
                ports.flush();
                return;
            }
            if self.buffer.push_raw(byte).is_err() {
                self.report_overflow(ports);
            }
            self.echo(ports, byte);
            if self.buffer.cursor() + 1 >= self.buffer.capacity() || ports.available() == 0 {
                log::debug!(
                    "{}: delivering {} passthrough bytes",
                    self.name,
                    self.buffer.cursor()
                );
                self.handled = self.deliver_stream(ports);
                self.buffer.clear();
                ports.flush();
                return;
            }
        }
    }

    fn deliver_stream(&mut self, ports: &mut Ports<'_>) -> bool {
        let Some(handler) = self.fallback.as_ref().map(Rc::clone) else {
            log::warn!("{}: passthrough data with no fallback handler", self.name);
            return false;
        };
        self.command_end = 0;
        self.payload_start = 1;
        self.cursor = ParserCursor::at(0);
        match handler.handle(&mut Context::new(self, ports)) {
            Ok(outcome) => outcome == Outcome::Handled,
            Err(e) => {
                self.report_error("passthrough", &e, ports);
                false
            },
        }
    }

    // -- Diagnostics --

    fn report_overflow(&self, ports: &mut Ports<'_>) {
        log::warn!(
            "{}: line exceeded {} byte buffer, dropped",
            self.name,
            self.buffer.capacity()
        );
        if self.settings.error_messages {
            ports.println("ERR: Buffer Overflow");
        }
    }

    fn report_unknown(&self, ports: &mut Ports<'_>) {
        let line = line_text(self.buffer.line());
        log::debug!("{}: unknown command '{line}'", self.name);
        if self.settings.error_messages {
            ports.println(&format!("Command: '{line}' not recognised"));
        }
    }

    fn report_error(&self, what: &str, err: &CmdrError, ports: &mut Ports<'_>) {
        log::warn!("{}: {what} failed: {err}", self.name);
        if self.settings.error_messages {
            ports.println(&format!("ERR: {err}"));
        }
    }
}

impl Default for Commander {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated configuration characters are ASCII.
fn ascii(ch: char) -> u8 {
    u8::try_from(ch).unwrap_or(b'?')
}

/// Strip trailing CR/LF bytes.
pub(crate) fn trim_end_of_line(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| !is_end_of_line(b))
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

/// A line as text, without its terminator.
pub(crate) fn line_text(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(trim_end_of_line(bytes))
}
