//! What a handler sees while it runs.
//!
//! A [`Context`] borrows the interpreter and the streams for the duration of
//! one dispatch. It exposes the dispatched line, argument extraction, output
//! (with optional auto-formatting), and the few state changes a handler may
//! request: passthrough mode, locking, and switching command tables.

use std::borrow::Cow;
use std::fmt::Display;
use std::rc::Rc;

use cmdr_types::config::PortSettings;

use crate::interpreter::{Commander, line_text, trim_end_of_line};
use crate::numeric::{Numeral, find_bytes, quick_value};
use crate::ports::Ports;
use crate::table::CommandTable;

pub struct Context<'a, 'p> {
    cmdr: &'a mut Commander,
    ports: &'a mut Ports<'p>,
}

impl<'a, 'p> Context<'a, 'p> {
    pub(crate) fn new(cmdr: &'a mut Commander, ports: &'a mut Ports<'p>) -> Self {
        Self { cmdr, ports }
    }

    /// Name of the interpreter running the handler.
    pub fn name(&self) -> &str {
        &self.cmdr.name
    }

    // -- The dispatched line --

    /// The raw line, terminator included. During passthrough this is the
    /// current chunk.
    pub fn line(&self) -> &[u8] {
        self.cmdr.buffer.line()
    }

    /// The line as text, without its terminator.
    pub fn line_str(&self) -> Cow<'_, str> {
        line_text(self.line())
    }

    /// Byte length of the matched command (0 for the fallback handler).
    pub fn command_end(&self) -> usize {
        self.cmdr.command_end
    }

    pub fn has_payload(&self) -> bool {
        self.cmdr.has_payload()
    }

    /// Everything after the command and its boundary byte.
    pub fn payload(&self) -> &[u8] {
        self.cmdr.payload()
    }

    pub fn payload_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_end_of_line(self.payload()))
    }

    /// The line contains `needle` anywhere.
    pub fn contains(&self, needle: &str) -> bool {
        find_bytes(self.line(), needle.as_bytes()).is_some()
    }

    pub fn contains_on(&self) -> bool {
        self.contains(" on")
    }

    pub fn contains_true(&self) -> bool {
        self.contains(" true")
    }

    // -- Numeric arguments --

    /// Next number after the cursor, or `None` once the line is exhausted.
    pub fn get<T: Numeral>(&mut self) -> Option<T> {
        let cmdr = &mut *self.cmdr;
        cmdr.cursor.extract(cmdr.buffer.line(), cmdr.terminator)
    }

    pub fn get_int(&mut self) -> Option<i32> {
        self.get()
    }

    pub fn get_float(&mut self) -> Option<f32> {
        self.get()
    }

    pub fn get_double(&mut self) -> Option<f64> {
        self.get()
    }

    // -- Quick options --

    /// Switch to quick-help mode if the line asks for `help`. In that mode
    /// the quick option calls list option names instead of parsing them.
    pub fn quick_set_help(&mut self) -> bool {
        if self.contains("help") {
            self.cmdr.quick_help = true;
        }
        self.cmdr.quick_help
    }

    pub fn is_quick_help(&self) -> bool {
        self.cmdr.quick_help
    }

    /// Store the value following `name` in `var`. Returns `true` when a
    /// value was found.
    pub fn quick_set<T: Numeral>(&mut self, name: &str, var: &mut T) -> bool {
        if self.cmdr.quick_help {
            self.ports.println(&format!("  {name}"));
            return false;
        }
        match quick_value(self.line(), name) {
            Some(value) => {
                *var = value;
                true
            },
            None => false,
        }
    }

    /// Print `name value` when the line mentions `name`.
    pub fn quick_get<T: Display>(&mut self, name: &str, value: T) {
        if self.cmdr.quick_help {
            self.ports.println(&format!("  {name}"));
            return;
        }
        if self.contains(name) {
            self.println(&format!("{name} {value}"));
        }
    }

    // -- Output --

    pub fn print(&mut self, text: &str) {
        self.ports.print(text);
    }

    /// Print a line, wrapped in the configured prefix and postfix when
    /// auto-format is on.
    pub fn println(&mut self, text: &str) {
        let format = &self.cmdr.format;
        if !format.auto {
            self.ports.println(text);
            return;
        }
        let prefix = format.prefix.as_deref().unwrap_or("");
        let postfix = format.postfix.as_deref().unwrap_or("");
        self.ports.println(&format!("{prefix}{text}{postfix}"));
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.ports.output().write_all(bytes);
    }

    /// Direct access to the streams, e.g. to feed a nested interpreter.
    pub fn ports(&mut self) -> &mut Ports<'p> {
        self.ports
    }

    // -- Interpreter state --

    pub fn settings(&self) -> &PortSettings {
        &self.cmdr.settings
    }

    pub fn settings_mut(&mut self) -> &mut PortSettings {
        &mut self.cmdr.settings
    }

    pub fn is_locked(&self) -> bool {
        self.cmdr.lock.is_locked()
    }

    pub fn lock(&mut self) {
        log::info!("{}: locked by handler", self.cmdr.name);
        self.cmdr.lock.lock();
    }

    /// Route all following input to the fallback handler until the EOF byte.
    pub fn start_stream(&mut self) {
        self.cmdr.start_stream();
    }

    /// `true` while a passthrough chunk is being delivered; `false` on the
    /// final call after the EOF byte.
    pub fn is_streaming(&self) -> bool {
        self.cmdr.streaming
    }

    /// Switch to another command table under a new name. Any payload on the
    /// current line is dispatched against the new table on the next poll.
    /// Returns whether a payload will be forwarded.
    pub fn transfer_to(&mut self, table: Rc<CommandTable>, name: &str) -> bool {
        self.cmdr.attach_commands(table);
        self.cmdr.set_name(name);
        self.cmdr.forward_payload = self.cmdr.has_payload();
        self.cmdr.forward_payload
    }

    /// Switch tables without forwarding anything, typically back to a parent.
    pub fn transfer_back(&mut self, table: Rc<CommandTable>, name: &str) {
        self.cmdr.attach_commands(table);
        self.cmdr.set_name(name);
    }
}
