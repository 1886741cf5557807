//! Built-in administrative commands: lock, unlock, `help`, `?` and the
//! `on`/`off` toggles.

use crate::interpreter::Commander;
use crate::matcher::InternalCommand;
use crate::numeric::find_bytes;
use crate::ports::Ports;

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

impl Commander {
    pub(crate) fn run_internal(&mut self, cmd: InternalCommand, ports: &mut Ports<'_>) {
        let on = find_bytes(self.buffer.line(), b" on").is_some();
        match cmd {
            InternalCommand::Unlock => {
                if self.lock.try_unlock(self.buffer.line()) {
                    log::info!("{}: unlocked", self.name);
                    ports.println(&self.unlock_message);
                } else {
                    log::debug!("{}: unlock rejected", self.name);
                }
            },
            InternalCommand::Lock => {
                log::info!("{}: locked", self.name);
                self.lock.lock();
                ports.println(&self.lock_message);
            },
            InternalCommand::Help => {
                if self.settings.help_enabled {
                    self.print_help(ports);
                }
            },
            InternalCommand::Status => {
                if self.settings.help_enabled {
                    self.print_status(ports);
                }
            },
            InternalCommand::Echo => {
                self.settings.echo_terminal = on;
                ports.println(&format!("Echo terminal {}", on_off(on)));
            },
            InternalCommand::EchoAux => {
                self.settings.echo_aux = on;
                ports.println(&format!("Echo aux {}", on_off(on)));
            },
            InternalCommand::Enable => {
                self.settings.parser_enabled = on;
                ports.println(&format!("Parser enabled {}", on_off(on)));
            },
            InternalCommand::Errors => {
                self.settings.error_messages = on;
                ports.println(&format!("Error messages {}", on_off(on)));
            },
        }
    }

    /// User commands with their help text, then the internal commands.
    pub fn print_help(&self, ports: &mut Ports<'_>) {
        ports.println(&format!(" {} User Commands:", self.name));
        let width = self.index.longest();
        for entry in self.table.iter() {
            let pad = width.saturating_sub(entry.name().len()) + 1;
            ports.println(&format!(
                "\t{}{}| {}",
                entry.name(),
                " ".repeat(pad),
                entry.help()
            ));
        }
        ports.println(" Internal Commands:");
        for cmd in InternalCommand::ALL {
            let suffix = if cmd.is_toggle() { " (on/off)" } else { "" };
            ports.println(&format!("\t{}{suffix}", cmd.name()));
        }
        ports.println(&format!(" Reload character: {}", char::from(self.reload)));
        ports.println(&format!(" Comment character: {}", char::from(self.rules.comment)));
    }

    /// Version and current settings.
    pub fn print_status(&self, ports: &mut Ports<'_>) {
        let s = &self.settings;
        let has_aux = ports.has_aux();
        let lines = [
            format!("\tcmdr version {}", env!("CARGO_PKG_VERSION")),
            format!("\tEcho terminal: {}", on_off(s.echo_terminal)),
            format!("\tEcho aux: {}", on_off(s.echo_aux)),
            format!("\tAuto format: {}", on_off(self.format.auto)),
            format!("\tError messages: {}", on_off(s.error_messages)),
            format!("\tAux port: {}", if has_aux { "attached" } else { "none" }),
            format!("\tLocked: {}", yes_no(self.lock.is_locked())),
            format!("\tLock: {}", if self.lock.is_hard() { "Hard" } else { "Soft" }),
            format!("\tFallback handler: {}", if self.fallback.is_some() { "set" } else { "none" }),
        ];
        for line in &lines {
            ports.println(line);
        }
    }
}
