//! Interpreter configuration.
//!
//! Everything the embedder can tune lives here: buffer capacity, marker
//! characters, the prompt, port settings, the lock and output formatting.
//! A configuration can be built in code (`CommanderConfig::default()` plus
//! field updates) or loaded from a TOML file:
//!
//! ```toml
//! name = "motor"
//! buffer_size = 64
//! reload_char = "/"
//!
//! [settings]
//! echo_terminal = false
//!
//! [lock]
//! locked = true
//! hard = true
//! passphrase = "open"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{CmdrError, Result};

/// Per-interpreter on/off switches.
///
/// Mutated only by the internal administrative commands or by explicit
/// configuration calls on the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PortSettings {
    /// Echo received bytes back to the output sink.
    pub echo_terminal: bool,
    /// Echo received bytes to the auxiliary sink.
    pub echo_aux: bool,
    /// Parse command lines. When off, bytes are bridged between the input
    /// and auxiliary streams instead.
    pub parser_enabled: bool,
    /// Print the interpreter name and prompt character after each line.
    pub prompt_enabled: bool,
    /// Allow the `help` and `?` internal commands.
    pub help_enabled: bool,
    /// Emit diagnostics for overflow, unknown commands and handler errors.
    pub error_messages: bool,
    /// Drop carriage returns while buffering a line.
    pub strip_cr: bool,
    /// Several interpreters share one port; injected lines leave the prompt
    /// to the parent interpreter.
    pub multi_commander: bool,
    /// Echo comment lines to the output sink.
    pub print_comments: bool,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            echo_terminal: true,
            echo_aux: false,
            parser_enabled: true,
            prompt_enabled: true,
            help_enabled: true,
            error_messages: true,
            strip_cr: true,
            multi_commander: false,
            print_comments: false,
        }
    }
}

/// Initial lock state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Start locked.
    pub locked: bool,
    /// Hard lock: block internal commands too, until unlocked.
    pub hard: bool,
    /// Passphrase required by `U`. `None` accepts any unlock attempt.
    pub passphrase: Option<String>,
}

/// Automatic wrapping of handler output lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Wrap every line a handler prints.
    pub auto: bool,
    /// Text written before each line.
    pub prefix: Option<String>,
    /// Text written after each line, before the newline.
    pub postfix: Option<String>,
}

/// Complete interpreter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommanderConfig {
    /// Interpreter name, printed in the prompt and help listing.
    pub name: String,
    /// Character printed after the name to form the prompt.
    pub prompt_char: char,
    /// Line buffer capacity in bytes. A line holds at most `buffer_size - 1`.
    pub buffer_size: usize,
    /// Leading character that marks a comment line.
    pub comment_char: char,
    /// Alternate end-of-command character accepted after a command name.
    pub end_of_command_char: char,
    /// Character that replays the previous line when it starts a new one.
    pub reload_char: char,
    /// Line terminator.
    pub end_of_line: char,
    /// Byte that ends passthrough (stream) mode.
    pub eof_char: char,
    /// Printed after a successful unlock.
    pub unlock_message: String,
    /// Printed after `X`.
    pub lock_message: String,
    pub settings: PortSettings,
    pub lock: LockConfig,
    pub format: FormatConfig,
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self {
            name: "Cmd".to_string(),
            prompt_char: '>',
            buffer_size: 128,
            comment_char: '#',
            end_of_command_char: '=',
            reload_char: '/',
            end_of_line: '\n',
            eof_char: '\u{4}',
            unlock_message: "Unlocked".to_string(),
            lock_message: "Locked".to_string(),
            settings: PortSettings::default(),
            lock: LockConfig::default(),
            format: FormatConfig::default(),
        }
    }
}

impl CommanderConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::debug!("loaded interpreter config '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Check the invariants the interpreter relies on.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size < 2 {
            return Err(CmdrError::Config(format!(
                "buffer_size must be at least 2, got {}",
                self.buffer_size
            )));
        }
        if self.name.is_empty() {
            return Err(CmdrError::Config("name must not be empty".to_string()));
        }
        let markers = [
            ("prompt_char", self.prompt_char),
            ("comment_char", self.comment_char),
            ("end_of_command_char", self.end_of_command_char),
            ("reload_char", self.reload_char),
            ("end_of_line", self.end_of_line),
            ("eof_char", self.eof_char),
        ];
        for (field, ch) in markers {
            if !ch.is_ascii() {
                return Err(CmdrError::Config(format!(
                    "{field} must be an ASCII character, got {ch:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_sensible() {
        let cfg = CommanderConfig::default();
        assert_eq!(cfg.name, "Cmd");
        assert_eq!(cfg.prompt_char, '>');
        assert_eq!(cfg.buffer_size, 128);
        assert_eq!(cfg.comment_char, '#');
        assert_eq!(cfg.end_of_command_char, '=');
        assert_eq!(cfg.reload_char, '/');
        assert_eq!(cfg.end_of_line, '\n');
        assert_eq!(cfg.eof_char, '\u{4}');
        assert!(cfg.settings.parser_enabled);
        assert!(cfg.settings.strip_cr);
        assert!(!cfg.settings.echo_aux);
        assert!(!cfg.lock.locked);
        assert!(cfg.lock.passphrase.is_none());
        assert!(!cfg.format.auto);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = CommanderConfig::from_toml(
            r#"
name = "motor"
buffer_size = 64

[settings]
echo_terminal = false

[lock]
locked = true
hard = true
passphrase = "open"
"#,
        )
        .unwrap();
        assert_eq!(cfg.name, "motor");
        assert_eq!(cfg.buffer_size, 64);
        assert!(!cfg.settings.echo_terminal);
        // Untouched settings keep their defaults.
        assert!(cfg.settings.prompt_enabled);
        assert!(cfg.lock.locked && cfg.lock.hard);
        assert_eq!(cfg.lock.passphrase.as_deref(), Some("open"));
        assert_eq!(cfg.comment_char, '#');
    }

    #[test]
    fn marker_chars_from_toml() {
        let cfg = CommanderConfig::from_toml(
            r#"
comment_char = ";"
reload_char = "!"
eof_char = "\u0003"
"#,
        )
        .unwrap();
        assert_eq!(cfg.comment_char, ';');
        assert_eq!(cfg.reload_char, '!');
        assert_eq!(cfg.eof_char, '\u{3}');
    }

    #[test]
    fn tiny_buffer_rejected() {
        let err = CommanderConfig::from_toml("buffer_size = 1").unwrap_err();
        assert!(matches!(err, CmdrError::Config(_)));
    }

    #[test]
    fn non_ascii_marker_rejected() {
        let err = CommanderConfig::from_toml("comment_char = \"\u{00a7}\"").unwrap_err();
        assert!(format!("{err}").contains("comment_char"));
    }

    #[test]
    fn empty_name_rejected() {
        let err = CommanderConfig::from_toml("name = \"\"").unwrap_err();
        assert!(matches!(err, CmdrError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = CommanderConfig::from_toml("name = [").unwrap_err();
        assert!(matches!(err, CmdrError::TomlParse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmdr.toml");
        std::fs::write(&path, "name = \"pump\"\n[format]\nauto = true\nprefix = \"<\"\n").unwrap();
        let cfg = CommanderConfig::load(&path).unwrap();
        assert_eq!(cfg.name, "pump");
        assert!(cfg.format.auto);
        assert_eq!(cfg.format.prefix.as_deref(), Some("<"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommanderConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CmdrError::Io(_)));
    }
}
