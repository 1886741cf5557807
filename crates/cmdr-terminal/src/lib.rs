//! Line-oriented command interpreter for byte streams.
//!
//! A [`Commander`] accumulates incoming bytes into a line buffer, matches the
//! completed line against an embedder-supplied [`CommandTable`] (longest
//! prefix, with a word-boundary check), and calls the matching handler, one
//! of the built-in administrative commands, or a fallback handler for
//! numeric lines. Handlers pull numeric arguments out of the line through
//! their [`Context`]. A passthrough mode hands raw bytes to the fallback
//! handler until an EOF byte arrives.

mod admin;
pub mod buffer;
mod context;
mod interpreter;
pub mod lock;
pub mod matcher;
pub mod numeric;
mod ports;
mod table;


/// Line state machine and its storage.
pub use buffer::{LineBuffer, LineState};
/// Per-dispatch view handed to handlers.
pub use context::Context;
/// The interpreter itself.
pub use interpreter::Commander;
/// Built-in administrative commands.
pub use matcher::InternalCommand;
/// Number types extractable from a line.
pub use numeric::Numeral;
/// Input, output and auxiliary streams for one poll.
pub use ports::Ports;
/// Command registration.
pub use table::{CommandEntry, CommandIndex, CommandTable, Handler, Outcome};

pub use cmdr_stream::{ByteStream, MemoryStream};
pub use cmdr_types::{CmdrError, CommanderConfig, PortSettings, Result};
