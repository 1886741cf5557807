//! cmdr demo: an interactive interpreter over stdin/stdout.
//!
//! Usage: `cmdr-app [config.toml]` (or set `CMDR_CONFIG`). Without a config
//! file the interpreter runs with defaults, minus terminal echo since the
//! host terminal already echoes what is typed.

mod demo;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use cmdr_stream::{MemoryStream, WriterStream};
use cmdr_terminal::{Commander, LineState, Ports};
use cmdr_types::CommanderConfig;

fn load_config() -> Result<CommanderConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CMDR_CONFIG").ok())
        .map(PathBuf::from);
    match path {
        Some(path) => CommanderConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            let mut config = CommanderConfig::default();
            config.settings.echo_terminal = false;
            Ok(config)
        },
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    log::info!(
        "Starting cmdr '{}' (buffer {} bytes)",
        config.name,
        config.buffer_size
    );

    let motor = demo::Shared::default();
    let mut cmdr = Commander::with_config(&config)?;
    cmdr.attach_commands(Rc::new(demo::commands(&motor)));
    cmdr.set_fallback(demo::fallback(&motor));

    let mut input = MemoryStream::new();
    let mut output = WriterStream::new(io::stdout());
    {
        let mut ports = Ports::split(&mut input, &mut output);
        cmdr.print_prompt(&mut ports);
        ports.flush();
    }

    let mut stdin = io::stdin().lock();
    let mut chunk = Vec::new();
    loop {
        chunk.clear();
        if stdin.read_until(b'\n', &mut chunk).context("reading stdin")? == 0 {
            break;
        }
        input.push(&chunk);
        let mut ports = Ports::split(&mut input, &mut output);
        // With the parser off and nothing to bridge to, input is never consumed.
        while cmdr.update(&mut ports) && cmdr.settings().parser_enabled {}
    }

    // Last line of piped input without a trailing newline.
    if cmdr.line_state() == LineState::Buffering {
        let mut ports = Ports::split(&mut input, &mut output);
        cmdr.end_line(&mut ports);
    }

    output.finish()?;
    log::info!("stdin closed, exiting");
    Ok(())
}
