// src/main.rs

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use log::{debug, info};

use combo_composer::config::Config;
use combo_composer::trace::{self, Replayer};
use combo_composer::CommandSession;

/// Replays an input trace from stdin and prints the resulting command text.
///
/// Usage: `combo-composer [CONFIG.json] < trace.txt`
fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    // --- Configuration ---
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Config::load(&path)?,
        None => {
            info!("No config file given, using the default key mapping.");
            Config::default()
        }
    };

    // --- Trace ---
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read trace from stdin")?;
    let commands = trace::parse(&input)?;
    debug!("Parsed {} trace commands", commands.len());

    let mut replayer = Replayer::new(CommandSession::new(config));
    replayer.run(&commands);

    if replayer.dumps().is_empty() {
        println!("{}", replayer.session().serialize());
    } else {
        for dump in replayer.dumps() {
            println!("{}", dump);
        }
    }
    info!(
        "Replayed {} commands, {} tokens in buffer",
        commands.len(),
        replayer.session().tokens().len()
    );
    Ok(())
}
