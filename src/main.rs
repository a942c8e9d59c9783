use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal};

use hbnb::{logger, Console, HbnbConfig};

fn main() -> Result<()> {
    let config = HbnbConfig::parse();
    logger::init_logger(config.verbose);

    tracing::info!(version = hbnb::VERSION, storage = ?config.storage, "starting console");
    let storage = config.open_storage().context("opening storage")?;

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut console = Console::new(storage, io::stdout().lock()).interactive(interactive);
    console.run(stdin.lock())?;

    Ok(())
}
