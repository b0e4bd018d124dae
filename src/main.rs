#![allow(dead_code)]
#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Logging is initialized inside the subcommand handlers, once
    // the configuration (and with it the log directory) is known.
    let cli = Cli::parse();
    cli.run()
}
