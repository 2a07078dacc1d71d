mod commands;
mod logger;

use clap::{ColorChoice, Parser};
use colored::Colorize;
use commands::{Args, Commands};
use log::LevelFilter;
use logger::Logger;
use std::{
    io::{IsTerminal, stderr},
    process,
};

static LOGGER: Logger = Logger;

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    colored::control::set_override(match args.color {
        ColorChoice::Always => true,
        ColorChoice::Auto => stderr().is_terminal(),
        ColorChoice::Never => false,
    });

    log::set_logger(&LOGGER)?;
    log::set_max_level(match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    });

    match args.command {
        Commands::Config(args) => args.execute()?,
        Commands::Probe(args) => args.execute()?,
        Commands::Reframe(args) => args.execute()?,
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".bold().red(), e);
        process::exit(1);
    }
}
