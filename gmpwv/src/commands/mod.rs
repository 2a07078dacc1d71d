mod config;
mod probe;
mod reframe;

pub use config::Config;
pub use probe::Probe;
pub use reframe::Reframe;

use anyhow::{Result, bail};
use clap::{ColorChoice, Parser, Subcommand};
use gmp_widevine::reframe::{self as avc, AvcConfig, NAL_LENGTH_SIZE};
use std::{fs, path::Path};

/// Inspect and reframe length-prefixed H.264 samples and avcC records.
#[derive(Debug, Clone, Parser)]
#[command(version, author = "clitic <clitic21@gmail.com>", about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// When to output colored text.
    #[arg(long, global = true, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Show debug logs, twice for trace logs.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Config(Config),
    Probe(Probe),
    Reframe(Reframe),
}

/// Read an avcC record, optionally behind the one byte header hosts put in front of it.
fn read_avc_config(path: &Path, skip_byte: bool) -> Result<(Vec<u8>, AvcConfig)> {
    let data = fs::read(path)?;
    let avcc = if skip_byte {
        avc::split_codec_specific(&data)?.to_vec()
    } else {
        data
    };

    let config = AvcConfig::parse(&avcc)?;

    if config.nal_length_size as usize != NAL_LENGTH_SIZE {
        bail!(
            "{} uses {} byte NAL lengths, only {} byte lengths are supported",
            path.display(),
            config.nal_length_size,
            NAL_LENGTH_SIZE
        );
    }

    Ok((avcc, config))
}

fn nal_type_name(unit_type: u8) -> &'static str {
    match unit_type {
        1 => "non-IDR slice",
        5 => "IDR slice",
        6 => "SEI",
        7 => "SPS",
        8 => "PPS",
        9 => "AUD",
        _ => "other",
    }
}
