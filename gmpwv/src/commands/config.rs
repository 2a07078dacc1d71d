use super::{nal_type_name, read_avc_config};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use gmp_widevine::engine::VideoCodecProfile;
use log::info;
use std::{fs, path::PathBuf};

/// Print an avcC record and optionally write its SPS/PPS as a start code stream.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// avcC record file.
    #[arg(required = true)]
    input: PathBuf,

    /// Path for the start code form of the parameter sets.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The file starts with one extra header byte.
    #[arg(long)]
    skip_byte: bool,
}

impl Config {
    pub fn execute(self) -> Result<()> {
        let (avcc, config) = read_avc_config(&self.input, self.skip_byte)?;

        println!("{} ({} bytes)", self.input.display().to_string().bold(), avcc.len());
        println!("  version        {}", config.version);
        println!(
            "  profile        {} ({:?})",
            config.profile_idc,
            VideoCodecProfile::from_h264_profile_idc(config.profile_idc)
        );
        println!("  compatibility  {:#04x}", config.profile_compatibility);
        println!("  level          {}", config.level_idc);
        println!("  length size    {}", config.nal_length_size);

        for (kind, units) in [("SPS", &config.sps), ("PPS", &config.pps)] {
            for unit in units.iter() {
                let name = unit
                    .first()
                    .map_or("empty", |header| nal_type_name(header & 0x1f));
                println!(
                    "  {} {:>4} bytes {} {}",
                    kind,
                    unit.len(),
                    hex::encode(unit),
                    format!("({})", name).dimmed()
                );
            }
        }

        if let Some(output) = &self.output {
            let data = config.to_start_codes();
            fs::write(output, &data)?;
            info!("Wrote {} bytes to {}", data.len(), output.display());
        }

        Ok(())
    }
}
