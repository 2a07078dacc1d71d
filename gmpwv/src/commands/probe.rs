use super::nal_type_name;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use gmp_widevine::reframe;
use std::{fs, path::PathBuf};

/// List the NAL units of a sample framed with 4 byte length prefixes.
#[derive(Debug, Clone, Args)]
pub struct Probe {
    /// Length-prefixed sample file.
    #[arg(required = true)]
    input: PathBuf,
}

impl Probe {
    pub fn execute(self) -> Result<()> {
        let data = fs::read(&self.input)?;
        let units = reframe::nal_units(&data)?;

        println!(
            "{} ({} bytes, {} NAL units)",
            self.input.display().to_string().bold(),
            data.len(),
            units.len()
        );

        for unit in &units {
            let unit_type = unit.unit_type();
            println!(
                "{:>8} {:>8} {:>3} {}",
                unit.offset,
                unit.data.len(),
                unit_type.map_or("-".to_owned(), |t| t.to_string()),
                unit_type.map_or("empty", nal_type_name).dimmed()
            );
        }

        let used = units
            .last()
            .map_or(0, |unit| unit.offset + reframe::NAL_LENGTH_SIZE + unit.data.len());
        if used < data.len() {
            log::warn!("{} trailing bytes after the last NAL unit.", data.len() - used);
        }

        Ok(())
    }
}
