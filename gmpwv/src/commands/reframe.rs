use super::read_avc_config;
use anyhow::Result;
use clap::Args;
use gmp_widevine::{engine::Subsample, reframe};
use log::info;
use std::{fs, path::PathBuf};

/// Rewrite a length-prefixed sample into an Annex B start code stream.
#[derive(Debug, Clone, Args)]
pub struct Reframe {
    /// Length-prefixed sample file.
    #[arg(required = true)]
    input: PathBuf,

    /// Path for the start code stream.
    #[arg(short, long, required = true)]
    output: PathBuf,

    /// avcC record whose SPS and PPS are put in front of the sample, as done for key frames.
    #[arg(long)]
    config: Option<PathBuf>,

    /// The avcC file starts with one extra header byte.
    #[arg(long)]
    skip_byte: bool,

    /// Clear byte count of the first subsample, reported after config injection.
    #[arg(long, requires = "config")]
    clear_bytes: Option<u32>,
}

impl Reframe {
    pub fn execute(self) -> Result<()> {
        let mut data = fs::read(&self.input)?;
        reframe::to_start_codes(&mut data)?;

        if let Some(path) = &self.config {
            let (_, config) = read_avc_config(path, self.skip_byte)?;
            let parameter_sets = config.to_start_codes();

            let mut subsamples: Vec<Subsample> = self
                .clear_bytes
                .map(|clear| Subsample::new(clear, 0))
                .into_iter()
                .collect();

            data = reframe::inject_config(data, &mut subsamples, &parameter_sets);
            info!(
                "Injected {} bytes of SPS/PPS ({} SPS, {} PPS).",
                parameter_sets.len(),
                config.sps.len(),
                config.pps.len()
            );

            if let Some(first) = subsamples.first() {
                info!("First subsample now has {} clear bytes.", first.clear_bytes);
            }
        }

        fs::write(&self.output, &data)?;
        info!("Wrote {} bytes to {}", data.len(), self.output.display());
        Ok(())
    }
}
