use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for ieeg-psd
#[derive(Parser, Debug, Clone)]
#[command(name = "ieeg-psd")]
#[command(about = "Average PSD of intracranial EEG, ictal vs interictal")]
#[command(version)]
pub struct Config {
    /// Directory scanned for .mat recordings
    #[arg(short, long, default_value = "data", env = "IEEG_PSD_DATA_PATH")]
    pub data_path: PathBuf,

    /// Worker threads used to load and transform files of one class
    #[arg(short, long, default_value = "1", env = "IEEG_PSD_JOBS")]
    pub jobs: NonZeroUsize,

    /// Log the per-class summary and exit without drawing the chart
    #[arg(long)]
    pub summary_only: bool,
}

impl Config {
    #[cfg(test)]
    pub fn new(data_path: impl Into<PathBuf>) -> Config {
        Config {
            data_path: data_path.into(),
            jobs: NonZeroUsize::MIN,
            summary_only: false,
        }
    }
}
