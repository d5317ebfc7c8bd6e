use crate::config::SwitchConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file describing the resource blocks
    #[arg(short, long)]
    pub config: PathBuf,

    /// Template file(s) containing <!--cdn-switch=NAME--> markers, concatenated in order
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output HTML file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Fetch missing resources into each block's download_path
    #[arg(long, conflicts_with = "no_download_local")]
    pub download_local: bool,

    #[arg(long)]
    pub no_download_local: bool,

    /// Point generated markup at the local copies instead of the CDN
    #[arg(long, conflicts_with = "no_link_local")]
    pub link_local: bool,

    #[arg(long)]
    pub no_link_local: bool,

    /// Per-request timeout in seconds (optional)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Write a CSV of per-resource outcomes to this path (optional)
    #[arg(short, long, default_value = None)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags win over the configuration file.
    pub fn apply(&self, config: &mut SwitchConfig) {
        if self.download_local {
            config.download_local = true;
        } else if self.no_download_local {
            config.download_local = false;
        }

        if self.link_local {
            config.link_local = true;
        } else if self.no_link_local {
            config.link_local = false;
        }

        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
    }
}
