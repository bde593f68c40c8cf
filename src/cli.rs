use clap::Parser;
use std::path::PathBuf;

use crate::error::Result;
use crate::io::HttpSource;
use crate::request::{ArchiveFormat, ArchiveOptions};

#[derive(Parser, Debug)]
#[command(name = "autozip")]
#[command(version)]
#[command(about = "Build ZIP, TAR, TAR.GZ and GZ archives from files, folders and URLs", long_about = None)]
#[command(after_help = "Examples:\n  \
  autozip photos/                      pack the photos folder into photos.zip\n  \
  autozip -f tar.gz -t src/ README.md  tarball with a timestamped name\n  \
  autozip -f gz -d /tmp notes.txt      gzip a single file into /tmp/notes.gz")]
pub struct Cli {
    /// Files, folders or HTTP URLs to archive
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<String>,

    /// Archive format: zip, tar, tar.gz or gz
    #[arg(short = 'f', long, value_name = "FORMAT", default_value = "zip")]
    pub format: String,

    /// Archive name without extension (default: folder name or file stem)
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,

    /// Append a _YYYYMMDD_HHMMSS timestamp to the archive name
    #[arg(short = 't', long)]
    pub timestamp: bool,

    /// Write the archive into DIR
    #[arg(short = 'd', long = "output-dir", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Overwrite an existing archive WITHOUT prompting
    #[arg(short = 'o', long)]
    pub overwrite: bool,

    /// Log more (-v => info, -vv => debug)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, no progress or summary (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

/// One command-line input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Local(PathBuf),
    Url(String),
}

impl Cli {
    /// Archive options described by the flags
    ///
    /// Fails with [`UnsupportedFormat`](crate::ArchiveError::UnsupportedFormat)
    /// for an unknown `--format` tag.
    pub fn options(&self) -> Result<ArchiveOptions> {
        let format: ArchiveFormat = self.format.parse()?;
        Ok(ArchiveOptions {
            format,
            base_name: self.name.clone(),
            append_timestamp: self.timestamp,
        })
    }

    pub fn inputs(&self) -> Vec<Input> {
        self.inputs
            .iter()
            .map(|i| {
                if HttpSource::is_http_url(i) {
                    Input::Url(i.clone())
                } else {
                    Input::Local(PathBuf::from(i))
                }
            })
            .collect()
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.is_very_quiet() {
            return "autozip=off";
        }
        if self.is_quiet() {
            return "autozip=error";
        }
        match self.verbose {
            0 => "autozip=warn",
            1 => "autozip=info",
            _ => "autozip=debug",
        }
    }
}
