//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser};

use tubelift_protocol::PrivacyStatus;
use tubelift_upload::{DirectoryProvider, FileListProvider, JobProvider, MetadataTemplate};

/// Upload videos to YouTube with resumable, retrying chunked transfers.
#[derive(Parser, Debug)]
#[command(name = "tubelift", version, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Video title (batches append " - <file stem>")
    #[arg(long)]
    pub title: Option<String>,

    /// Video description
    #[arg(long)]
    pub description: Option<String>,

    /// Comma-separated keywords
    #[arg(long)]
    pub keywords: Option<String>,

    /// Numeric video category id
    #[arg(long)]
    pub category: Option<String>,

    /// Privacy status: unlisted, private or public
    #[arg(long)]
    pub privacy_status: Option<PrivacyStatus>,

    /// Bytes per chunk, rounded up to a multiple of 256 KiB (0 = 8 MiB)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Consecutive retriable failures tolerated per file
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=50))]
    pub max_retries: Option<u32>,

    /// OAuth access token with the youtube.upload scope
    #[arg(long, env = "TUBELIFT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Configuration file (default: ~/.config/tubelift/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the batch results as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Which files to upload. Exactly one must be given.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// A single video file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Several video files; missing ones are skipped
    #[arg(long, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Every video file directly inside this directory
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

impl SourceArgs {
    pub fn provider(&self, template: MetadataTemplate) -> Box<dyn JobProvider> {
        if let Some(file) = &self.file {
            Box::new(FileListProvider::single(file.clone(), template))
        } else if let Some(dir) = &self.dir {
            Box::new(DirectoryProvider::new(dir.clone(), template))
        } else {
            Box::new(FileListProvider::many(self.files.clone(), template))
        }
    }
}
