// src/cli.rs

use crate::publisher::DEFAULT_API_BASE;
use crate::watermark::DEFAULT_STATE_FILE;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};

pub const EXAMPLE: &str = "Example: thumbnail-bot 907712334036930212";

/// Posts contact sheets of recently committed textures to a Discord channel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Discord channel to post collages to
    pub channel_id: u64,

    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory whose subdirectories are the git repositories to scan
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Watermark file, relative to the root unless absolute
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,

    /// Where each collage is written before it is posted, relative to the root unless absolute
    #[arg(long, default_value = "thumbnail.png")]
    pub output: PathBuf,

    /// Base URL of the Discord REST API
    #[arg(long, env = "DISCORD_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Render collages without posting them
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Parses the process arguments. A missing or non-numeric channel id
    /// prints usage to stdout and exits with status 1.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(args) => args,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
            Err(e) => {
                println!("Please provide the discord channel_id.");
                println!("{}", e);
                println!("{}", EXAMPLE);
                std::process::exit(1);
            }
        }
    }

    pub fn state_path(&self) -> PathBuf {
        resolve(&self.root, &self.state_file)
    }

    pub fn output_path(&self) -> PathBuf {
        resolve(&self.root, &self.output)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
