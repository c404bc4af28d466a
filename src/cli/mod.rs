use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use remind::prelude::*;

mod extract;
mod form;
mod raw;

mod config;

pub use config::Config;

/// ReMInD - microscopy acquisition metadata extraction
#[derive(Parser)]
#[command(name = "remind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Rendition of extracted metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Flat `key: value` text with a header line
    #[default]
    Text,
    /// JSON document with source, format and timestamp
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract normalized metadata from a CZI, LIF or ND2 file
    Extract {
        /// Input image file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output rendition (text, json)
        #[arg(short = 'f', long, value_enum)]
        output_format: Option<OutputFormat>,

        /// Include the vendor-native metadata tree (JSON output only)
        #[arg(long)]
        raw: bool,

        /// Write to this path instead of standard output
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Image of a multi-image LIF project to extract (default: 0)
        #[arg(short, long, value_name = "N")]
        image: Option<usize>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print the documentation form prefilled from a file's metadata
    Form {
        /// Input image file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Dump the vendor-native metadata tree as JSON
    Raw {
        /// Input image file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract {
            file,
            output_format,
            raw,
            output,
            image,
            config,
        } => extract::run(file, output_format, raw, output, image, config),
        Commands::Form { file } => form::run(file),
        Commands::Raw { file } => raw::run(file),
    }
}

/// Extract a file, honoring a LIF image index.
fn load(file: &Path, image_index: usize) -> Result<Extraction> {
    let extraction = match FileFormat::from_path(file) {
        Some(FileFormat::Lif) => LifExtractor::with_image(image_index).extract(file),
        _ => extract_file(file),
    };
    extraction.context("Metadata extraction failed")
}
