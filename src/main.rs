//! # ReMInD Metadata Extractor
//!
//! A command-line tool for reading acquisition metadata out of microscopy
//! image files.
//!
//! ## Supported Input Formats
//!
//! - **CZI**: Zeiss ZISRAW containers
//! - **LIF**: Leica projects (one image at a time, `--image N`)
//! - **ND2**: Nikon chunked containers
//!
//! ## Usage
//!
//! ```bash
//! # Flat text to stdout
//! remind extract cells.czi
//!
//! # JSON with the vendor tree, written to a file
//! remind extract project.lif --image 2 -f json --raw -o project.json
//!
//! # Prefilled documentation form
//! remind form plate.nd2
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
