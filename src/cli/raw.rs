use anyhow::{Context, Result};
use std::path::PathBuf;

use super::load;

/// Dump the vendor-native metadata tree
pub fn run(file: PathBuf) -> Result<()> {
    let extraction = load(&file, 0)?;
    let json = serde_json::to_string_pretty(&extraction.raw).context("Failed to serialize tree")?;
    println!("{}", json);
    Ok(())
}
