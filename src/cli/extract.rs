use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use remind::prelude::*;

use super::{load, Config, OutputFormat};

/// Extract normalized metadata and write it as text or JSON
pub fn run(
    file: PathBuf,
    output_format: Option<OutputFormat>,
    raw: bool,
    output: Option<PathBuf>,
    image: Option<usize>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };

    // Flags override the config file
    let format = output_format.or(config.output.format).unwrap_or_default();
    let include_raw = raw || config.output.include_raw.unwrap_or(false);
    let image_index = image.or(config.lif.image_index).unwrap_or(0);

    info!("Input: {}", file.display());
    info!("Output format: {:?}", format);

    let extraction = load(&file, image_index)?;

    let rendered = match format {
        OutputFormat::Text => {
            if include_raw {
                warn!("--raw only applies to JSON output; ignoring");
            }
            to_flat_text(&extraction.output)
        }
        OutputFormat::Json => ExportDocument::new(&file, &extraction, include_raw)
            .to_json()
            .context("Failed to serialize metadata")?,
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_summary(&extraction, &path.display().to_string());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

fn print_summary(extraction: &Extraction, destination: &str) {
    let total = extraction.output.len();
    let missing = extraction.output.iter().filter(|f| f.value.is_missing()).count();

    #[cfg(feature = "colorized_output")]
    {
        use console::style;

        println!(
            "{} {} file: {} fields ({} present, {} missing)",
            style("Extracted").green().bold(),
            style(extraction.format).cyan(),
            total,
            style(total - missing).green(),
            style(missing).yellow()
        );
        println!("{}: {}", style("Written to").bold(), destination);
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!(
            "Extracted {} file: {} fields ({} present, {} missing)",
            extraction.format,
            total,
            total - missing,
            missing
        );
        println!("Written to: {}", destination);
    }
}
