use anyhow::Result;
use std::path::PathBuf;

use remind::prelude::*;

use super::load;

/// Print the documentation form prefilled from a file
pub fn run(file: PathBuf) -> Result<()> {
    let extraction = load(&file, 0)?;
    let form = FormPrefill::from_extraction(&extraction);

    #[cfg(feature = "colorized_output")]
    {
        use console::style;

        for (label, value) in form.entries() {
            if value.is_empty() {
                println!("{}: {}", style(label).bold(), style("(not available)").dim());
            } else {
                println!("{}: {}", style(label).bold(), value);
            }
        }
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        print!("{}", form);
    }

    Ok(())
}
