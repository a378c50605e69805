//! Show command implementation.
//!
//! Load and display the output files of a finished run.

use anyhow::{Context, Result};

use lindblad_mpo::load_output;

use super::common::{OutputFormat, export_json, print_result};

/// Execute the show command.
pub fn execute(prefix: &str, format: &str, export: Option<&str>) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let result =
        load_output(prefix).with_context(|| format!("Failed to load output of run {prefix}"))?;

    print_result(&result, format)?;

    if let Some(export) = export {
        export_json(&result, export)?;
    }

    Ok(())
}
