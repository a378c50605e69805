//! Build command implementation.

use anyhow::Result;
use console::style;

use lindblad_mpo::build_input;

use super::common::{load_parameters, rule_set};

/// Execute the build command.
pub fn execute(path: &str, ignore: &[String]) -> Result<()> {
    let params = load_parameters(path)?;
    let input = build_input(&params, &rule_set(ignore))?;

    println!(
        "{} Wrote {}",
        style("✓").green().bold(),
        style(input.input_path.display()).green()
    );
    println!("  Output prefix: {}", input.output_prefix);
    if let Some(id) = &input.unique_id {
        println!("  Unique id:     {}", style(id).dim());
    }

    Ok(())
}
