//! Verify command implementation.

use anyhow::Result;
use console::style;

use lindblad_mpo::check_parameters;

use super::common::{load_parameters, rule_set};

/// Execute the verify command.
pub fn execute(path: &str, ignore: &[String]) -> Result<()> {
    let params = load_parameters(path)?;
    let diagnostics = check_parameters(&params, &rule_set(ignore));

    if diagnostics.is_empty() {
        println!(
            "{} {} is valid ({} parameters)",
            style("✓").green().bold(),
            style(path).green(),
            params.len()
        );
        return Ok(());
    }

    eprint!("{diagnostics}");
    anyhow::bail!("{} problem(s) found in {path}", diagnostics.len())
}
