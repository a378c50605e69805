//! Correlations command implementation.

use anyhow::{Context, Result};
use console::style;

use lindblad_mpo::{correlation_matrix, load_output};

/// Execute the correlations command.
pub fn execute(prefix: &str, sites: usize, name: &str, time: Option<f64>) -> Result<()> {
    if name.chars().count() != 2 {
        anyhow::bail!("Expected a two-site observable such as 'zz', got '{name}'");
    }
    let result =
        load_output(prefix).with_context(|| format!("Failed to load output of run {prefix}"))?;

    let time = match time {
        Some(t) => t,
        None => result
            .obs_2q
            .values()
            .filter_map(|series| series.last())
            .map(|(t, _)| t)
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.max(t))))
            .context("The run has no two-site data")?,
    };

    let matrix = correlation_matrix(&result, name, time, sites);
    println!(
        "{} Connected {} correlations at t = {}",
        style("→").cyan().bold(),
        style(name.to_lowercase()).green(),
        time
    );
    for row in matrix.rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|v| {
                if v.is_nan() {
                    format!("{:>10}", "-")
                } else {
                    format!("{v:>10.4}")
                }
            })
            .collect();
        println!("  {}", cells.join(" "));
    }

    Ok(())
}
