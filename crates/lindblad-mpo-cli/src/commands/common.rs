//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use lindblad_mpo::{
    LaunchConfig, OutputKind, Parameters, RuleSet, ShellWrapper, SimulationResult,
};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn parse(format: &str) -> Result<Self> {
        match format.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => anyhow::bail!("Unknown format: '{other}'. Available: table, json, yaml"),
        }
    }
}

/// Load parameters from a YAML or JSON file.
pub fn load_parameters(path: &str) -> Result<Parameters> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    Parameters::from_path(path).with_context(|| format!("Failed to load parameters from {path}"))
}

/// Rule set accepting the given keys unchecked.
pub fn rule_set(ignore: &[String]) -> RuleSet {
    ignore
        .iter()
        .fold(RuleSet::new(), |rules, key| rules.ignore(key.as_str()))
}

/// Resolve the launch description once: config file (or host default), then
/// explicit solver and shell overrides.
pub fn resolve_launch_config(
    solver: Option<&str>,
    shell: Option<&str>,
    launch_config: Option<&str>,
) -> Result<LaunchConfig> {
    let mut config = match launch_config {
        Some(path) => LaunchConfig::from_path(path)
            .with_context(|| format!("Failed to load launch config from {path}"))?,
        None => LaunchConfig::host_default(),
    };
    if let Some(solver) = solver {
        config.solver_path = solver.into();
    }
    if let Some(shell) = shell {
        config = config.with_shell(ShellWrapper::login(shell));
    }
    Ok(config)
}

/// Print a loaded result in the requested format.
pub fn print_result(result: &SimulationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_table(result),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result.to_records())
                .context("JSON serialization failed")?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&result.to_records())
                .context("YAML serialization failed")?;
            print!("{yaml}");
        }
    }
    Ok(())
}

/// Summary table: one line per observable with its sample count and final value.
pub fn print_table(result: &SimulationResult) {
    for kind in OutputKind::ALL {
        let data = result.data(kind);
        println!(
            "\n{} {} ({} observables)",
            style("✓").green().bold(),
            style(kind).bold(),
            data.len()
        );
        for (observable, series) in data {
            let last = series
                .last()
                .map(|(t, v)| format!("{v:>12.6} at t = {t}"))
                .unwrap_or_else(|| "no samples".to_string());
            println!(
                "  {:<16} {:>6} samples  {}",
                style(observable.to_string()).cyan(),
                series.len(),
                last
            );
        }
    }
}

/// Write all observables as pretty JSON.
pub fn export_json(result: &SimulationResult, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(&result.to_records())
        .context("JSON serialization failed")?;
    fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
    println!(
        "{} Exported {} observables to {}",
        style("→").cyan().bold(),
        result.len(),
        style(path).green()
    );
    Ok(())
}
