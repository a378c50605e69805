//! Run command implementation.

use std::time::Instant;

use anyhow::Result;
use console::style;
use tracing::info;

use lindblad_mpo::LindbladMpoSolver;

use super::common::{
    OutputFormat, export_json, load_parameters, print_result, resolve_launch_config, rule_set,
};

/// Execute the run command.
pub async fn execute(
    path: &str,
    solver: Option<&str>,
    shell: Option<&str>,
    launch_config: Option<&str>,
    format: &str,
    export: Option<&str>,
    ignore: &[String],
) -> Result<()> {
    let format = OutputFormat::parse(format)?;
    let params = load_parameters(path)?;
    let config = resolve_launch_config(solver, shell, launch_config)?;
    info!("Solver: {}", config.solver_path.display());

    println!(
        "{} Running {} with {}",
        style("→").cyan().bold(),
        style(path).green(),
        style(config.solver_path.display()).yellow()
    );

    let mut solver =
        LindbladMpoSolver::with_launch_config(params, config).with_rules(rule_set(ignore));

    let input = solver.build()?;
    println!("  Input file: {}", input.input_path.display());

    let start = Instant::now();
    let result = solver.solve().await?;
    let elapsed = start.elapsed();

    print_result(result, format)?;
    println!(
        "\n  Solver time: {}",
        style(format!("{:.2} s", elapsed.as_secs_f64())).yellow()
    );

    if let Some(export) = export {
        export_json(result, export)?;
    }

    Ok(())
}
