//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - front end for the lindbladmpo solver",
        style("lmpo").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  lindblad-mpo      Validation, input files, solver launch, output loading");
    println!("  lindblad-mpo-cli  Command-line interface");
    println!();
    println!(
        "Solver path override: {}",
        style(lindblad_mpo::launch::SOLVER_PATH_ENV).dim()
    );
    println!("License:              {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
