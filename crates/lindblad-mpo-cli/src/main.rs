//! lindbladmpo command-line interface
//!
//! Validates parameter files, writes solver input files, runs the external
//! `lindbladmpo` solver and displays its observables.
//!
//! ```text
//! lmpo verify chain.yaml
//! lmpo run chain.yaml --solver /opt/lindbladmpo/bin/lindbladmpo
//! lmpo show out/chain --format json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{build, correlations, run, show, verify, version};

/// lmpo - run open quantum system simulations with the lindbladmpo solver
#[derive(Parser)]
#[command(name = "lmpo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a parameter file and report every problem found
    Verify {
        /// Parameter file (YAML or JSON)
        params: String,

        /// Accept this key without checking it (repeatable)
        #[arg(long = "ignore", value_name = "KEY")]
        ignore: Vec<String>,
    },

    /// Validate a parameter file and write the solver input file
    Build {
        /// Parameter file (YAML or JSON)
        params: String,

        /// Accept this key without checking it (repeatable)
        #[arg(long = "ignore", value_name = "KEY")]
        ignore: Vec<String>,
    },

    /// Build the input file, run the solver and load its output
    Run {
        /// Parameter file (YAML or JSON)
        params: String,

        /// Path of the solver executable (overrides --launch-config)
        #[arg(long)]
        solver: Option<String>,

        /// Run the solver through this login shell (e.g. cygwin bash)
        #[arg(long, env = "LINDBLADMPO_SHELL")]
        shell: Option<String>,

        /// YAML launch description (solver_path, shell)
        #[arg(long)]
        launch_config: Option<String>,

        /// Output format (table, json, yaml)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write all observables as JSON to this file
        #[arg(short, long)]
        export: Option<String>,

        /// Accept this key without checking it (repeatable)
        #[arg(long = "ignore", value_name = "KEY")]
        ignore: Vec<String>,
    },

    /// Display the output files of a finished run
    Show {
        /// Output prefix of the run (as in output_files_prefix)
        prefix: String,

        /// Output format (table, json, yaml)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write all observables as JSON to this file
        #[arg(short, long)]
        export: Option<String>,
    },

    /// Print the connected two-site correlation matrix of a finished run
    Correlations {
        /// Output prefix of the run (as in output_files_prefix)
        prefix: String,

        /// Number of sites
        #[arg(short = 'n', long)]
        sites: usize,

        /// Two-site observable (xx, yy, zz, xy, ...)
        #[arg(long, default_value = "zz")]
        name: String,

        /// Time at which to evaluate (defaults to the last sample)
        #[arg(short, long)]
        time: Option<f64>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Verify { params, ignore } => verify::execute(&params, &ignore),

        Commands::Build { params, ignore } => build::execute(&params, &ignore),

        Commands::Run {
            params,
            solver,
            shell,
            launch_config,
            format,
            export,
            ignore,
        } => {
            run::execute(
                &params,
                solver.as_deref(),
                shell.as_deref(),
                launch_config.as_deref(),
                &format,
                export.as_deref(),
                &ignore,
            )
            .await
        }

        Commands::Show {
            prefix,
            format,
            export,
        } => show::execute(&prefix, &format, export.as_deref()),

        Commands::Correlations {
            prefix,
            sites,
            name,
            time,
        } => correlations::execute(&prefix, sites, &name, time),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
