//! Lindblad MPO solver wrapper
//!
//! This crate drives the external `lindbladmpo` executable, which simulates
//! open quantum spin systems under Lindblad dynamics using matrix product
//! operators. It does not simulate anything itself; it prepares the run,
//! launches the solver and reads back what the solver wrote.
//!
//! # Overview
//!
//! A run goes through four stages:
//! - [`validate`]: check a [`Parameters`] set against the parameter schema,
//!   producing a multi-line diagnostic text
//! - [`input`]: write the `key = value` input file, converting site indices
//!   to 1-based and coupling matrices to sparse bond lists
//! - [`launch`]: start the solver through a [`Launcher`] and wait for its exit code
//! - [`output`]: parse the `.obs-1q.dat`, `.obs-2q.dat` and `.global.dat`
//!   files into a [`SimulationResult`]
//!
//! [`LindbladMpoSolver`] ties the stages together. [`analysis`] prepares
//! loaded results for plotting (time axes, connected correlations).
//!
//! # Example
//!
//! ```ignore
//! use lindblad_mpo::{LaunchConfig, LindbladMpoSolver, Parameters};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let params = Parameters::from_path("chain.yaml")?;
//!     let config = LaunchConfig::direct("/opt/lindbladmpo/bin/lindbladmpo");
//!
//!     let mut solver = LindbladMpoSolver::with_launch_config(params, config);
//!     let result = solver.solve().await?;
//!
//!     if let Some(z0) = result.one_qubit("z", 0) {
//!         println!("<Z_0>(t_final) = {:?}", z0.last());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Site indices
//!
//! Indices are 0-based everywhere in this crate and 1-based in the solver's
//! files. The conversion happens only in [`input`] and [`output`].

pub mod analysis;
pub mod error;
pub mod input;
pub mod launch;
pub mod output;
pub mod params;
pub mod solver;
pub mod validate;

pub use analysis::{
    SpaceTimeData, TimeGrid, connected_correlation, correlation_matrix, space_time_1q,
};
pub use error::{LindbladError, LindbladResult};
pub use input::{BondIndices, InputFile, bond_indices, build_input, render_input};
pub use launch::{LaunchConfig, Launcher, ProcessLauncher, ShellWrapper};
pub use output::{
    Observable, ObservableData, ObservableRecord, OutputKind, SimulationResult, TimeSeries,
    load_output, parse_data_file,
};
pub use params::{ParamValue, Parameters};
pub use solver::LindbladMpoSolver;
pub use validate::{Diagnostics, ParamIssue, Rule, RuleSet, check_parameters, verify_parameters};
