//! The solver facade: validate, write input, run, load results.

use tracing::info;

use crate::error::{LindbladError, LindbladResult};
use crate::input::{InputFile, build_input};
use crate::launch::{LaunchConfig, Launcher, ProcessLauncher};
use crate::output::{SimulationResult, load_output};
use crate::params::Parameters;
use crate::validate::{RuleSet, verify_parameters};

/// Runs one parameter set through the external solver.
///
/// ```no_run
/// # async fn run() -> lindblad_mpo::LindbladResult<()> {
/// use lindblad_mpo::{LindbladMpoSolver, Parameters};
///
/// let params = Parameters::new()
///     .with("N", 4)
///     .with("t_final", 1.0)
///     .with("tau", 0.01)
///     .with("output_files_prefix", "out/run");
/// let mut solver = LindbladMpoSolver::new(params);
/// let result = solver.solve().await?;
/// println!("{} observables", result.len());
/// # Ok(())
/// # }
/// ```
pub struct LindbladMpoSolver<L: Launcher = ProcessLauncher> {
    parameters: Parameters,
    rules: RuleSet,
    launcher: L,
    input: Option<InputFile>,
    result: Option<SimulationResult>,
}

impl LindbladMpoSolver<ProcessLauncher> {
    /// A solver using the host's default launch configuration.
    pub fn new(parameters: Parameters) -> Self {
        Self::with_launcher(parameters, ProcessLauncher::default())
    }

    pub fn with_launch_config(parameters: Parameters, config: LaunchConfig) -> Self {
        Self::with_launcher(parameters, ProcessLauncher::new(config))
    }
}

impl<L: Launcher> LindbladMpoSolver<L> {
    pub fn with_launcher(parameters: Parameters, launcher: L) -> Self {
        Self {
            parameters,
            rules: RuleSet::default(),
            launcher,
            input: None,
            result: None,
        }
    }

    /// Replace the validation rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Replace the parameters, discarding any built input and loaded result.
    pub fn set_parameters(&mut self, parameters: Parameters) {
        self.parameters = parameters;
        self.input = None;
        self.result = None;
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Diagnostic text for the current parameters; empty when valid.
    pub fn verify(&self) -> String {
        verify_parameters(&self.parameters, &self.rules)
    }

    /// Validate the parameters and write the solver input file.
    pub fn build(&mut self) -> LindbladResult<&InputFile> {
        let input = build_input(&self.parameters, &self.rules)?;
        self.result = None;
        Ok(self.input.insert(input))
    }

    /// Run the solver and load its output.
    ///
    /// Builds the input file first if [`build`](Self::build) has not been
    /// called. A non-zero exit code fails without touching the output files.
    pub async fn solve(&mut self) -> LindbladResult<&SimulationResult> {
        let input = match &self.input {
            Some(input) => input.clone(),
            None => self.build()?.clone(),
        };

        let exit_code = self.launcher.execute(&input.input_path).await?;
        if exit_code != 0 {
            return Err(LindbladError::SolverFailed { exit_code });
        }

        let result = load_output(&input.output_prefix)?;
        info!(
            "Loaded {} observables from {}",
            result.len(),
            input.output_prefix
        );
        Ok(self.result.insert(result))
    }

    /// The most recently built input file.
    pub fn input(&self) -> Option<&InputFile> {
        self.input.as_ref()
    }

    /// The most recently loaded result.
    pub fn result(&self) -> Option<&SimulationResult> {
        self.result.as_ref()
    }

    /// Take ownership of the loaded result.
    pub fn into_result(self) -> Option<SimulationResult> {
        self.result
    }
}
