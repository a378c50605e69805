//! Error handling for the solver wrapper.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for solver wrapper operations.
pub type LindbladResult<T> = Result<T, LindbladError>;

/// Errors that can occur while preparing, running or reading a simulation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LindbladError {
    /// The parameter set failed validation. Carries the full diagnostic text.
    #[error("Invalid parameters:\n{0}")]
    InvalidParameters(String),

    /// The two coupling matrices do not have the same shape.
    #[error("J and J_z are not of the same size: {first:?} vs {second:?}")]
    ShapeMismatch {
        first: Vec<usize>,
        second: Vec<usize>,
    },

    /// The solver ran but reported failure.
    #[error("Solver terminated with exit code {exit_code}")]
    SolverFailed { exit_code: i32 },

    /// The solver process could not be started.
    #[error("Failed to launch solver: {command} - {message}")]
    Launch { command: String, message: String },

    /// A solver output file contained a malformed row.
    #[error("Parse error in {}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}
