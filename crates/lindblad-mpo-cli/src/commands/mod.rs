//! CLI command implementations.

pub mod build;
pub mod common;
pub mod correlations;
pub mod run;
pub mod show;
pub mod verify;
pub mod version;
