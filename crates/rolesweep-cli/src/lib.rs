//! Rolesweep CLI - scan and removal front end for orphaned role assignments

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod providers;

pub use cli::Cli;
pub use error::{CliError, Result};
