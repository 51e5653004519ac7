//! Command-line front end for the outbox store
//!
//! Every invocation opens the namespace for `--endpoint` under `--dir`,
//! runs one command, tears the store down and prints the result as JSON.

pub mod commands;
pub mod config;

pub use commands::run;
pub use config::{Cli, Command};
