//! CLI subsystem for rowdb

mod args;
mod commands;

pub use args::{Cli, Command};
pub use commands::{run_command, CliError};
