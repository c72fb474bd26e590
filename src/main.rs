//! rowdb CLI entry point
//!
//! main.rs only parses arguments and dispatches to CLI commands; it never
//! calls subsystems directly.

use std::process;

use rowdb::cli::{run_command, Cli};
use rowdb::observability::{Logger, Severity};

fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = run_command(cli.command) {
        Logger::log_stderr(Severity::Fatal, "rowdb.exit", &[("error", &e.to_string())]);
        process::exit(1);
    }
}
