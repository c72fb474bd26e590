//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rowdb - a schema-driven record server over append-only CSV logs
#[derive(Parser, Debug)]
#[command(name = "rowdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the record server
    Serve {
        /// Directory holding _schemas.csv and the resource logs
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Address to bind the HTTP API to
        #[arg(long, default_value = "127.0.0.1:4000")]
        addr: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
