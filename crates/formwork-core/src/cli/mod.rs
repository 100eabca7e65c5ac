pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
/// Formwork CLI
///
/// Thin process wiring around the `formwork-core` library: opens the
/// database, runs schema and content migrations, and starts the background
/// workers. Routing and authentication live in an external HTTP collaborator.
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run schema migrations, bootstrap the admin account, and start
    /// background workers.
    Serve,

    /// Apply pending content-level data migrations and exit.
    Migrate,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
