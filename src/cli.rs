// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: A single `run` subcommand driving one pipeline invocation.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Multi-stage deployment pipeline with rollback snapshots")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print the final report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the deployment pipeline against an environment
    Run {
        /// Target environment (declared in config)
        environment: String,

        /// Commit being deployed
        #[arg(short, long)]
        revision: String,

        /// Validate and build without deploying
        #[arg(long)]
        dry_run: bool,

        /// Identifier of this run (generated when absent)
        #[arg(long)]
        run_id: Option<String>,
    },
}
