//! CLI module for Workflow Bridge

pub mod serve;

use clap::{Parser, Subcommand};

/// Workflow Bridge - deploy, synchronize and auto-remediate workflows on a
/// remote execution engine
#[derive(Parser)]
#[command(name = "workflow-bridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,
}
