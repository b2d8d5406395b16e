//! CLI module for PCP Assist
//!
//! - `serve`: run the conversation API server

pub mod serve;

use clap::{Parser, Subcommand};

/// PCP Assist - resumable PCP assignment and specialist search conversations
#[derive(Parser)]
#[command(name = "pcp-assist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve(serve::ServeArgs),
}
