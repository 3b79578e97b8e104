//! Command line interface

pub mod serve;

use clap::{Parser, Subcommand};

/// Hackathon registration and team formation API
#[derive(Parser)]
#[command(name = "hackathon-teams")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["hackathon-teams", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_unknown_command() {
        assert!(Cli::try_parse_from(["hackathon-teams", "ui"]).is_err());
    }
}
