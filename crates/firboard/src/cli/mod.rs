//! Command-line interface for firboard.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, FieldArg, NormalizeCommand, ServeCommand};

use crate::logging::Verbosity;

/// firboard - shared flight board for a flight-information region
///
/// Merges periodic feed snapshots with operator corrections and keeps every
/// connected viewer on the same board.
#[derive(Debug, Parser)]
#[command(name = "firboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the board service
    Serve(ServeCommand),

    /// Show how an operator entry would be stored
    Normalize(NormalizeCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "firboard");
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["firboard", "-q", "serve"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["firboard", "serve"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["firboard", "-v", "serve"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["firboard", "-vv", "serve"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = parse(&[
            "firboard",
            "serve",
            "--bind",
            "0.0.0.0:4000",
            "--inbound",
            "/srv/in.json",
        ]);
        match cli.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.bind.as_deref(), Some("0.0.0.0:4000"));
                assert_eq!(cmd.inbound, Some(PathBuf::from("/srv/in.json")));
                assert!(cmd.outbound.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_normalize() {
        let cli = parse(&["firboard", "normalize", "mach", "0.845"]);
        match cli.command {
            Command::Normalize(cmd) => {
                assert_eq!(cmd.field, FieldArg::Mach);
                assert_eq!(cmd.raw, "0.845");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["firboard", "-c", "/custom/config.toml", "config", "path"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }
}
