//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::flight::ManualField;

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides `server.bind`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// JSON file with the inbound feed snapshot (overrides `feed.inbound_path`)
    #[arg(long, value_name = "FILE")]
    pub inbound: Option<PathBuf>,

    /// JSON file with the outbound feed snapshot (overrides `feed.outbound_path`)
    #[arg(long, value_name = "FILE")]
    pub outbound: Option<PathBuf>,
}

/// Normalize command arguments.
#[derive(Debug, Args)]
pub struct NormalizeCommand {
    /// Which cell the entry was typed into
    #[arg(value_enum)]
    pub field: FieldArg,

    /// The raw entry
    pub raw: String,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Editable free-text cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldArg {
    /// Pilot estimate (HHMM)
    PilotEstimate,
    /// Flight level
    Altitude,
    /// Mach number
    Mach,
}

impl From<FieldArg> for ManualField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::PilotEstimate => Self::PilotEstimate,
            FieldArg::Altitude => Self::Altitude,
            FieldArg::Mach => Self::Mach,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_arg_conversion() {
        assert_eq!(
            ManualField::from(FieldArg::PilotEstimate),
            ManualField::PilotEstimate
        );
        assert_eq!(ManualField::from(FieldArg::Altitude), ManualField::Altitude);
        assert_eq!(ManualField::from(FieldArg::Mach), ManualField::Mach);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
