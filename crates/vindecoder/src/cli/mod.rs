//! Command-line interface for vindecoder.
//!
//! This module provides the CLI structure for the `vind` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DecodeCommand, FactoriesCommand, GenerateCommand, InspectCommand,
    LogosCommand, RegionsCommand, ScrapeCommand, SeedCommand, ServeCommand, StatusCommand,
};

/// vind - World Manufacturer Identifier database and VIN decoder
///
/// Scrapes and seeds a SQLite database of WMI codes from public data
/// sources, matches manufacturer logos, and decodes VINs from the command
/// line or over HTTP.
#[derive(Debug, Parser)]
#[command(name = "vind")]
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
    /// Create the data directories and an empty database
    Init,

    /// Rebuild the database from the data sources
    Seed(SeedCommand),

    /// Scrape the WMI region and factory sources from the WMI page
    Scrape(ScrapeCommand),

    /// Decode a VIN
    Decode(DecodeCommand),

    /// Generate random VINs with valid check digits
    Generate(GenerateCommand),

    /// List factories and their logos
    Factories(FactoriesCommand),

    /// Manage manufacturer logos
    #[command(subcommand)]
    Logos(LogosCommand),

    /// Manage region icons
    #[command(subcommand)]
    Regions(RegionsCommand),

    /// Show schema and sample rows of every table
    Inspect(InspectCommand),

    /// Show database status
    Status(StatusCommand),

    /// Run the HTTP API
    Serve(ServeCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "vind");
    }

    #[test]
    fn test_verbosity() {
        use crate::logging::Verbosity;

        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_decode() {
        let cli = Cli::try_parse_from(["vind", "decode", "1HGCM82633A004352", "--json"]).unwrap();
        match cli.command {
            Command::Decode(cmd) => {
                assert_eq!(cmd.vin, "1HGCM82633A004352");
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_decode_requires_vin() {
        assert!(Cli::try_parse_from(["vind", "decode"]).is_err());
    }

    #[test]
    fn test_parse_seed_flags() {
        let cli = Cli::try_parse_from(["vind", "seed", "--no-fetch", "--skip-logos"]).unwrap();
        match cli.command {
            Command::Seed(cmd) => {
                assert!(cmd.no_fetch);
                assert!(cmd.skip_logos);
                assert!(!cmd.scrape);
                assert!(!cmd.skip_region_icons);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_generate_count() {
        let cli = Cli::try_parse_from(["vind", "generate", "--count", "3"]).unwrap();
        match cli.command {
            Command::Generate(cmd) => {
                assert_eq!(cmd.count, 3);
                assert!(cmd.seed.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_logos_import() {
        let cli = Cli::try_parse_from(["vind", "logos", "import"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Logos(LogosCommand::Import { json: false })
        ));
    }

    #[test]
    fn test_parse_scrape() {
        let cli = Cli::try_parse_from(["vind", "scrape", "--refresh", "--json"]).unwrap();
        match cli.command {
            Command::Scrape(cmd) => {
                assert!(cmd.refresh);
                assert!(!cmd.no_fetch);
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scrape_refresh_conflicts_with_no_fetch() {
        assert!(Cli::try_parse_from(["vind", "scrape", "--refresh", "--no-fetch"]).is_err());
    }

    #[test]
    fn test_parse_regions_import() {
        let cli = Cli::try_parse_from(["vind", "regions", "import", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Regions(RegionsCommand::Import { json: true })
        ));
    }

    #[test]
    fn test_parse_inspect_default_rows() {
        let cli = Cli::try_parse_from(["vind", "inspect"]).unwrap();
        match cli.command {
            Command::Inspect(cmd) => assert_eq!(cmd.rows, 5),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli =
            Cli::try_parse_from(["vind", "serve", "--bind", "0.0.0.0", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.bind.as_deref(), Some("0.0.0.0"));
                assert_eq!(cmd.port, Some(8080));
                assert!(cmd.workers.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["vind", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let cli = Cli::try_parse_from(["vind", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::try_parse_from(["vind", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }
}
