//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Seed command arguments.
#[derive(Debug, Args)]
pub struct SeedCommand {
    /// Never download the country dataset or the WMI page
    #[arg(long)]
    pub no_fetch: bool,

    /// Scrape the WMI sources again even if both JSON files exist
    #[arg(long)]
    pub scrape: bool,

    /// Skip matching and importing logos
    #[arg(long)]
    pub skip_logos: bool,

    /// Skip building the region icons
    #[arg(long)]
    pub skip_region_icons: bool,

    /// Output the report as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Scrape command arguments.
#[derive(Debug, Args)]
pub struct ScrapeCommand {
    /// Download the WMI page even if a cached copy exists
    #[arg(long)]
    pub refresh: bool,

    /// Only use the cached WMI page
    #[arg(long, conflicts_with = "refresh")]
    pub no_fetch: bool,

    /// Output the report as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Decode command arguments.
#[derive(Debug, Args)]
pub struct DecodeCommand {
    /// The 17-character VIN to decode
    pub vin: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Generate command arguments.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Number of VINs to generate
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Seed the random generator for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Factories command arguments.
#[derive(Debug, Args)]
pub struct FactoriesCommand {
    /// Only list factories without a logo
    #[arg(short, long)]
    pub missing_logos: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Logo commands.
#[derive(Debug, Subcommand)]
pub enum LogosCommand {
    /// Match logo files to factories and write their thumbnails
    Import {
        /// Output the report as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Region icon commands.
#[derive(Debug, Subcommand)]
pub enum RegionsCommand {
    /// Convert the region images into square icons
    Import {
        /// Output the report as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Inspect command arguments.
#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Sample rows shown per table
    #[arg(short, long, default_value = "5")]
    pub rows: usize,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides `server.bind`)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Worker threads (overrides `server.workers`)
    #[arg(short, long)]
    pub workers: Option<usize>,
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
