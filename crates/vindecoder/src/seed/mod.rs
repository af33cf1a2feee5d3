//! Database seeding from the public JSON data sources.
//!
//! Seeding rebuilds the database from scratch in a fixed order: countries,
//! WMI region codes, the `Unknown` fill for unassigned region codes,
//! factories, and finally logos. Missing WMI sources are scraped first.
//! Each step runs in its own transaction and returns a [`StepReport`];
//! problems with individual entries are collected in the report instead
//! of aborting the step. Region icons are rebuilt at the end.

mod countries;
mod factories;
mod fill;
mod regions;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::icons::{self, RegionIconReport};
use crate::logos::{self, LogoImportReport};
use crate::scrape::{self, ScrapeOptions, ScrapeReport};
use crate::storage::{Storage, StorageStats};

pub use countries::{download_countries, load_countries, seed_countries, CountryRecord};
pub use factories::{seed_factories, FactoryEntry};
pub use fill::fill_missing_regions;
pub use regions::{seed_regions, RegionEntry};

/// Number of collected errors echoed to the log per step.
const LOGGED_ERRORS: usize = 10;

/// Outcome of one seeding step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Step name.
    pub step: &'static str,
    /// Rows inserted.
    pub inserted: usize,
    /// Rows updated in place.
    pub updated: usize,
    /// Entries skipped because they already existed or were unusable.
    pub skipped: usize,
    /// Problems with individual entries.
    pub errors: Vec<String>,
}

impl StepReport {
    fn new(step: &'static str) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    fn error(&mut self, message: String) {
        warn!(step = self.step, "{message}");
        self.errors.push(message);
    }

    fn log_summary(&self) {
        info!(
            step = self.step,
            inserted = self.inserted,
            updated = self.updated,
            skipped = self.skipped,
            errors = self.errors.len(),
            "Seed step finished"
        );
        for error in self.errors.iter().take(LOGGED_ERRORS) {
            warn!(step = self.step, "  {error}");
        }
        if self.errors.len() > LOGGED_ERRORS {
            warn!(
                step = self.step,
                "  ... and {} more",
                self.errors.len() - LOGGED_ERRORS
            );
        }
    }
}

/// Switches for [`run_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    /// Download the country dataset if it is missing.
    pub fetch_countries: bool,
    /// Download the WMI page if it is needed and not cached.
    pub fetch_wmi_page: bool,
    /// Scrape the WMI sources even if both JSON files exist.
    pub scrape: bool,
    /// Skip the logo import step.
    pub skip_logos: bool,
    /// Skip the region icon import step.
    pub skip_region_icons: bool,
}

impl SeedOptions {
    /// Options taken from the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_countries: config.sources.fetch_countries,
            fetch_wmi_page: config.sources.fetch_wmi_page,
            scrape: false,
            skip_logos: false,
            skip_region_icons: false,
        }
    }
}

/// Outcome of a full seeding run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Scrape report, if the WMI sources were scraped.
    pub scrape: Option<ScrapeReport>,
    /// Reports of the table-seeding steps, in order.
    pub steps: Vec<StepReport>,
    /// Logo import report, if the step ran.
    pub logos: Option<LogoImportReport>,
    /// Region icon report, if the step ran.
    pub region_icons: Option<RegionIconReport>,
    /// Final row counts.
    pub stats: StorageStats,
}

/// Read and parse a JSON data source, returning it with its BLAKE3 hash.
///
/// # Errors
///
/// Returns [`Error::SourceMissing`] if the file does not exist and
/// [`Error::SourceParse`] if it is not valid JSON of the expected shape.
pub fn read_source<T: DeserializeOwned>(path: &Path) -> Result<(T, String)> {
    if !path.exists() {
        return Err(Error::SourceMissing {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    let hash = blake3::hash(&bytes).to_hex().to_string();
    let value = serde_json::from_slice(&bytes).map_err(|source| Error::SourceParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((value, hash))
}

/// Whether [`run_all`] should scrape the WMI sources first.
///
/// Scraping is forced by [`SeedOptions::scrape`]. Otherwise it happens
/// when a JSON source is missing and the page is cached or may be
/// fetched.
#[must_use]
pub fn needs_scrape(config: &Config, options: &SeedOptions) -> bool {
    if options.scrape {
        return true;
    }
    let missing = !config.regions_path().exists() || !config.factories_path().exists();
    missing && (options.fetch_wmi_page || config.wmi_page_cache_path().exists())
}

/// Rebuild the database at the configured path from the data sources.
///
/// The existing database is deleted first.
///
/// # Errors
///
/// Returns an error if a data source is missing or malformed, a
/// download or scrape fails, or a database operation fails.
pub fn run_all(config: &Config, options: &SeedOptions) -> Result<SeedReport> {
    let scrape = if needs_scrape(config, options) {
        let scrape_options = ScrapeOptions {
            fetch: options.fetch_wmi_page,
            refresh: false,
        };
        Some(scrape::scrape_sources(config, &scrape_options)?)
    } else {
        None
    };

    let storage = Storage::reset(config.database_path())?;
    let mut steps = Vec::new();

    let (records, hash) = load_countries(
        &config.countries_path(),
        options.fetch_countries,
        &config.sources.countries_url,
    )?;
    let report = seed_countries(&storage, &records)?;
    report.log_summary();
    storage.record_source_hash("countries", &hash)?;
    steps.push(report);

    let (entries, hash) = read_source::<Vec<RegionEntry>>(&config.regions_path())?;
    let report = seed_regions(&storage, &entries)?;
    report.log_summary();
    storage.record_source_hash("regions", &hash)?;
    steps.push(report);

    let report = fill_missing_regions(&storage)?;
    report.log_summary();
    steps.push(report);

    let (entries, hash) = read_source::<Vec<FactoryEntry>>(&config.factories_path())?;
    let report = seed_factories(&storage, &entries)?;
    report.log_summary();
    storage.record_source_hash("factories", &hash)?;
    steps.push(report);

    let logos = if options.skip_logos {
        info!("Skipping logo import");
        None
    } else if config.logo_source_dir().is_dir() {
        Some(logos::import(&storage, config)?)
    } else {
        info!(
            "No logo directory at {}, skipping logo import",
            config.logo_source_dir().display()
        );
        None
    };

    let region_icons = if options.skip_region_icons {
        info!("Skipping region icons");
        None
    } else if config.region_icon_source_dir().is_dir() {
        Some(icons::import_region_icons(config)?)
    } else {
        info!(
            "No region image directory at {}, skipping region icons",
            config.region_icon_source_dir().display()
        );
        None
    };

    storage.set_metadata("seeded_at", &chrono::Utc::now().to_rfc3339())?;

    Ok(SeedReport {
        scrape,
        steps,
        logos,
        region_icons,
        stats: storage.stats()?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::storage::{Country, Storage};

    /// A country row with the given code and common name.
    pub fn country(iso: &str, name: &str, region: &str) -> Country {
        Country {
            iso_alpha2: iso.to_string(),
            name: name.to_string(),
            common_name: Some(name.to_string()),
            region: Some(region.to_string()),
            flag_emoji: Some(format!("flag-{iso}")),
            ..Country::default()
        }
    }

    /// Storage with a few countries and the `Unknown` entry.
    pub fn storage_with_countries() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        for (iso, name, region) in [
            ("US", "United States", "North America"),
            ("JP", "Japan", "Asia"),
            ("DE", "Germany", "Europe"),
            ("CZ", "Czechia", "Europe"),
        ] {
            storage.insert_country(&country(iso, name, region)).unwrap();
        }
        storage.ensure_unknown_country().unwrap();
        storage
    }
}
