//! Building the WMI data sources from the Wikibooks WMI page.
//!
//! The page holds both tables the seeder needs: a grid of two-character
//! region codes and the "List of Many WMIs" factory table. The page is
//! cached next to the data sources so repeated runs work offline, and
//! the parsed tables are written out as `wmi_region_codes.json` and
//! `wmi_factory_codes.json`.

mod factories;
mod regions;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch;

pub use factories::parse_factory_table;
pub use regions::{normalize_country_name, parse_region_table};

/// Switches for [`scrape_sources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Download the page if there is no cached copy.
    pub fetch: bool,
    /// Download the page even if a cached copy exists.
    pub refresh: bool,
}

/// Outcome of a scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeReport {
    /// Cached page the tables were read from.
    pub page: PathBuf,
    /// Whether the page was downloaded during this run.
    pub fetched: bool,
    /// Region ranges written.
    pub regions: usize,
    /// Factory rows written.
    pub factories: usize,
}

/// Read the page from `cache`, downloading it from `url` first when
/// there is no cached copy or `refresh` is set.
///
/// # Errors
///
/// Returns [`Error::SourceMissing`] if there is no cached copy and
/// `fetch` is false, or an error if the download or cache write fails.
pub fn load_page(cache: &Path, url: &str, fetch: bool, refresh: bool) -> Result<String> {
    if cache.exists() && !refresh {
        info!("Using cached page {}", cache.display());
        return Ok(std::fs::read_to_string(cache)?);
    }
    if !fetch && !refresh {
        return Err(Error::SourceMissing {
            path: cache.to_path_buf(),
        });
    }

    fetch::download_to(url, cache)?;
    Ok(std::fs::read_to_string(cache)?)
}

/// Write `value` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns [`Error::Json`] if `value` cannot be serialized, or an I/O
/// error if the file cannot be written.
pub fn write_source<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json)?;
    Ok(())
}

/// Scrape the region and factory tables and write both JSON sources.
///
/// # Errors
///
/// Returns an error if the page cannot be loaded, a table is missing or
/// empty, or an output file cannot be written.
pub fn scrape_sources(config: &Config, options: &ScrapeOptions) -> Result<ScrapeReport> {
    let cache = config.wmi_page_cache_path();
    let fetched = options.refresh || (!cache.exists() && options.fetch);
    let html = load_page(
        &cache,
        &config.sources.wmi_page_url,
        options.fetch,
        options.refresh,
    )?;

    let regions = parse_region_table(&html)?;
    if regions.is_empty() {
        return Err(Error::scrape("regions", "the region table has no codes"));
    }
    let factories = parse_factory_table(&html)?;
    if factories.is_empty() {
        return Err(Error::scrape("factories", "the factory table has no rows"));
    }

    write_source(&config.regions_path(), &regions)?;
    info!(
        "Wrote {} region ranges to {}",
        regions.len(),
        config.regions_path().display()
    );
    write_source(&config.factories_path(), &factories)?;
    info!(
        "Wrote {} factory rows to {}",
        factories.len(),
        config.factories_path().display()
    );

    Ok(ScrapeReport {
        page: cache,
        fetched,
        regions: regions.len(),
        factories: factories.len(),
    })
}
