//! Configuration management for vindecoder.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "vindecoder";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "vin.db";

/// Directory (under the data dir) holding the JSON data sources.
const SOURCES_DIR_NAME: &str = "public_data_sources";

/// Upstream location of the country dataset.
pub const DEFAULT_COUNTRIES_URL: &str =
    "https://raw.githubusercontent.com/mledoze/countries/master/countries.json";

/// Wikibooks page listing the WMI region and factory tables.
pub const DEFAULT_WMI_PAGE_URL: &str = "https://en.wikibooks.org/wiki/Vehicle_Identification_Numbers_(VIN_codes)/World_Manufacturer_Identifier_(WMI)";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `VINDECODER_`, sections split by `__`)
/// 2. TOML config file at `~/.config/vindecoder/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Data source configuration.
    pub sources: SourcesConfig,
    /// Logo import configuration.
    pub logos: LogosConfig,
    /// Region icon import configuration.
    pub region_icons: RegionIconsConfig,
    /// HTTP server configuration.
    pub server: ServerConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/vindecoder/vin.db`
    pub database_path: Option<PathBuf>,
}

/// Locations of the JSON data sources used for seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Directory holding the source files.
    /// Defaults to `~/.local/share/vindecoder/public_data_sources`
    pub directory: Option<PathBuf>,
    /// Country dataset file name (mledoze/countries format).
    pub countries_file: String,
    /// WMI region range file name.
    pub regions_file: String,
    /// WMI factory code file name.
    pub factories_file: String,
    /// Download the country dataset when the file is missing.
    pub fetch_countries: bool,
    /// Where to download the country dataset from.
    pub countries_url: String,
    /// Page the WMI region and factory tables are scraped from.
    pub wmi_page_url: String,
    /// File name the scraped page is cached under.
    pub wmi_page_cache: String,
    /// Download the WMI page when no cached copy exists.
    pub fetch_wmi_page: bool,
}

/// Logo import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogosConfig {
    /// Directory of brand logo files to match against factories.
    /// Defaults to `<sources>/brands`
    pub source_dir: Option<PathBuf>,
    /// Directory the logo thumbnails are written to and served from.
    /// Defaults to `~/.local/share/vindecoder/img/logos`
    pub output_dir: Option<PathBuf>,
    /// Accepted logo file extensions, including the dot.
    pub extensions: Vec<String>,
    /// Extra search terms per brand name.
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Height in pixels of the PNG thumbnails written for each logo.
    pub thumbnail_height: u32,
}

/// Region icon import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionIconsConfig {
    /// Directory of region images.
    /// Defaults to `<sources>/regions`
    pub source_dir: Option<PathBuf>,
    /// Directory the square icons are written to and served from.
    /// Defaults to `~/.local/share/vindecoder/img/regions`
    pub output_dir: Option<PathBuf>,
    /// Accepted image file extensions, including the dot.
    pub extensions: Vec<String>,
    /// Edge length in pixels of the square icons.
    pub size: u32,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Number of worker threads; 0 lets actix pick one per core.
    pub workers: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            directory: None,
            countries_file: "countries.json".to_string(),
            regions_file: "wmi_region_codes.json".to_string(),
            factories_file: "wmi_factory_codes.json".to_string(),
            fetch_countries: true,
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            wmi_page_url: DEFAULT_WMI_PAGE_URL.to_string(),
            wmi_page_cache: "wmi_wikipedia_page.html".to_string(),
            fetch_wmi_page: true,
        }
    }
}

impl Default for LogosConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            output_dir: None,
            extensions: vec![
                ".png".to_string(),
                ".jpg".to_string(),
                ".jpeg".to_string(),
                ".svg".to_string(),
            ],
            aliases: default_brand_aliases(),
            thumbnail_height: 100,
        }
    }
}

impl Default for RegionIconsConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            output_dir: None,
            extensions: vec![".png".to_string(), ".jpg".to_string(), ".jpeg".to_string()],
            size: 50,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
            workers: 0,
        }
    }
}

/// Brand names whose factories are commonly listed under another name.
fn default_brand_aliases() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        ("general motors".to_string(), vec!["gm".to_string()]),
        ("volkswagen".to_string(), vec!["vw".to_string()]),
        (
            "international trucks".to_string(),
            vec!["international incomplete bus".to_string()],
        ),
    ])
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("VINDECODER_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::ConfigValidation {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        for (name, url) in [
            ("countries_url", &self.sources.countries_url),
            ("wmi_page_url", &self.sources.wmi_page_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::ConfigValidation {
                    message: format!("sources.{name} is not an http(s) URL: {url}"),
                });
            }
        }

        for (name, file) in [
            ("countries_file", &self.sources.countries_file),
            ("regions_file", &self.sources.regions_file),
            ("factories_file", &self.sources.factories_file),
            ("wmi_page_cache", &self.sources.wmi_page_cache),
        ] {
            if file.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("sources.{name} must not be empty"),
                });
            }
        }

        for (name, extensions) in [
            ("logos", &self.logos.extensions),
            ("region_icons", &self.region_icons.extensions),
        ] {
            if extensions.is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("{name}.extensions must list at least one extension"),
                });
            }
            if let Some(ext) = extensions.iter().find(|e| !e.starts_with('.')) {
                return Err(Error::ConfigValidation {
                    message: format!("{name} extension must start with '.': {ext}"),
                });
            }
        }

        if self.logos.thumbnail_height == 0 {
            return Err(Error::ConfigValidation {
                message: "logos.thumbnail_height must be greater than 0".to_string(),
            });
        }
        if self.region_icons.size == 0 {
            return Err(Error::ConfigValidation {
                message: "region_icons.size must be greater than 0".to_string(),
            });
        }

        if self.logos.aliases.keys().any(|k| k.trim().is_empty()) {
            return Err(Error::ConfigValidation {
                message: "logos.aliases keys must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the data source directory, resolving defaults if not set.
    #[must_use]
    pub fn sources_dir(&self) -> PathBuf {
        self.sources
            .directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SOURCES_DIR_NAME))
    }

    /// Path of the country dataset.
    #[must_use]
    pub fn countries_path(&self) -> PathBuf {
        self.sources_dir().join(&self.sources.countries_file)
    }

    /// Path of the WMI region range file.
    #[must_use]
    pub fn regions_path(&self) -> PathBuf {
        self.sources_dir().join(&self.sources.regions_file)
    }

    /// Path of the WMI factory code file.
    #[must_use]
    pub fn factories_path(&self) -> PathBuf {
        self.sources_dir().join(&self.sources.factories_file)
    }

    /// Cached copy of the WMI page.
    #[must_use]
    pub fn wmi_page_cache_path(&self) -> PathBuf {
        self.sources_dir().join(&self.sources.wmi_page_cache)
    }

    /// Directory of brand logos to import.
    #[must_use]
    pub fn logo_source_dir(&self) -> PathBuf {
        self.logos
            .source_dir
            .clone()
            .unwrap_or_else(|| self.sources_dir().join("brands"))
    }

    /// Directory imported logos are written to.
    #[must_use]
    pub fn logo_output_dir(&self) -> PathBuf {
        self.logos
            .output_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("img").join("logos"))
    }

    /// Directory of region images to import.
    #[must_use]
    pub fn region_icon_source_dir(&self) -> PathBuf {
        self.region_icons
            .source_dir
            .clone()
            .unwrap_or_else(|| self.sources_dir().join("regions"))
    }

    /// Directory region icons are written to.
    #[must_use]
    pub fn region_icon_output_dir(&self) -> PathBuf {
        self.region_icons
            .output_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("img").join("regions"))
    }
}
