//! `vindecoder` - World Manufacturer Identifier database and VIN decoder
//!
//! This library scrapes and seeds a SQLite database of WMI codes,
//! countries and manufacturer logos from public data sources, and decodes
//! or generates VINs against it.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod decoder;
pub mod error;
pub mod fetch;
pub mod icons;
pub mod images;
pub mod logging;
pub mod logos;
pub mod scrape;
pub mod seed;
pub mod server;
pub mod storage;
pub mod vin;
pub mod wmi;

pub use config::Config;
pub use decoder::{DecodedVin, Decoder};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{Storage, StorageStats};
pub use vin::{Vin, VinError};
