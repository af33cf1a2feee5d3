//! Error types for vindecoder.
//!
//! This module defines the crate-wide error type. VIN validation failures
//! have their own [`VinError`] so callers can report them to users
//! without treating them as internal failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::vin::VinError;

/// The main error type for vindecoder operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Data Source Errors ===
    /// A required data source file is missing.
    #[error("data source not found: {path}")]
    SourceMissing {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// A data source could not be parsed.
    #[error("failed to parse data source {path}: {source}")]
    SourceParse {
        /// Path of the offending file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Downloading a remote data source failed.
    #[error("failed to download {url}: {source}")]
    Download {
        /// The URL that was requested.
        url: String,
        /// The underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// A scraped page did not have the expected structure.
    #[error("failed to scrape {section}: {message}")]
    Scrape {
        /// Which table was being scraped.
        section: &'static str,
        /// Description of what was missing.
        message: String,
    },

    /// An image could not be decoded, resized or written.
    #[error("failed to process image {path}: {message}")]
    Image {
        /// The source image.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A seeding step could not run because a prerequisite is missing.
    #[error("seed step '{step}' cannot run: {message}")]
    SeedPrerequisite {
        /// Name of the step.
        step: &'static str,
        /// Description of the missing prerequisite.
        message: String,
    },

    // === Decoding Errors ===
    /// The VIN failed validation.
    #[error(transparent)]
    InvalidVin(#[from] VinError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for vindecoder operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a scrape error for `section`.
    #[must_use]
    pub fn scrape(section: &'static str, message: impl Into<String>) -> Self {
        Self::Scrape {
            section,
            message: message.into(),
        }
    }

    /// Create an image processing error for `path`.
    #[must_use]
    pub fn image(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Image {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a seed prerequisite error.
    #[must_use]
    pub fn seed_prerequisite(step: &'static str, message: impl Into<String>) -> Self {
        Self::SeedPrerequisite {
            step,
            message: message.into(),
        }
    }

    /// Check if this error is a user-facing VIN validation failure.
    #[must_use]
    pub fn is_invalid_vin(&self) -> bool {
        matches!(self, Self::InvalidVin(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_invalid_vin_is_transparent() {
        let err: Error = VinError::InvalidLength { actual: 5 }.into();
        assert!(err.is_invalid_vin());
        assert_eq!(err.to_string(), "VIN must be exactly 17 characters");
    }

    #[test]
    fn test_is_invalid_vin_false_for_other_errors() {
        assert!(!Error::internal("x").is_invalid_vin());
    }

    #[test]
    fn test_seed_prerequisite_display() {
        let err = Error::seed_prerequisite("fill_missing", "Unknown country (XX) not found");
        let msg = err.to_string();
        assert!(msg.contains("fill_missing"));
        assert!(msg.contains("XX"));
    }

    #[test]
    fn test_source_missing_display() {
        let err = Error::SourceMissing {
            path: PathBuf::from("/data/wmi_factory_codes.json"),
        };
        assert!(err.to_string().contains("wmi_factory_codes.json"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_source_parse_error_display() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err = Error::SourceParse {
            path: PathBuf::from("countries.json"),
            source: json_err,
        };
        assert!(err.to_string().contains("countries.json"));
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_image_error_display() {
        let err = Error::image("/brands/ford.svg", "unexpected end of file");
        assert_eq!(
            err.to_string(),
            "failed to process image /brands/ford.svg: unexpected end of file"
        );
    }

    #[test]
    fn test_scrape_error_display() {
        let err = Error::scrape("regions", "no wikitable");
        assert_eq!(err.to_string(), "failed to scrape regions: no wikitable");
    }
}
