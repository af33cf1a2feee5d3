//! Storage layer for vindecoder.
//!
//! This module provides `SQLite`-based persistent storage for the country,
//! WMI region, WMI factory and logo tables. Queries for each table live in
//! their own submodule as further `impl Storage` blocks.

mod countries;
mod factories;
pub mod inspect;
mod logos;
pub mod migrations;
pub mod models;
mod regions;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use inspect::{ColumnInfo, ForeignKeyInfo, TableReport};
pub use models::{Country, FactoryLogoSummary, WmiFactory, WmiRegion};

/// Prefix for metadata keys holding source file fingerprints.
const SOURCE_HASH_PREFIX: &str = "source_hash:";

/// Storage engine for the WMI database.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Delete the database at `path` (with its WAL files) and create a
    /// fresh, empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the old files cannot be removed or the new
    /// database cannot be created.
    pub fn reset(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.as_os_str().to_owned();
            file.push(suffix);
            let file = PathBuf::from(file);
            if file.exists() {
                std::fs::remove_file(&file)?;
                info!("Removed old database file {}", file.display());
            }
        }
        Self::open(path)
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` inside a transaction.
    ///
    /// The transaction commits when `f` succeeds and rolls back when it
    /// returns an error.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or a database error from begin/commit.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    /// Read a metadata value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a metadata value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }

    /// Record the fingerprint of an imported source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn record_source_hash(&self, source: &str, hash: &str) -> Result<()> {
        self.set_metadata(&format!("{SOURCE_HASH_PREFIX}{source}"), hash)
    }

    /// Fingerprints of all imported source files, by source name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn source_hashes(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(key, ?1), value FROM metadata WHERE key LIKE ?2 ORDER BY key",
        )?;
        let start = i64::try_from(SOURCE_HASH_PREFIX.len() + 1).unwrap_or(i64::MAX);
        let pattern = format!("{SOURCE_HASH_PREFIX}%");
        let hashes = stmt
            .query_map((start, pattern), |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(hashes)
    }

    fn count_rows(&self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            countries: self.count_rows("countries")?,
            wmi_regions: self.count_rows("wmi_regions")?,
            wmi_factories: self.count_rows("wmi_factories")?,
            factory_logos: self.count_rows("factory_logos")?,
            schema_version: migrations::get_schema_version(&self.conn)?,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Rows in `countries`.
    pub countries: i64,
    /// Rows in `wmi_regions`.
    pub wmi_regions: i64,
    /// Rows in `wmi_factories`.
    pub wmi_factories: i64,
    /// Rows in `factory_logos`.
    pub factory_logos: i64,
    /// Schema version recorded in the database.
    pub schema_version: i32,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vin.db");

        let storage = Storage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), path);
    }

    #[test]
    fn test_reset_discards_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vin.db");

        {
            let storage = Storage::open(&path).unwrap();
            storage.insert_country(&Country::unknown()).unwrap();
            assert_eq!(storage.stats().unwrap().countries, 1);
        }

        let storage = Storage::reset(&path).unwrap();
        assert_eq!(storage.stats().unwrap().countries, 0);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let storage = create_test_storage();
        assert_eq!(storage.metadata("missing").unwrap(), None);

        storage.set_metadata("k", "v1").unwrap();
        storage.set_metadata("k", "v2").unwrap();
        assert_eq!(storage.metadata("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_source_hashes() {
        let storage = create_test_storage();
        storage.record_source_hash("regions", "abc").unwrap();
        storage.record_source_hash("countries", "def").unwrap();

        let hashes = storage.source_hashes().unwrap();
        assert_eq!(
            hashes,
            [
                ("countries".to_string(), "def".to_string()),
                ("regions".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let storage = create_test_storage();

        let result: Result<()> = storage.in_transaction(|s| {
            s.insert_country(&Country::unknown())?;
            Err(Error::internal("boom"))
        });
        assert!(result.is_err());
        assert_eq!(storage.stats().unwrap().countries, 0);
    }

    #[test]
    fn test_transaction_commits() {
        let storage = create_test_storage();

        storage
            .in_transaction(|s| s.insert_country(&Country::unknown()))
            .unwrap();
        assert_eq!(storage.stats().unwrap().countries, 1);
    }

    #[test]
    fn test_stats_empty() {
        let stats = create_test_storage().stats().unwrap();

        assert_eq!(stats.countries, 0);
        assert_eq!(stats.wmi_regions, 0);
        assert_eq!(stats.wmi_factories, 0);
        assert_eq!(stats.factory_logos, 0);
        assert_eq!(stats.schema_version, migrations::CURRENT_VERSION);
        assert_eq!(stats.db_size_bytes, 0);
    }
}
