//! `SQLite` schema definitions for vindecoder.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the countries table.
///
/// Also holds the continental pseudo-countries and the `XX` catch-all.
pub const CREATE_COUNTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS countries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    iso_alpha2 TEXT NOT NULL UNIQUE,
    iso_alpha3 TEXT UNIQUE,
    iso_numeric TEXT,
    name TEXT NOT NULL,
    common_name TEXT,
    region TEXT,
    subregion TEXT,
    currency_code TEXT,
    calling_code TEXT,
    tld TEXT,
    flag_emoji TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create a case-insensitive index on `common_name`.
pub const CREATE_COUNTRY_NAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_countries_common_name ON countries(common_name COLLATE NOCASE)
";

/// SQL statement to create the WMI region table (first two VIN characters).
pub const CREATE_WMI_REGIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS wmi_regions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    country_id INTEGER NOT NULL REFERENCES countries(id),
    is_active INTEGER NOT NULL DEFAULT 1
)
";

/// SQL statement to create the WMI factory table (first three VIN characters).
pub const CREATE_WMI_FACTORIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS wmi_factories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    wmi TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    country_id INTEGER REFERENCES countries(id),
    region TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
)
";

/// SQL statement to create the factory logo table.
pub const CREATE_FACTORY_LOGOS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS factory_logos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    factory_id INTEGER NOT NULL REFERENCES wmi_factories(id) ON DELETE CASCADE,
    logo_filename TEXT NOT NULL,
    UNIQUE (factory_id, logo_filename)
)
";

/// SQL statement to create an index on `factory_id` for logo lookups.
pub const CREATE_FACTORY_LOGOS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_factory_logos_factory ON factory_logos(factory_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_COUNTRIES_TABLE,
    CREATE_COUNTRY_NAME_INDEX,
    CREATE_WMI_REGIONS_TABLE,
    CREATE_WMI_FACTORIES_TABLE,
    CREATE_FACTORY_LOGOS_TABLE,
    CREATE_FACTORY_LOGOS_INDEX,
    CREATE_METADATA_TABLE,
];

/// Data tables, in dependency order.
pub const DATA_TABLES: [&str; 4] = ["countries", "wmi_regions", "wmi_factories", "factory_logos"];
