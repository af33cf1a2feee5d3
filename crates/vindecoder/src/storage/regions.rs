//! WMI region code queries.

use std::collections::HashSet;

use rusqlite::{params, OptionalExtension};

use super::countries::row_to_country;
use super::{Country, Storage, WmiRegion};
use crate::error::Result;

impl Storage {
    /// Assign a region code to a country unless the code is already taken.
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_region_code(&self, code: &str, country_id: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO wmi_regions (code, country_id) VALUES (?1, ?2)",
            params![code, country_id],
        )?;
        Ok(changed > 0)
    }

    /// All assigned region codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn region_codes(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT code FROM wmi_regions")?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<String>, _>>()?;
        Ok(codes)
    }

    /// The region row for a code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn region(&self, code: &str) -> Result<Option<WmiRegion>> {
        let region = self
            .conn
            .query_row(
                "SELECT id, code, country_id FROM wmi_regions WHERE code = ?1",
                [code],
                |row| {
                    Ok(WmiRegion {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        country_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(region)
    }

    /// The country (or continental region) a region code is assigned to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn region_country(&self, code: &str) -> Result<Option<Country>> {
        let country = self
            .conn
            .query_row(
                r"
                SELECT c.id, c.iso_alpha2, c.iso_alpha3, c.iso_numeric, c.name, c.common_name,
                       c.region, c.subregion, c.currency_code, c.calling_code, c.tld, c.flag_emoji
                FROM wmi_regions r
                JOIN countries c ON c.id = r.country_id
                WHERE r.code = ?1
                ",
                [code],
                row_to_country,
            )
            .optional()?;
        Ok(country)
    }
}
