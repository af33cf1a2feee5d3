//! Country queries.

use std::collections::HashSet;

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{Country, Storage};
use crate::error::Result;
use crate::wmi::{is_known_region, UNKNOWN_COUNTRY_ISO};

const COUNTRY_COLUMNS: &str = "id, iso_alpha2, iso_alpha3, iso_numeric, name, common_name, \
     region, subregion, currency_code, calling_code, tld, flag_emoji";

impl Storage {
    /// Insert a country and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including a
    /// duplicate ISO code.
    pub fn insert_country(&self, country: &Country) -> Result<i64> {
        self.conn.execute(
            r"
            INSERT INTO countries (iso_alpha2, iso_alpha3, iso_numeric, name, common_name,
                                   region, subregion, currency_code, calling_code, tld, flag_emoji)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                country.iso_alpha2,
                country.iso_alpha3,
                country.iso_numeric,
                country.name,
                country.common_name,
                country.region,
                country.subregion,
                country.currency_code,
                country.calling_code,
                country.tld,
                country.flag_emoji,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a country by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn country(&self, id: i64) -> Result<Option<Country>> {
        let country = self
            .conn
            .query_row(
                &format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE id = ?1"),
                [id],
                row_to_country,
            )
            .optional()?;
        Ok(country)
    }

    /// Get a country by ISO alpha-2 code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn country_by_iso2(&self, iso_alpha2: &str) -> Result<Option<Country>> {
        let country = self
            .conn
            .query_row(
                &format!("SELECT {COUNTRY_COLUMNS} FROM countries WHERE iso_alpha2 = ?1"),
                [iso_alpha2],
                row_to_country,
            )
            .optional()?;
        Ok(country)
    }

    /// Find a country by common name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn country_by_name(&self, name: &str) -> Result<Option<Country>> {
        let country = self
            .conn
            .query_row(
                &format!(
                    "SELECT {COUNTRY_COLUMNS} FROM countries \
                     WHERE common_name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1"
                ),
                [name],
                row_to_country,
            )
            .optional()?;
        Ok(country)
    }

    /// All ISO alpha-2 codes currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn country_iso2_codes(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT iso_alpha2 FROM countries")?;
        let codes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<String>, _>>()?;
        Ok(codes)
    }

    /// Find a country by name, creating a continental region entry if
    /// the name is a known region that is not stored yet.
    ///
    /// Returns `None` for a name that is neither stored nor a region.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_or_create_region(&self, name: &str) -> Result<Option<Country>> {
        if let Some(country) = self.country_by_name(name)? {
            return Ok(Some(country));
        }

        if !is_known_region(name) {
            return Ok(None);
        }
        let Some(mut region) = Country::continental(name) else {
            return Ok(None);
        };

        // The placeholder code may exist under another spelling
        if let Some(existing) = self.country_by_iso2(&region.iso_alpha2)? {
            return Ok(Some(existing));
        }

        info!("Creating region entry: {name}");
        region.id = Some(self.insert_country(&region)?);
        Ok(Some(region))
    }

    /// Make sure the `XX` catch-all country exists and return it.
    ///
    /// The flag is `true` when the row was inserted by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn ensure_unknown_country(&self) -> Result<(Country, bool)> {
        if let Some(existing) = self.country_by_iso2(UNKNOWN_COUNTRY_ISO)? {
            return Ok((existing, false));
        }
        let mut unknown = Country::unknown();
        unknown.id = Some(self.insert_country(&unknown)?);
        Ok((unknown, true))
    }
}

pub(super) fn row_to_country(row: &Row) -> rusqlite::Result<Country> {
    Ok(Country {
        id: Some(row.get(0)?),
        iso_alpha2: row.get(1)?,
        iso_alpha3: row.get(2)?,
        iso_numeric: row.get(3)?,
        name: row.get(4)?,
        common_name: row.get(5)?,
        region: row.get(6)?,
        subregion: row.get(7)?,
        currency_code: row.get(8)?,
        calling_code: row.get(9)?,
        tld: row.get(10)?,
        flag_emoji: row.get(11)?,
    })
}
