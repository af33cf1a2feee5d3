//! Factory logo queries.

use rusqlite::params;

use super::{FactoryLogoSummary, Storage};
use crate::error::Result;

impl Storage {
    /// Remove every factory/logo link.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_logos(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM factory_logos", [])?;
        Ok(removed)
    }

    /// Link a logo file to a factory. Linking the same pair twice is a no-op.
    ///
    /// Returns `true` if a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_logo(&self, factory_id: i64, filename: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO factory_logos (factory_id, logo_filename) VALUES (?1, ?2)",
            params![factory_id, filename],
        )?;
        Ok(changed > 0)
    }

    /// Logo file names linked to a factory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn logos_for_factory(&self, factory_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT logo_filename FROM factory_logos WHERE factory_id = ?1 ORDER BY logo_filename",
        )?;
        let logos = stmt
            .query_map([factory_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(logos)
    }

    /// Every factory with its logos, ordered by manufacturer name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn logo_overview(&self) -> Result<Vec<FactoryLogoSummary>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT f.id, f.wmi, f.name,
                   COALESCE(c.common_name, f.region, 'Unknown'),
                   l.logo_filename
            FROM wmi_factories f
            LEFT JOIN countries c ON c.id = f.country_id
            LEFT JOIN factory_logos l ON l.factory_id = f.id
            ORDER BY f.name, f.id, l.logo_filename
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut overview: Vec<FactoryLogoSummary> = Vec::new();
        for row in rows {
            let (id, wmi, manufacturer, country, logo) = row?;
            if overview.last().map_or(true, |last| last.id != id) {
                overview.push(FactoryLogoSummary {
                    id,
                    wmi,
                    manufacturer,
                    country,
                    has_logos: false,
                    logo_count: 0,
                    logos: Vec::new(),
                });
            }
            if let (Some(logo), Some(summary)) = (logo, overview.last_mut()) {
                summary.logos.push(logo);
                summary.logo_count = summary.logos.len();
                summary.has_logos = true;
            }
        }

        Ok(overview)
    }

    /// Logo files linked to the most factories, with their factory counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn top_logos(&self, limit: usize) -> Result<Vec<(String, i64)>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            r"
            SELECT logo_filename, COUNT(*) AS factories
            FROM factory_logos
            GROUP BY logo_filename
            ORDER BY factories DESC, logo_filename
            LIMIT ?1
            ",
        )?;
        let top = stmt
            .query_map([limit], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(top)
    }
}
