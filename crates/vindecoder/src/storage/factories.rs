//! WMI factory queries.

use rusqlite::{params, OptionalExtension, Row};

use super::{Storage, WmiFactory};
use crate::error::Result;

impl Storage {
    /// Insert a factory and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including a
    /// duplicate WMI.
    pub fn insert_factory(&self, factory: &WmiFactory) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO wmi_factories (wmi, name, country_id, region) VALUES (?1, ?2, ?3, ?4)",
            params![factory.wmi, factory.name, factory.country_id, factory.region],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a factory by WMI.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn factory_by_wmi(&self, wmi: &str) -> Result<Option<WmiFactory>> {
        let factory = self
            .conn
            .query_row(
                "SELECT id, wmi, name, country_id, region FROM wmi_factories WHERE wmi = ?1",
                [wmi],
                row_to_factory,
            )
            .optional()?;
        Ok(factory)
    }

    /// Change a factory's manufacturer name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn rename_factory(&self, id: i64, name: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE wmi_factories SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(())
    }

    /// All factories, ordered by WMI.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn factories(&self) -> Result<Vec<WmiFactory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, wmi, name, country_id, region FROM wmi_factories ORDER BY wmi")?;
        let factories = stmt
            .query_map([], row_to_factory)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(factories)
    }

    /// Number of factories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn factory_count(&self) -> Result<i64> {
        self.count_rows("wmi_factories")
    }

    /// The WMI of the factory at `offset` in WMI order.
    ///
    /// Used with a random offset to pick a factory uniformly.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn factory_wmi_at(&self, offset: i64) -> Result<Option<String>> {
        let wmi = self
            .conn
            .query_row(
                "SELECT wmi FROM wmi_factories ORDER BY wmi LIMIT 1 OFFSET ?1",
                [offset],
                |row| row.get(0),
            )
            .optional()?;
        Ok(wmi)
    }
}

fn row_to_factory(row: &Row) -> rusqlite::Result<WmiFactory> {
    Ok(WmiFactory {
        id: Some(row.get(0)?),
        wmi: row.get(1)?,
        name: row.get(2)?,
        country_id: row.get(3)?,
        region: row.get(4)?,
    })
}
