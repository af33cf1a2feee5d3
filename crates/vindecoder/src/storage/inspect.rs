//! Schema and content inspection.

use rusqlite::types::ValueRef;
use serde::Serialize;

use super::Storage;
use crate::error::Result;

/// A column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub column_type: String,
    /// Whether the column is (part of) the primary key.
    pub primary_key: bool,
    /// Whether the column is declared `NOT NULL`.
    pub not_null: bool,
    /// Default value expression, if any.
    pub default: Option<String>,
}

/// A foreign key as reported by `PRAGMA foreign_key_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyInfo {
    /// Referencing column.
    pub from: String,
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub to: String,
    /// `ON DELETE` action.
    pub on_delete: String,
}

/// Everything `inspect` reports about one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    /// Table name.
    pub name: String,
    /// The `CREATE TABLE` statement.
    pub create_sql: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
    /// Outgoing foreign keys.
    pub foreign_keys: Vec<ForeignKeyInfo>,
    /// Total number of rows.
    pub row_count: i64,
    /// Column headers of the sample.
    pub sample_columns: Vec<String>,
    /// First rows of the table, rendered as text (`NULL` for nulls).
    pub sample_rows: Vec<Vec<String>>,
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl Storage {
    /// Describe every table in the database, with up to `sample_rows`
    /// rows of content each.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn inspect(&self, sample_rows: usize) -> Result<Vec<TableReport>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, sql FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let tables = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tables
            .into_iter()
            .map(|(name, sql)| self.inspect_table(name, sql.unwrap_or_default(), sample_rows))
            .collect()
    }

    fn inspect_table(
        &self,
        name: String,
        create_sql: String,
        sample_rows: usize,
    ) -> Result<TableReport> {
        let table = quote_ident(&name);

        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    column_type: row.get(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                    default: row.get(4)?,
                    primary_key: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA foreign_key_list({table})"))?;
        let foreign_keys = stmt
            .query_map([], |row| {
                Ok(ForeignKeyInfo {
                    table: row.get(2)?,
                    from: row.get(3)?,
                    to: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    on_delete: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let row_count = self.count_rows(&table)?;

        let limit = i64::try_from(sample_rows).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {table} LIMIT ?1"))?;
        let sample_columns: Vec<String> =
            stmt.column_names().into_iter().map(String::from).collect();
        let width = sample_columns.len();
        let sample = stmt
            .query_map([limit], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(render_value))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TableReport {
            name,
            create_sql,
            columns,
            foreign_keys,
            row_count,
            sample_columns,
            sample_rows: sample,
        })
    }
}
