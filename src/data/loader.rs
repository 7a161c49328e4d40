use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// MeasurementDb – read-only access to a measurement database
// ---------------------------------------------------------------------------

/// A connection to a SQLite measurement database. Every table is read
/// whole; the caller decides which tables to touch and in what order.
pub struct MeasurementDb {
    conn: Connection,
}

/// Column/row-count summary for one table.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub columns: Vec<String>,
    pub row_count: usize,
}

impl MeasurementDb {
    /// Open an existing database file.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        Ok(MeasurementDb { conn })
    }

    /// All table names present in the database, in `sqlite_master` order.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .context("querying sqlite_master")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("fetching table names")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("reading table name rows")?;
        Ok(names)
    }

    /// Read one table into a [`Dataset`]. An unreadable table surfaces as
    /// an error; callers treat that the same as an empty table and skip.
    pub fn read_table(&self, table_name: &str) -> Result<Dataset> {
        let quoted = table_name.replace('"', "\"\"");
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM \"{quoted}\""))
            .with_context(|| format!("preparing read of table {table_name}"))?;

        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let column_count = columns.len();
        let mut ds = Dataset::new(columns);

        let mut rows = stmt
            .query([])
            .with_context(|| format!("reading table {table_name}"))?;
        while let Some(row) = rows
            .next()
            .with_context(|| format!("stepping through table {table_name}"))?
        {
            let mut cells = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let cell = match row
                    .get_ref(i)
                    .with_context(|| format!("reading column {i} of table {table_name}"))?
                {
                    ValueRef::Null => CellValue::Null,
                    ValueRef::Integer(v) => CellValue::Integer(v),
                    ValueRef::Real(v) => CellValue::Float(v),
                    ValueRef::Text(t) => CellValue::String(String::from_utf8_lossy(t).into_owned()),
                    ValueRef::Blob(b) => CellValue::String(format!("<blob {} bytes>", b.len())),
                };
                cells.push(cell);
            }
            ds.rows.push(cells);
        }
        Ok(ds)
    }

    /// Column names and row count for one table.
    pub fn table_info(&self, table_name: &str) -> Result<TableInfo> {
        let quoted = table_name.replace('"', "\"\"");
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info(\"{quoted}\")"))
            .with_context(|| format!("reading schema of table {table_name}"))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .with_context(|| format!("listing columns of table {table_name}"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("reading column rows of table {table_name}"))?;

        let row_count: usize = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{quoted}\""), [], |row| {
                row.get(0)
            })
            .with_context(|| format!("counting rows of table {table_name}"))?;

        Ok(TableInfo { columns, row_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_db() -> (tempfile::TempDir, MeasurementDb) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("demo.db");
        let conn = Connection::open(&path).expect("create db");
        conn.execute_batch(
            "CREATE TABLE Motor_Waveform (ValueX REAL, ValueY REAL, Quality TEXT);
             INSERT INTO Motor_Waveform VALUES (0.0, 1.5, 'Good');
             INSERT INTO Motor_Waveform VALUES (0.1, NULL, 'Fair');
             CREATE TABLE DeviceID_IID (id INTEGER);",
        )
        .expect("seed db");
        drop(conn);
        let db = MeasurementDb::open(&path).expect("open db");
        (dir, db)
    }

    #[test]
    fn lists_all_tables() {
        let (_dir, db) = demo_db();
        let mut names = db.table_names().unwrap();
        names.sort();
        assert_eq!(names, vec!["DeviceID_IID", "Motor_Waveform"]);
    }

    #[test]
    fn reads_typed_cells() {
        let (_dir, db) = demo_db();
        let ds = db.read_table("Motor_Waveform").unwrap();
        assert_eq!(ds.columns, vec!["ValueX", "ValueY", "Quality"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0][0], CellValue::Float(0.0));
        assert_eq!(ds.rows[0][2], CellValue::String("Good".into()));
        assert_eq!(ds.rows[1][1], CellValue::Null);
    }

    #[test]
    fn missing_table_is_an_error() {
        let (_dir, db) = demo_db();
        assert!(db.read_table("No_Such_Table").is_err());
    }

    #[test]
    fn table_info_reports_columns_and_rows() {
        let (_dir, db) = demo_db();
        let info = db.table_info("Motor_Waveform").unwrap();
        assert_eq!(info.columns, vec!["ValueX", "ValueY", "Quality"]);
        assert_eq!(info.row_count, 2);
    }
}
