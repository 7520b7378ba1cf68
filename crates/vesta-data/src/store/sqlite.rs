//! SQLite store for finished daily record series.

use crate::error::{DataError, Result};
use crate::{DailyRecord, DailySeries, SecurityCode};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// SQLite store for daily record series.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

/// Row counts held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of securities with at least one row
    pub securities: usize,
    /// Total number of stored rows
    pub rows: usize,
}

impl SqliteStore {
    /// Open (or create) a store.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS daily_records (
                code TEXT NOT NULL,
                date TEXT NOT NULL,
                name TEXT NOT NULL,
                market_cap REAL NOT NULL,
                pb REAL,
                pe REAL,
                ps REAL,
                pc REAL,
                dividend REAL,
                stored_at TEXT NOT NULL,
                PRIMARY KEY (code, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_daily_records_code_date ON daily_records(code, date)",
            [],
        )?;

        Ok(())
    }

    /// Store a series. Rows already stored for the same date are superseded.
    pub fn put_series(&self, series: &DailySeries) -> Result<()> {
        let stored_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        for r in series.records() {
            tx.execute(
                "INSERT OR REPLACE INTO daily_records
                 (code, date, name, market_cap, pb, pe, ps, pc, dividend, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    series.code().as_str(),
                    r.date.to_string(),
                    r.name,
                    r.market_cap,
                    r.book_ratio,
                    r.earnings_ratio,
                    r.sales_ratio,
                    r.cashflow_ratio,
                    r.dividend_yield,
                    stored_at
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Load the stored series for a security, most-recent-first.
    pub fn get_series(&self, code: &SecurityCode) -> Result<DailySeries> {
        let mut stmt = self.conn.prepare(
            "SELECT date, name, market_cap, pb, pe, ps, pc, dividend
             FROM daily_records
             WHERE code = ?1
             ORDER BY date DESC",
        )?;

        let rows = stmt.query_map(params![code.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, Option<f64>>(7)?,
            ))
        })?;

        let mut records = Vec::new();
        let mut name = String::new();
        for row in rows {
            let (date, row_name, market_cap, pb, pe, ps, pc, dividend) = row?;
            let date = parse_date(&date)?;
            if name.is_empty() {
                name.clone_from(&row_name);
            }
            records.push(DailyRecord {
                book_ratio: pb,
                earnings_ratio: pe,
                sales_ratio: ps,
                cashflow_ratio: pc,
                dividend_yield: dividend,
                ..DailyRecord::new(date, code.clone(), row_name, market_cap)
            });
        }

        if records.is_empty() {
            return Err(DataError::MissingData {
                code: code.to_string(),
                reason: "No stored records found".to_string(),
            });
        }

        DailySeries::new(code.clone(), name, records)
    }

    /// Most recent stored date for a security.
    pub fn latest_date(&self, code: &SecurityCode) -> Result<Option<NaiveDate>> {
        let latest: Option<String> = self
            .conn
            .query_row(
                "SELECT MAX(date) FROM daily_records WHERE code = ?1",
                params![code.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        latest.as_deref().map(parse_date).transpose()
    }

    /// Codes with stored rows, in ascending order.
    pub fn codes(&self) -> Result<Vec<SecurityCode>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT code FROM daily_records ORDER BY code")?;

        let codes = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        codes.iter().map(|c| SecurityCode::parse(c)).collect()
    }

    /// Row counts.
    pub fn stats(&self) -> Result<StoreStats> {
        let (securities, rows): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(DISTINCT code), COUNT(*) FROM daily_records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            securities: securities as usize,
            rows: rows as usize,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| DataError::Parse(format!("bad stored date {s:?}: {e}")))
}
