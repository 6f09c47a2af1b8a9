//! SQLite-backed range cache
//!
//! One row per (statistic, sample size). Values are stored as decimal text
//! so the file stays readable with the sqlite3 shell. Writers use
//! `INSERT OR REPLACE`, and SQLite's own locking serializes concurrent
//! processes; a busy timeout keeps a second writer waiting instead of failing.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::{decode_value, encode_value, RangeCache, Statistic};
use crate::core::error::CacheError;
use crate::core::params::SampleSize;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS range_statistics (
    statistic   TEXT NOT NULL,
    sample_size TEXT NOT NULL,
    value       TEXT NOT NULL,
    computed_at TEXT NOT NULL,
    PRIMARY KEY (statistic, sample_size)
);
";

/// A cached value as listed by [`SqliteCache::entries`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub statistic: Statistic,
    pub sample_size: String,
    pub value: f64,
    pub computed_at: Option<DateTime<Utc>>,
}

/// Durable cache in a single SQLite file
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteCache {
    /// Open (or create) the cache file, creating parent directories as needed
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "opened range cache");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Cache that lives only as long as this value
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Backing file, `None` for an in-memory cache
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All entries ordered by statistic, then numerically by sample size
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT statistic, sample_size, value, computed_at FROM range_statistics
             ORDER BY statistic, CAST(sample_size AS REAL)",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, Statistic>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (statistic, sample_size, value, computed_at) = row?;
            let value = decode_value(&format!("{}:{}", statistic, sample_size), &value)?;
            let computed_at = DateTime::parse_from_rfc3339(&computed_at)
                .ok()
                .map(|t| t.with_timezone(&Utc));
            entries.push(CacheEntry {
                statistic,
                sample_size,
                value,
                computed_at,
            });
        }
        Ok(entries)
    }

    /// Remove every entry, returning how many were deleted
    pub fn clear(&self) -> Result<usize, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(conn.execute("DELETE FROM range_statistics", [])?)
    }
}

impl RangeCache for SqliteCache {
    fn get(&self, statistic: Statistic, n: SampleSize) -> Result<Option<f64>, CacheError> {
        let key = n.key();
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let text: Option<String> = conn
            .query_row(
                "SELECT value FROM range_statistics WHERE statistic = ?1 AND sample_size = ?2",
                params![statistic, key],
                |row| row.get(0),
            )
            .optional()?;
        text.map(|t| decode_value(&format!("{}:{}", statistic, key), &t))
            .transpose()
    }

    fn put(&self, statistic: Statistic, n: SampleSize, value: f64) -> Result<(), CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        conn.execute(
            "INSERT OR REPLACE INTO range_statistics (statistic, sample_size, value, computed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![statistic, n.key(), encode_value(value), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
