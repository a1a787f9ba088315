//! Usage Log Storage
//!
//! Append-only SQLite log of generation calls, with pooled connections and
//! WAL mode. Rows are never updated; the only mutation beyond insert is bulk
//! erasure. Retrieval is newest-first, paginated, and filterable by an
//! inclusive date range normalized to whole UTC days.

use std::path::Path;

use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params_from_iter;
use serde::Serialize;

use crate::types::{AutopressError, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS usage_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    prompt_tokens INTEGER NOT NULL DEFAULT 0,
    completion_tokens INTEGER NOT NULL DEFAULT 0,
    total_tokens INTEGER NOT NULL DEFAULT 0,
    cost REAL NOT NULL DEFAULT 0.0,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS usage_log_created_at_idx ON usage_log (created_at);
";

/// One immutable usage row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub cost: f64,
    /// Unix timestamp (seconds, UTC)
    pub timestamp: i64,
}

/// Aggregate over a filtered range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageSummary {
    pub total_records: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// Inclusive date-range filter. Bounds are normalized to start-of-day and
/// end-of-day in UTC, so a single-day range covers the whole day.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Unix-timestamp bounds: (>= start 00:00:00, <= end 23:59:59), UTC.
    pub fn timestamp_bounds(&self) -> (Option<i64>, Option<i64>) {
        let start = self
            .start
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp());
        let end = self
            .end
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .map(|dt| dt.and_utc().timestamp());
        (start, end)
    }
}

/// Pooled SQLite usage log
pub struct UsageLog {
    pool: Pool<SqliteConnectionManager>,
}

impl UsageLog {
    /// Open (creating if needed) the log at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
        });
        let pool = Pool::new(manager)
            .map_err(|e| AutopressError::Storage(format!("usage log pool: {e}")))?;

        let conn = pool
            .get()
            .map_err(|e| AutopressError::Storage(format!("usage log connection: {e}")))?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self { pool })
    }

    /// Append one row. Concurrent appends are safe; nothing reads-then-writes.
    pub fn append(&self, record: &UsageRecord) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| AutopressError::Storage(format!("usage log connection: {e}")))?;

        conn.execute(
            "INSERT INTO usage_log (model, prompt_tokens, completion_tokens, total_tokens, cost, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                record.model,
                record.prompt_tokens,
                record.completion_tokens,
                record.total_tokens,
                record.cost,
                record.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Newest-first page of rows within the range. Pages are 1-based.
    pub fn list(&self, range: &DateRange, page: u32, per_page: u32) -> Result<Vec<UsageRecord>> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let offset = (page as i64 - 1) * per_page as i64;

        let (where_clause, mut params) = Self::range_filter(range);
        params.push(per_page as i64);
        params.push(offset);

        let sql = format!(
            "SELECT model, prompt_tokens, completion_tokens, total_tokens, cost, created_at
             FROM usage_log {where_clause}
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?"
        );

        let conn = self
            .pool
            .get()
            .map_err(|e| AutopressError::Storage(format!("usage log connection: {e}")))?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| {
            Ok(UsageRecord {
                model: row.get(0)?,
                prompt_tokens: row.get(1)?,
                completion_tokens: row.get(2)?,
                total_tokens: row.get(3)?,
                cost: row.get(4)?,
                timestamp: row.get(5)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Aggregate over the same filter `list` uses.
    pub fn summary(&self, range: &DateRange) -> Result<UsageSummary> {
        let (where_clause, params) = Self::range_filter(range);
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(total_tokens), 0), COALESCE(SUM(cost), 0.0)
             FROM usage_log {where_clause}"
        );

        let conn = self
            .pool
            .get()
            .map_err(|e| AutopressError::Storage(format!("usage log connection: {e}")))?;
        let summary = conn.query_row(&sql, params_from_iter(params), |row| {
            Ok(UsageSummary {
                total_records: row.get::<_, i64>(0)? as u64,
                total_tokens: row.get::<_, i64>(1)? as u64,
                total_cost: row.get(2)?,
            })
        })?;
        Ok(summary)
    }

    /// Bulk data erasure. The only sanctioned deletion path.
    pub fn erase_all(&self) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| AutopressError::Storage(format!("usage log connection: {e}")))?;
        conn.execute("DELETE FROM usage_log", [])?;
        Ok(())
    }

    fn range_filter(range: &DateRange) -> (String, Vec<i64>) {
        let (start, end) = range.timestamp_bounds();
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(start) = start {
            conditions.push("created_at >= ?");
            params.push(start);
        }
        if let Some(end) = end {
            conditions.push("created_at <= ?");
            params.push(end);
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn open_temp() -> (tempfile::TempDir, UsageLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = UsageLog::open(&dir.path().join("usage.db")).unwrap();
        (dir, log)
    }

    fn row(model: &str, timestamp: i64) -> UsageRecord {
        UsageRecord {
            model: model.to_string(),
            prompt_tokens: 100,
            completion_tokens: 50,
            total_tokens: 150,
            cost: 0.0001,
            timestamp,
        }
    }

    #[test]
    fn test_append_and_list_newest_first() {
        let (_dir, log) = open_temp();
        log.append(&row("gpt-4o-mini", 1_000)).unwrap();
        log.append(&row("gpt-4o", 2_000)).unwrap();
        log.append(&row("gpt-4o-mini", 3_000)).unwrap();

        let records = log.list(&DateRange::default(), 1, 10).unwrap();
        let timestamps: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![3_000, 2_000, 1_000]);
    }

    #[test]
    fn test_pagination() {
        let (_dir, log) = open_temp();
        for n in 0..5 {
            log.append(&row("gpt-4o-mini", n * 100)).unwrap();
        }

        let first = log.list(&DateRange::default(), 1, 2).unwrap();
        let second = log.list(&DateRange::default(), 2, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].timestamp, 400);
        assert_eq!(second[0].timestamp, 200);
    }

    #[test]
    fn test_date_range_is_inclusive_whole_days() {
        let (_dir, log) = open_temp();
        let jan_15 = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();

        let start_of_day = jan_15.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let end_of_day = jan_15.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();

        log.append(&row("m", start_of_day - 1)).unwrap();
        log.append(&row("m", start_of_day)).unwrap();
        log.append(&row("m", end_of_day)).unwrap();
        log.append(&row("m", end_of_day + 1)).unwrap();

        let range = DateRange {
            start: Some(jan_15),
            end: Some(jan_15),
        };
        let records = log.list(&range, 1, 10).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_summary_aggregates_filtered_rows() {
        let (_dir, log) = open_temp();
        log.append(&row("m", 1_000)).unwrap();
        log.append(&row("m", 2_000)).unwrap();

        let summary = log.summary(&DateRange::default()).unwrap();
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.total_tokens, 300);
        assert!((summary.total_cost - 0.0002).abs() < 1e-9);
    }

    #[test]
    fn test_erase_all() {
        let (_dir, log) = open_temp();
        log.append(&row("m", 1_000)).unwrap();
        log.erase_all().unwrap();
        assert_eq!(log.summary(&DateRange::default()).unwrap().total_records, 0);
    }
}
