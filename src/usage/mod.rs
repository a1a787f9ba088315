//! Usage Accounting
//!
//! Converts raw token counts into a cost estimate and an auditable log
//! entry, one per generation call. The pipeline only ever appends; paginated
//! retrieval and aggregates exist for reporting, not for generation.

pub mod log;

use std::path::Path;

use chrono::Utc;
use tracing::debug;

use crate::types::Result;

pub use log::{DateRange, UsageLog, UsageRecord, UsageSummary};

/// Per-million-token pricing (USD): (model, prompt rate, completion rate).
///
/// Unknown models bill at the first row's rates rather than erroring; a
/// wrong estimate beats a lost record.
const PRICING: &[(&str, f64, f64)] = &[("gpt-4o-mini", 0.15, 0.60), ("gpt-4o", 2.50, 5.00)];

/// Cost estimate for one call, rounded to 6 decimal places.
pub fn estimate_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    let (_, prompt_rate, completion_rate) = PRICING
        .iter()
        .find(|(name, _, _)| *name == model)
        .unwrap_or(&PRICING[0]);

    let cost = prompt_tokens as f64 * (prompt_rate / 1_000_000.0)
        + completion_tokens as f64 * (completion_rate / 1_000_000.0);
    (cost * 1_000_000.0).round() / 1_000_000.0
}

/// Paged history plus range aggregate, for reporting surfaces.
#[derive(Debug, Clone)]
pub struct UsageReport {
    pub records: Vec<UsageRecord>,
    pub summary: UsageSummary,
}

/// Append-only usage accountant over the SQLite log.
pub struct UsageTracker {
    log: UsageLog,
}

impl UsageTracker {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            log: UsageLog::open(db_path)?,
        })
    }

    /// Record one generation call. Empty model names are kept as `unknown`.
    pub fn record(&self, model: &str, prompt_tokens: u32, completion_tokens: u32) -> Result<()> {
        let model = if model.trim().is_empty() {
            "unknown"
        } else {
            model
        };
        let cost = estimate_cost(model, prompt_tokens, completion_tokens);

        let record = UsageRecord {
            model: model.to_string(),
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            cost,
            timestamp: Utc::now().timestamp(),
        };

        debug!(
            model = %record.model,
            total_tokens = record.total_tokens,
            cost = record.cost,
            "Recording usage"
        );
        self.log.append(&record)
    }

    /// Newest-first page within the range, with the range aggregate.
    pub fn history(&self, range: &DateRange, page: u32, per_page: u32) -> Result<UsageReport> {
        Ok(UsageReport {
            records: self.log.list(range, page, per_page)?,
            summary: self.log.summary(range)?,
        })
    }

    /// Bulk data erasure passthrough.
    pub fn erase_all(&self) -> Result<()> {
        self.log.erase_all()
    }
}
