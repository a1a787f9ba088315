//! TTL Status Store
//!
//! Key-value store with per-entry expiration, holding job status records.
//! The trait keeps the backing swappable: the in-memory DashMap variant here
//! serves tests and single-process deployments; a networked cache implements
//! the same contract in clustered setups.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::types::JobRecord;

/// Put/get with expiration. `get` on an expired or unknown key is `None`;
/// distinguishing the two is deliberately impossible - retention is short
/// and both mean "this job can no longer be observed".
pub trait StatusStore: Send + Sync {
    fn put(&self, job_id: &str, record: JobRecord, ttl: Duration);
    fn get(&self, job_id: &str) -> Option<JobRecord>;
}

/// In-memory store on a lock-free concurrent map.
///
/// Expired entries are evicted lazily on read; the overall footprint is
/// bounded by the short retention window.
#[derive(Default)]
pub struct InMemoryStatusStore {
    entries: DashMap<String, Entry>,
}

struct Entry {
    record: JobRecord,
    expires_at: Instant,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatusStore for InMemoryStatusStore {
    fn put(&self, job_id: &str, record: JobRecord, ttl: Duration) {
        self.entries.insert(
            job_id.to_string(),
            Entry {
                record,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn get(&self, job_id: &str) -> Option<JobRecord> {
        let expired = match self.entries.get(job_id) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.record.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(job_id);
        }
        None
    }
}
