use serde::Serialize;
use std::time::Duration;

/// Outcome of a deduplication run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemovalReport {
    /// RFC 3339 time the run started.
    pub started_at: String,
    pub dataset: String,
    pub dry_run: bool,
    pub groups: usize,
    pub images: usize,
    /// Number of images judged redundant and deleted (or that would be, on a
    /// dry run). Files that were already gone are not counted.
    pub removed: usize,
    pub removed_ids: Vec<String>,
    pub unreadable: Vec<String>,
    pub already_missing: Vec<String>,
    pub comparisons: usize,
    pub failed_comparisons: usize,
    pub elapsed_secs: f64,
}

impl RemovalReport {
    pub fn new(started_at: String, dataset: String, dry_run: bool) -> Self {
        Self {
            started_at,
            dataset,
            dry_run,
            ..Self::default()
        }
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_secs = elapsed.as_secs_f64();
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs)
    }
}
