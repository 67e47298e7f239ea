use serde::{Deserialize, Serialize};

/// Outcome of one regeneration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerationStats {
    /// Source files that passed the include filter
    pub files_scanned: usize,

    /// Mapping records produced
    pub records: usize,

    /// Distinct owners written
    pub owners: usize,

    /// Files without a documented class (or that failed to process)
    pub skipped_files: usize,

    /// Owners whose artifact files could not be written
    pub write_failures: usize,

    /// Stale artifact files removed before writing
    pub removed_artifacts: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// True when the run stopped before scanning
    pub aborted: bool,

    /// Errors encountered
    pub errors: Vec<String>,
}

impl RegenerationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// No aborts, no write failures and no per-file errors
    pub fn is_clean(&self) -> bool {
        !self.aborted && self.write_failures == 0 && self.errors.is_empty()
    }
}
