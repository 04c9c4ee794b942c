use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics about an indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Files handed to the chunker
    pub files: usize,

    /// Chunks extracted
    pub chunks: usize,

    /// Store writes that committed
    pub batches_written: usize,

    /// Store writes that failed (not retried)
    pub batches_failed: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Files skipped by the chunker, one line each
    pub warnings: Vec<String>,

    /// Embedding and store failures
    pub errors: Vec<String>,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Fold the counters of one file (or one sub-run) into this total
    pub fn merge(&mut self, other: IndexStats) {
        self.files += other.files;
        self.chunks += other.chunks;
        self.batches_written += other.batches_written;
        self.batches_failed += other.batches_failed;
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    /// True when every batch committed and nothing failed
    pub fn is_clean(&self) -> bool {
        self.batches_failed == 0 && self.errors.is_empty()
    }
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} chunks, {} batches written, {} failed, {} warnings in {}ms",
            self.files,
            self.chunks,
            self.batches_written,
            self.batches_failed,
            self.warnings.len(),
            self.time_ms
        )
    }
}
