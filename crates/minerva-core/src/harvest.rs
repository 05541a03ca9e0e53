//! Harvest bookkeeping: per-record outcomes, per-source results and the
//! summary of a multi-source run.
//!
//! Pure data, no I/O; the CLI fills these in as it drives each source.

use std::path::PathBuf;

/// Outcome of handling a single source record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Converted (or uploaded) successfully
    Processed,
    /// Missing a required field; dropped without error
    Skipped,
    /// Conversion or upload failed
    Failed,
}

/// Counters for one source or one upload target.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HarvestStats {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl HarvestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Processed => self.processed += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::Failed => self.failed += 1,
        }
    }

    /// Records `Processed` for `Some` and `Skipped` for `None`.
    pub fn record_conversion<T>(&mut self, converted: &Option<T>) {
        self.record(if converted.is_some() {
            RecordOutcome::Processed
        } else {
            RecordOutcome::Skipped
        });
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    pub fn merge(&mut self, other: &HarvestStats) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Result of harvesting one source in a batch run.
#[derive(Debug, Clone)]
pub struct SourceHarvestResult {
    /// Source name (`dalia`, a TeSS instance key, `oersi`).
    pub source_name: String,
    /// Where the JSONL was written, for successful sources.
    pub output: Option<PathBuf>,
    pub stats: HarvestStats,
    /// Error message if the source failed as a whole.
    pub error: Option<String>,
}

impl SourceHarvestResult {
    pub fn success(name: impl Into<String>, output: PathBuf, stats: HarvestStats) -> Self {
        Self {
            source_name: name.into(),
            output: Some(output),
            stats,
            error: None,
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_name: name.into(),
            output: None,
            stats: HarvestStats::default(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated results from harvesting several sources.
#[derive(Debug, Clone, Default)]
pub struct BatchHarvestSummary {
    pub results: Vec<SourceHarvestResult>,
}

impl BatchHarvestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: SourceHarvestResult) {
        self.results.push(result);
    }

    pub fn successful_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// Records written across all successful sources.
    pub fn total_records(&self) -> usize {
        self.results.iter().map(|r| r.stats.processed).sum()
    }

    pub fn total_sources(&self) -> usize {
        self.results.len()
    }
}
