//! Metrics collection for recompute operations

use crate::engine::RecomputeReport;

/// Counters collected across recomputes and trigger dispatches
///
/// Tracks work done by successful recomputes as well as failures that were
/// absorbed at the trigger boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Recomputes that ran to completion
    pub recomputes: usize,

    /// Recomputes that failed and were logged
    pub failures: usize,

    /// Non-zero similarity writes
    pub pairs_written: usize,

    /// Zero similarity writes (deletions)
    pub pairs_zeroed: usize,

    /// Missing items whose data was purged
    pub items_purged: usize,

    /// Score mutations that scheduled a recompute
    pub triggers_fired: usize,

    /// Score mutations ignored because autocalc is disabled
    pub triggers_skipped: usize,
}

impl EngineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed recompute
    pub fn record_recompute(&mut self, report: &RecomputeReport) {
        self.recomputes += 1;
        self.pairs_written += report.pairs_written;
        self.pairs_zeroed += report.pairs_zeroed;
        self.items_purged += report.items_purged;
    }

    /// Record a failed recompute
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Record items purged outside a recompute
    pub fn record_purge(&mut self, count: usize) {
        self.items_purged += count;
    }

    /// Record a trigger dispatch
    pub fn record_trigger(&mut self, fired: bool) {
        if fired {
            self.triggers_fired += 1;
        } else {
            self.triggers_skipped += 1;
        }
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let lines = [
            "Recompute Metrics Summary".to_string(),
            "=========================".to_string(),
            format!("Recomputes: {}", self.recomputes),
            format!("Failures: {}", self.failures),
            format!("Pairs written: {}", self.pairs_written),
            format!("Pairs deleted: {}", self.pairs_zeroed),
            format!("Items purged: {}", self.items_purged),
            format!(
                "Triggers: {} fired, {} skipped",
                self.triggers_fired, self.triggers_skipped
            ),
        ];

        lines.join("\n")
    }
}
