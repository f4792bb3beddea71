//! Operator-visible collection statistics.
//!
//! Counters are kept separately from the event log so a host surface (CLI
//! summary, ingest server) can report on the session without walking events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the current engine session.
#[derive(Debug)]
pub struct EngineStats {
    /// Number of events appended to the session log
    events_captured: AtomicU64,
    /// Number of beacons accepted by the sink
    sink_delivered: AtomicU64,
    /// Number of beacons the sink failed to accept
    sink_failures: AtomicU64,
    /// Number of funnel step completions
    funnel_steps: AtomicU64,
    /// Number of exports produced
    exports: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl EngineStats {
    /// Create a new stats block.
    pub fn new() -> Self {
        Self {
            events_captured: AtomicU64::new(0),
            sink_delivered: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            funnel_steps: AtomicU64::new(0),
            exports: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record an appended event.
    pub fn record_event(&self) {
        self.events_captured.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful sink delivery.
    pub fn record_sink_delivery(&self) {
        self.sink_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed sink delivery.
    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed funnel step.
    pub fn record_funnel_step(&self) {
        self.funnel_steps.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a produced export.
    pub fn record_export(&self) {
        self.exports.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_captured: self.events_captured.load(Ordering::Relaxed),
            sink_delivered: self.sink_delivered.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            funnel_steps: self.funnel_steps.load(Ordering::Relaxed),
            exports: self.exports.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Events captured: {}\n\
             - Beacons delivered: {}\n\
             - Beacon failures: {}\n\
             - Funnel steps completed: {}\n\
             - Exports produced: {}\n\
             - Session duration: {} seconds",
            stats.events_captured,
            stats.sink_delivered,
            stats.sink_failures,
            stats.funnel_steps,
            stats.exports,
            stats.session_duration_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.events_captured.store(0, Ordering::Relaxed);
        self.sink_delivered.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.funnel_steps.store(0, Ordering::Relaxed);
        self.exports.store(0, Ordering::Relaxed);
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub events_captured: u64,
    pub sink_delivered: u64,
    pub sink_failures: u64,
    pub funnel_steps: u64,
    pub exports: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared stats block.
pub type SharedStats = Arc<EngineStats>;

/// Create a new shared stats block.
pub fn create_shared_stats() -> SharedStats {
    Arc::new(EngineStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counting() {
        let stats = EngineStats::new();

        stats.record_event();
        stats.record_event();
        stats.record_sink_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.events_captured, 2);
        assert_eq!(snapshot.sink_failures, 1);
        assert_eq!(snapshot.sink_delivered, 0);
    }

    #[test]
    fn test_stats_reset() {
        let stats = EngineStats::new();

        stats.record_event();
        stats.record_funnel_step();
        stats.reset();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.events_captured, 0);
        assert_eq!(snapshot.funnel_steps, 0);
    }

    #[test]
    fn test_summary_format() {
        let stats = EngineStats::new();
        let summary = stats.summary();

        assert!(summary.contains("Events captured"));
        assert!(summary.contains("Beacon failures"));
        assert!(summary.contains("Session duration"));
    }
}
