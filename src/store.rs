//! External application state store.
//!
//! The engine pushes selected summarized updates to the host application's
//! state layer. The store is write-only from the engine's side; the engine
//! never reads back from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Partial Core Web Vitals update. Only the fields observed so far are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lcp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fid: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cls: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<f64>,
}

impl PerformanceUpdate {
    /// Merge another partial update into this one. Set fields win.
    pub fn merge(&mut self, other: &PerformanceUpdate) {
        if other.lcp.is_some() {
            self.lcp = other.lcp;
        }
        if other.fid.is_some() {
            self.fid = other.fid;
        }
        if other.cls.is_some() {
            self.cls = other.cls;
        }
        if other.fcp.is_some() {
            self.fcp = other.fcp;
        }
        if other.ttfb.is_some() {
            self.ttfb = other.ttfb;
        }
    }
}

/// Analytics-facing state update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsUpdate {
    /// Timestamp of the most recent engagement interaction.
    pub last_interaction: DateTime<Utc>,
}

/// Host application state layer the engine writes into.
pub trait AppStateStore: Send + Sync {
    /// Push a partial performance-metrics update.
    fn update_performance(&self, update: PerformanceUpdate);

    /// Push an analytics state update.
    fn update_analytics(&self, update: AnalyticsUpdate);
}

/// In-memory state store the host (and tests) can read back.
#[derive(Debug, Default)]
pub struct SharedAppState {
    performance: RwLock<PerformanceUpdate>,
    last_interaction: RwLock<Option<DateTime<Utc>>>,
}

impl SharedAppState {
    /// Create an empty shared state store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared handle to an empty store.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Current merged performance metrics.
    pub fn performance(&self) -> PerformanceUpdate {
        *self.performance.read().expect("performance lock poisoned")
    }

    /// Timestamp of the most recent engagement interaction, if any.
    pub fn last_interaction(&self) -> Option<DateTime<Utc>> {
        *self
            .last_interaction
            .read()
            .expect("interaction lock poisoned")
    }
}

impl AppStateStore for SharedAppState {
    fn update_performance(&self, update: PerformanceUpdate) {
        self.performance
            .write()
            .expect("performance lock poisoned")
            .merge(&update);
    }

    fn update_analytics(&self, update: AnalyticsUpdate) {
        *self
            .last_interaction
            .write()
            .expect("interaction lock poisoned") = Some(update.last_interaction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_merge_keeps_unset_fields() {
        let store = SharedAppState::new();

        store.update_performance(PerformanceUpdate {
            lcp: Some(2500.0),
            ..Default::default()
        });
        store.update_performance(PerformanceUpdate {
            cls: Some(0.08),
            ..Default::default()
        });

        let merged = store.performance();
        assert_eq!(merged.lcp, Some(2500.0));
        assert_eq!(merged.cls, Some(0.08));
        assert_eq!(merged.fid, None);
    }

    #[test]
    fn test_performance_merge_last_write_wins() {
        let store = SharedAppState::new();

        store.update_performance(PerformanceUpdate {
            lcp: Some(1800.0),
            ..Default::default()
        });
        store.update_performance(PerformanceUpdate {
            lcp: Some(2400.0),
            ..Default::default()
        });

        assert_eq!(store.performance().lcp, Some(2400.0));
    }

    #[test]
    fn test_last_interaction_update() {
        let store = SharedAppState::new();
        assert!(store.last_interaction().is_none());

        let now = Utc::now();
        store.update_analytics(AnalyticsUpdate {
            last_interaction: now,
        });
        assert_eq!(store.last_interaction(), Some(now));
    }
}
