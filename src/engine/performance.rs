//! Core Web Vitals observation.
//!
//! Each tracker method consumes one performance signal and returns the
//! partial metrics update to push to the app state store, if any. Metrics are
//! pushed rather than retained as events; only slow resources produce an
//! event, which the engine emits from the scan result.

use crate::event::SlowResource;
use crate::signal::ResourceTiming;
use crate::store::PerformanceUpdate;

/// Paint-entry name identifying First Contentful Paint.
const FCP_ENTRY_NAME: &str = "first-contentful-paint";

/// Observer state for performance signals.
#[derive(Debug)]
pub struct PerformanceTracker {
    observing: bool,
    lcp: Option<f64>,
    fid: Option<f64>,
    /// Running CLS sum over shifts not attributed to recent input.
    cls_total: f64,
    cls_seen: bool,
    fcp: Option<f64>,
    ttfb: Option<f64>,
    resources_scanned: bool,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self {
            observing: true,
            lcp: None,
            fid: None,
            cls_total: 0.0,
            cls_seen: false,
            fcp: None,
            ttfb: None,
            resources_scanned: false,
        }
    }

    /// Stop observing. Later signals are ignored.
    pub fn disconnect(&mut self) {
        self.observing = false;
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Largest-contentful-paint candidate. The browser revises its candidate,
    /// so every entry overwrites the previous one - last write wins.
    pub fn record_lcp(&mut self, start_time_ms: f64) -> Option<PerformanceUpdate> {
        if !self.observing {
            return None;
        }
        self.lcp = Some(start_time_ms);
        Some(PerformanceUpdate {
            lcp: Some(start_time_ms),
            ..Default::default()
        })
    }

    /// First-input entry. Only the first one defines FID.
    pub fn record_first_input(
        &mut self,
        start_time_ms: f64,
        processing_start_ms: f64,
    ) -> Option<PerformanceUpdate> {
        if !self.observing || self.fid.is_some() {
            return None;
        }
        let fid = processing_start_ms - start_time_ms;
        self.fid = Some(fid);
        Some(PerformanceUpdate {
            fid: Some(fid),
            ..Default::default()
        })
    }

    /// Layout-shift entry. Shifts attributed to recent user input must not
    /// contribute; counting them inflates CLS and invalidates the metric.
    pub fn record_layout_shift(
        &mut self,
        value: f64,
        had_recent_input: bool,
    ) -> Option<PerformanceUpdate> {
        if !self.observing || had_recent_input {
            return None;
        }
        self.cls_total += value;
        self.cls_seen = true;
        Some(PerformanceUpdate {
            cls: Some(self.cls_total),
            ..Default::default()
        })
    }

    /// Paint entry. Only the first-contentful-paint entry is of interest.
    pub fn record_paint(&mut self, name: &str, start_time_ms: f64) -> Option<PerformanceUpdate> {
        if !self.observing || name != FCP_ENTRY_NAME || self.fcp.is_some() {
            return None;
        }
        self.fcp = Some(start_time_ms);
        Some(PerformanceUpdate {
            fcp: Some(start_time_ms),
            ..Default::default()
        })
    }

    /// Navigation timing, available after load.
    pub fn record_navigation_timing(
        &mut self,
        fetch_start_ms: f64,
        response_start_ms: f64,
    ) -> Option<PerformanceUpdate> {
        if !self.observing || self.ttfb.is_some() {
            return None;
        }
        let ttfb = response_start_ms - fetch_start_ms;
        self.ttfb = Some(ttfb);
        Some(PerformanceUpdate {
            ttfb: Some(ttfb),
            ..Default::default()
        })
    }

    /// Scan resource timings for slow loads. Runs once per session; returns
    /// the offending resources, or `None` when nothing exceeded the threshold.
    pub fn scan_resources(
        &mut self,
        entries: &[ResourceTiming],
        threshold_ms: f64,
    ) -> Option<Vec<SlowResource>> {
        if !self.observing || self.resources_scanned {
            return None;
        }
        self.resources_scanned = true;

        let slow: Vec<SlowResource> = entries
            .iter()
            .filter(|entry| entry.duration_ms > threshold_ms)
            .map(|entry| SlowResource {
                name: entry.name.clone(),
                duration_ms: entry.duration_ms,
            })
            .collect();

        if slow.is_empty() {
            None
        } else {
            Some(slow)
        }
    }

    /// Accumulated CLS over input-filtered shifts.
    pub fn cls(&self) -> Option<f64> {
        self.cls_seen.then_some(self.cls_total)
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cls_filters_input_attributed_shifts() {
        let mut tracker = PerformanceTracker::new();

        assert!(tracker.record_layout_shift(0.05, false).is_some());
        assert!(tracker.record_layout_shift(0.40, true).is_none());
        assert!(tracker.record_layout_shift(0.03, false).is_some());

        let cls = tracker.cls().unwrap();
        assert!((cls - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_lcp_last_write_wins() {
        let mut tracker = PerformanceTracker::new();

        let first = tracker.record_lcp(1200.0).unwrap();
        assert_eq!(first.lcp, Some(1200.0));

        let second = tracker.record_lcp(2400.0).unwrap();
        assert_eq!(second.lcp, Some(2400.0));
    }

    #[test]
    fn test_fid_only_first_entry() {
        let mut tracker = PerformanceTracker::new();

        let update = tracker.record_first_input(100.0, 135.0).unwrap();
        assert_eq!(update.fid, Some(35.0));

        assert!(tracker.record_first_input(500.0, 900.0).is_none());
    }

    #[test]
    fn test_paint_matches_fcp_name_only() {
        let mut tracker = PerformanceTracker::new();

        assert!(tracker.record_paint("first-paint", 80.0).is_none());
        let update = tracker
            .record_paint("first-contentful-paint", 120.0)
            .unwrap();
        assert_eq!(update.fcp, Some(120.0));
    }

    #[test]
    fn test_ttfb_from_navigation_timing() {
        let mut tracker = PerformanceTracker::new();
        let update = tracker.record_navigation_timing(10.0, 95.0).unwrap();
        assert_eq!(update.ttfb, Some(85.0));
    }

    #[test]
    fn test_resource_scan_threshold_and_once() {
        let mut tracker = PerformanceTracker::new();
        let entries = vec![
            ResourceTiming {
                name: "/img/hero.webp".to_string(),
                duration_ms: 1500.0,
            },
            ResourceTiming {
                name: "/css/site.css".to_string(),
                duration_ms: 90.0,
            },
        ];

        let slow = tracker.scan_resources(&entries, 1000.0).unwrap();
        assert_eq!(slow.len(), 1);
        assert_eq!(slow[0].name, "/img/hero.webp");

        // Second scan is a no-op
        assert!(tracker.scan_resources(&entries, 1000.0).is_none());
    }

    #[test]
    fn test_disconnect_stops_observation() {
        let mut tracker = PerformanceTracker::new();
        tracker.disconnect();

        assert!(tracker.record_lcp(1000.0).is_none());
        assert!(tracker.record_layout_shift(0.1, false).is_none());
        assert!(!tracker.is_observing());
    }
}
