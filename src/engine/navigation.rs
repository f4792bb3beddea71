//! Single-page-app navigation observation.
//!
//! The application's router (or the back/forward signal) reports the new path
//! explicitly; no global history functions are wrapped. The tracker remembers
//! the current path and reports transitions.

/// Observer state for navigation signals.
#[derive(Debug)]
pub struct NavigationTracker {
    current_path: String,
}

impl NavigationTracker {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            current_path: initial_path.into(),
        }
    }

    /// Process a reported path. Returns `(from, to)` when the path actually
    /// changed; the remembered path is updated before returning, so events
    /// emitted afterwards carry the destination path.
    pub fn record_route(&mut self, path: &str) -> Option<(String, String)> {
        if path == self.current_path {
            return None;
        }
        let from = std::mem::replace(&mut self.current_path, path.to_string());
        Some((from, self.current_path.clone()))
    }

    /// Path events are currently stamped with.
    pub fn current_path(&self) -> &str {
        &self.current_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_change_reports_transition() {
        let mut tracker = NavigationTracker::new("/");
        let (from, to) = tracker.record_route("/portfolio").unwrap();
        assert_eq!(from, "/");
        assert_eq!(to, "/portfolio");
        assert_eq!(tracker.current_path(), "/portfolio");
    }

    #[test]
    fn test_same_path_is_not_a_transition() {
        let mut tracker = NavigationTracker::new("/contact");
        assert!(tracker.record_route("/contact").is_none());
    }

    #[test]
    fn test_back_forward_after_push() {
        let mut tracker = NavigationTracker::new("/");
        tracker.record_route("/services");
        let (from, to) = tracker.record_route("/").unwrap();
        assert_eq!(from, "/services");
        assert_eq!(to, "/");
    }
}
