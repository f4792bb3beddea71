//! User interaction observation: selector resolution, scroll depth, value
//! capture.

use crate::signal::ElementRef;

/// Observer state for interaction signals.
#[derive(Debug)]
pub struct InteractionTracker {
    /// Thresholds that emit a scroll-depth event, ascending, deduplicated.
    thresholds: Vec<u8>,
    /// Running maximum scroll depth percentage.
    max_depth: u8,
    /// Thresholds already emitted.
    crossed: Vec<u8>,
    /// Last observed viewport size (width, height).
    viewport: Option<(f64, f64)>,
    /// Captured value/text truncation length, in characters.
    truncate_chars: usize,
}

impl InteractionTracker {
    pub fn new(mut thresholds: Vec<u8>, truncate_chars: usize) -> Self {
        thresholds.sort_unstable();
        thresholds.dedup();
        Self {
            thresholds,
            max_depth: 0,
            crossed: Vec::new(),
            viewport: None,
            truncate_chars,
        }
    }

    /// Resolve an element to a short selector: `#id` wins, then the first
    /// class token prefixed with `.`, then the lowercase tag name.
    pub fn resolve_selector(&self, target: &ElementRef) -> String {
        if let Some(ref id) = target.id {
            if !id.is_empty() {
                return format!("#{id}");
            }
        }
        if let Some(class) = target.classes.iter().find(|c| !c.is_empty()) {
            return format!(".{class}");
        }
        target.tag.to_lowercase()
    }

    /// Truncate a captured element value/text, character-safe.
    pub fn truncate_value(&self, text: Option<&str>) -> Option<String> {
        text.map(|t| t.chars().take(self.truncate_chars).collect())
    }

    /// Process a scroll position sample. Returns the thresholds newly crossed
    /// by the running maximum, ascending; each threshold is returned at most
    /// once per session, and decreasing scroll never produces any.
    pub fn record_scroll(
        &mut self,
        scroll_y: f64,
        viewport_width: f64,
        viewport_height: f64,
        document_height: f64,
    ) -> Vec<u8> {
        self.viewport = Some((viewport_width, viewport_height));

        let scrollable = document_height - viewport_height;
        let percent = if scrollable <= 0.0 {
            // Fully visible page: nothing to scroll through
            100u8
        } else {
            ((scroll_y / scrollable) * 100.0).round().clamp(0.0, 100.0) as u8
        };

        if percent <= self.max_depth {
            return Vec::new();
        }
        self.max_depth = percent;

        let newly: Vec<u8> = self
            .thresholds
            .iter()
            .copied()
            .filter(|t| percent >= *t && !self.crossed.contains(t))
            .collect();
        self.crossed.extend_from_slice(&newly);
        newly
    }

    /// Running maximum scroll depth percentage.
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Last observed viewport size, if any scroll sample arrived.
    pub fn viewport(&self) -> Option<(f64, f64)> {
        self.viewport
    }
}
