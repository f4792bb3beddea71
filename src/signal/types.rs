//! Typed browser signals.
//!
//! Each variant corresponds to one browser-side observation the host layer
//! can deliver. Performance variants map to performance-timeline entry types;
//! their absence simply means the capability was unavailable on the page.

use serde::{Deserialize, Serialize};

/// Reference to the DOM element a signal targeted.
///
/// Carries just enough structure for short-selector resolution: id wins over
/// the first class token, which wins over the lowercase tag name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    pub tag: String,
    /// Current value or visible text of the element, untruncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ElementRef {
    /// Element with only a tag name.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Element with an id.
    pub fn with_id(tag: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            tag: tag.into(),
            ..Self::default()
        }
    }
}

/// One resource-timing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTiming {
    pub name: String,
    pub duration_ms: f64,
}

/// A browser-side observation delivered by the host layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum BrowserSignal {
    /// Paint timeline entry (`first-paint`, `first-contentful-paint`).
    Paint { name: String, start_time_ms: f64 },
    /// Largest-contentful-paint candidate. Browsers revise the candidate, so
    /// more than one of these may arrive per page.
    LargestContentfulPaint { start_time_ms: f64 },
    /// First-input timing entry.
    FirstInput {
        start_time_ms: f64,
        processing_start_ms: f64,
    },
    /// Layout-shift entry. `had_recent_input` is the browser's own
    /// input-attribution flag.
    LayoutShift { value: f64, had_recent_input: bool },
    /// Navigation timing, delivered once the page load completes.
    NavigationTiming {
        fetch_start_ms: f64,
        response_start_ms: f64,
    },
    /// Resource timing entries, delivered once after load.
    ResourceTimings { entries: Vec<ResourceTiming> },
    /// Pointer click anywhere in the document.
    Click { target: ElementRef, x: f64, y: f64 },
    /// Focus entering an input or textarea (capture phase on the page side).
    FocusIn { target: ElementRef },
    /// Scroll position sample.
    Scroll {
        scroll_y: f64,
        viewport_width: f64,
        viewport_height: f64,
        document_height: f64,
    },
    /// Route change performed by the application router (the explicit hook
    /// that replaces history-API wrapping).
    RouteChange { path: String },
    /// Browser back/forward navigation.
    HistoryPop { path: String },
    /// Uncaught script error. Fields may be missing on malformed events.
    ScriptError {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        column: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
    /// Uncaught promise rejection.
    PromiseRejection { reason: String },
    /// Page teardown. The engine records time-on-page and flushes the session.
    PageUnload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_tagged_serialization() {
        let signal = BrowserSignal::LayoutShift {
            value: 0.05,
            had_recent_input: false,
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["signal"], "layout_shift");
        assert_eq!(json["had_recent_input"], false);
    }

    #[test]
    fn test_script_error_without_message_roundtrips() {
        let json = r#"{"signal":"script_error","line":12}"#;
        let signal: BrowserSignal = serde_json::from_str(json).unwrap();
        match signal {
            BrowserSignal::ScriptError { message, line, .. } => {
                assert!(message.is_none());
                assert_eq!(line, Some(12));
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[test]
    fn test_element_ref_constructors() {
        let plain = ElementRef::tag("button");
        assert!(plain.id.is_none());
        assert_eq!(plain.tag, "button");

        let with_id = ElementRef::with_id("div", "hero");
        assert_eq!(with_id.id.as_deref(), Some("hero"));
    }
}
