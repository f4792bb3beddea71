//! Typed event model for the telemetry engine.
//!
//! Every observed occurrence is normalized into an [`Event`] envelope: a
//! closed category, a free-form action name, and a tagged payload. Events are
//! append-only - once constructed they are never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Performance,
    Interaction,
    Navigation,
    Error,
    Conversion,
    AbTest,
    Heatmap,
    Funnel,
    Engagement,
    Session,
}

impl EventCategory {
    /// All categories, in a stable order for per-category aggregation.
    pub const ALL: [EventCategory; 10] = [
        EventCategory::Performance,
        EventCategory::Interaction,
        EventCategory::Navigation,
        EventCategory::Error,
        EventCategory::Conversion,
        EventCategory::AbTest,
        EventCategory::Heatmap,
        EventCategory::Funnel,
        EventCategory::Engagement,
        EventCategory::Session,
    ];

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Performance => "performance",
            EventCategory::Interaction => "interaction",
            EventCategory::Navigation => "navigation",
            EventCategory::Error => "error",
            EventCategory::Conversion => "conversion",
            EventCategory::AbTest => "ab_test",
            EventCategory::Heatmap => "heatmap",
            EventCategory::Funnel => "funnel",
            EventCategory::Engagement => "engagement",
            EventCategory::Session => "session",
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource whose load exceeded the slow-resource threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowResource {
    pub name: String,
    pub duration_ms: f64,
}

/// Payload shapes, one variant per category+action pair.
///
/// Each action's shape is explicit and statically checked; tracking call
/// sites cannot drift from what export and the sink expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// `interaction`/`click`
    Click {
        element: String,
        x: f64,
        y: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// `interaction`/`form_focus`
    FormFocus {
        element: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// `engagement`/`scroll_depth`
    ScrollDepth { percent: u8 },
    /// `engagement`/`time_on_page`
    TimeOnPage { duration_ms: i64 },
    /// `navigation`/`page_view`
    PageView { from: String, to: String },
    /// `performance`/`slow_resources`
    SlowResources {
        count: usize,
        resources: Vec<SlowResource>,
    },
    /// `error`/`javascript_error`
    ScriptError {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        column: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
    /// `error`/`promise_rejection`
    PromiseRejection { reason: String },
    /// `conversion`/`<kind>`
    Conversion {
        kind: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        referrer: Option<String>,
    },
    /// `funnel`/`step_completion`
    FunnelStep { step: String, index: usize },
    /// `ab_test`/`variant_assigned`
    VariantAssigned { test: String, variant: String },
    /// `ab_test`/`conversion`
    AbConversion {
        test: String,
        variant: String,
        conversion: String,
    },
    /// `heatmap`/`click|hover|scroll`
    HeatMap {
        x: f64,
        y: f64,
        viewport_width: f64,
        viewport_height: f64,
    },
    /// `session`/`end`
    SessionEnd { duration_ms: i64, event_count: usize },
    /// Actions that carry no payload.
    None,
}

impl EventPayload {
    /// Short element selector, for payloads that reference a DOM element.
    pub fn element(&self) -> Option<&str> {
        match self {
            EventPayload::Click { element, .. } | EventPayload::FormFocus { element, .. } => {
                Some(element.as_str())
            }
            _ => None,
        }
    }

    /// Captured element value/text, where the action records one.
    pub fn value_text(&self) -> Option<&str> {
        match self {
            EventPayload::Click { value, .. } | EventPayload::FormFocus { value, .. } => {
                value.as_deref()
            }
            _ => None,
        }
    }
}

/// One observed occurrence, with session context denormalized onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub category: EventCategory,
    pub action: String,
    pub payload: EventPayload,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub page: String,
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(EventCategory::AbTest.as_str(), "ab_test");
        assert_eq!(EventCategory::Heatmap.as_str(), "heatmap");

        let json = serde_json::to_string(&EventCategory::AbTest).unwrap();
        assert_eq!(json, "\"ab_test\"");
    }

    #[test]
    fn test_payload_element_and_value() {
        let click = EventPayload::Click {
            element: "#cta".to_string(),
            x: 10.0,
            y: 20.0,
            value: Some("Get a quote".to_string()),
        };
        assert_eq!(click.element(), Some("#cta"));
        assert_eq!(click.value_text(), Some("Get a quote"));

        let depth = EventPayload::ScrollDepth { percent: 50 };
        assert_eq!(depth.element(), None);
        assert_eq!(depth.value_text(), None);
    }

    #[test]
    fn test_payload_tagged_serialization() {
        let payload = EventPayload::FunnelStep {
            step: "portfolio_view".to_string(),
            index: 1,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "funnel_step");
        assert_eq!(json["index"], 1);
    }
}
