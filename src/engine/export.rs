//! Session export and reporting.
//!
//! JSON export carries session metadata, the full event log, and a computed
//! summary. CSV export flattens the event log alone into a fixed six-column
//! table with RFC-4180-style field quoting.

use crate::engine::session::Session;
use crate::event::{Event, EventCategory};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Export errors. These surface to the caller; export is the one explicit,
/// caller-driven operation in the engine.
#[derive(Debug)]
pub enum ExportError {
    Serialization(String),
    UnknownFormat(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Serialization(e) => write!(f, "Serialization error: {e}"),
            ExportError::UnknownFormat(s) => write!(f, "Unknown export format: {s}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Computed session summary.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub total_events: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub session_duration_ms: i64,
    pub distinct_pages: usize,
}

/// Build the summary over the current event log.
pub fn build_summary(session: &Session, events: &[Event]) -> SessionSummary {
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for event in events {
        *category_counts
            .entry(event.category.as_str().to_string())
            .or_insert(0) += 1;
    }

    let distinct_pages = events
        .iter()
        .filter(|e| e.category == EventCategory::Navigation)
        .map(|e| e.page.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    SessionSummary {
        total_events: events.len(),
        category_counts,
        session_duration_ms: session.duration_ms(),
        distinct_pages,
    }
}

#[derive(Serialize)]
struct SessionInfo<'a> {
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    start_time: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
struct SessionExport<'a> {
    session: SessionInfo<'a>,
    events: &'a [Event],
    summary: SessionSummary,
}

/// Export the session as a JSON document.
pub fn export_json(session: &Session, events: &[Event]) -> Result<String, ExportError> {
    let export = SessionExport {
        session: SessionInfo {
            session_id: &session.session_id,
            user_id: session.user_id.as_deref(),
            start_time: session.start_time,
        },
        events,
        summary: build_summary(session, events),
    };

    serde_json::to_string_pretty(&export).map_err(|e| ExportError::Serialization(e.to_string()))
}

/// Fixed CSV column order.
const CSV_HEADER: &str = "timestamp,category,action,page,element,value";

/// Export the event log as CSV: header row, then one row per event.
pub fn export_csv(events: &[Event]) -> String {
    let mut lines = Vec::with_capacity(events.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for event in events {
        let fields = [
            event.timestamp.to_rfc3339(),
            event.category.as_str().to_string(),
            event.action.clone(),
            event.page.clone(),
            event.payload.element().unwrap_or("").to_string(),
            event.payload.value_text().unwrap_or("").to_string(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// Quote a CSV field when it contains a comma, quote, or line break; inner
/// quotes are doubled.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventPayload;
    use chrono::Utc;

    fn make_event(category: EventCategory, action: &str, page: &str) -> Event {
        Event {
            category,
            action: action.to_string(),
            payload: EventPayload::None,
            timestamp: Utc::now(),
            session_id: "123-abcdefghi".to_string(),
            user_id: None,
            page: page.to_string(),
            user_agent: "test".to_string(),
        }
    }

    #[test]
    fn test_csv_structure() {
        let events = vec![
            make_event(EventCategory::Interaction, "click", "/"),
            make_event(EventCategory::Navigation, "page_view", "/portfolio"),
            make_event(EventCategory::Engagement, "scroll_depth", "/portfolio"),
        ];

        let csv = export_csv(&events);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), 6, "bad row: {line}");
        }
    }

    #[test]
    fn test_csv_quotes_embedded_commas_and_quotes() {
        let mut event = make_event(EventCategory::Interaction, "click", "/");
        event.payload = EventPayload::Click {
            element: "#cta".to_string(),
            x: 0.0,
            y: 0.0,
            value: Some("Hello, \"world\"".to_string()),
        };

        let csv = export_csv(&[event]);
        let row = csv.split('\n').nth(1).unwrap();
        assert!(row.ends_with("#cta,\"Hello, \"\"world\"\"\""));
    }

    #[test]
    fn test_summary_counts_and_distinct_pages() {
        let session = Session::new();
        let events = vec![
            make_event(EventCategory::Navigation, "page_view", "/portfolio"),
            make_event(EventCategory::Navigation, "page_view", "/services"),
            make_event(EventCategory::Navigation, "page_view", "/portfolio"),
            make_event(EventCategory::Interaction, "click", "/services"),
        ];

        let summary = build_summary(&session, &events);
        assert_eq!(summary.total_events, 4);
        assert_eq!(summary.category_counts["navigation"], 3);
        assert_eq!(summary.category_counts["interaction"], 1);
        assert_eq!(summary.distinct_pages, 2);
        assert!(summary.session_duration_ms >= 0);
    }

    #[test]
    fn test_json_export_contains_sections() {
        let session = Session::new();
        let events = vec![make_event(EventCategory::Session, "end", "/")];

        let json = export_json(&session, &events).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["session"]["session_id"], session.session_id);
        assert_eq!(value["summary"]["total_events"], 1);
        assert!(value["events"].is_array());
    }
}
