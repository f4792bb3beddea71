//! The telemetry engine: single point of truth for capturing, normalizing,
//! and exporting all client-observable signals during a session.
//!
//! The engine is constructed explicitly with its collaborators injected - the
//! analytics sink, the app state store, and the variant store - so hosts
//! control its lifetime and tests substitute fakes. One engine per page
//! session; the host decides where it lives.
//!
//! Failure isolation is a hard invariant: signal handling and tracking never
//! return errors and never panic on malformed input. Only [`TelemetryEngine::export_data`],
//! an explicit caller-driven operation, surfaces errors.

pub mod export;
pub mod interaction;
pub mod navigation;
pub mod performance;
pub mod session;

pub use export::{ExportError, ExportFormat, SessionSummary};
pub use session::{generate_session_id, Session};

use crate::abtest::VariantStore;
use crate::config::Config;
use crate::event::{Event, EventCategory, EventPayload};
use crate::signal::BrowserSignal;
use crate::sink::{AnalyticsSink, SinkBeacon};
use crate::stats::{create_shared_stats, SharedStats};
use crate::store::{AnalyticsUpdate, AppStateStore, PerformanceUpdate};
use chrono::Utc;
use interaction::InteractionTracker;
use navigation::NavigationTracker;
use performance::PerformanceTracker;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Host-provided page context, captured once at engine construction.
#[derive(Debug, Clone)]
pub struct ClientContext {
    /// Browser user agent, denormalized onto every event.
    pub user_agent: String,
    /// Path of the page the session started on.
    pub initial_path: String,
    /// Document referrer, attached to conversions.
    pub referrer: Option<String>,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            user_agent: "unknown".to_string(),
            initial_path: "/".to_string(),
            referrer: None,
        }
    }
}

/// Bounding box of an element, in viewport coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ElementBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Heat-map sample kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatMapKind {
    Click,
    Hover,
    Scroll,
}

impl HeatMapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeatMapKind::Click => "click",
            HeatMapKind::Hover => "hover",
            HeatMapKind::Scroll => "scroll",
        }
    }
}

/// Session telemetry engine.
pub struct TelemetryEngine {
    config: Config,
    context: ClientContext,
    session: Session,
    events: Vec<Event>,
    sink: Arc<dyn AnalyticsSink>,
    store: Arc<dyn AppStateStore>,
    variants: Box<dyn VariantStore>,
    stats: SharedStats,
    performance: PerformanceTracker,
    interaction: InteractionTracker,
    navigation: NavigationTracker,
    destroyed: bool,
}

impl TelemetryEngine {
    /// Construct an engine for a new session.
    pub fn new(
        config: Config,
        context: ClientContext,
        sink: Arc<dyn AnalyticsSink>,
        store: Arc<dyn AppStateStore>,
        variants: Box<dyn VariantStore>,
    ) -> Self {
        let interaction =
            InteractionTracker::new(config.scroll_thresholds.clone(), config.value_truncate_chars);
        let navigation = NavigationTracker::new(context.initial_path.clone());

        Self {
            config,
            context,
            session: Session::new(),
            events: Vec::new(),
            sink,
            store,
            variants,
            stats: create_shared_stats(),
            performance: PerformanceTracker::new(),
            interaction,
            navigation,
            destroyed: false,
        }
    }

    /// The current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Events captured so far, in capture order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events captured so far.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Shared statistics block.
    pub fn stats(&self) -> SharedStats {
        Arc::clone(&self.stats)
    }

    /// Attach the authenticated user identity to all subsequent events.
    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.session.user_id = Some(user_id.into());
    }

    /// Capture one event: append to the session log, forward to the sink
    /// best-effort, and for engagement events update the app state store.
    ///
    /// Append happens before sink dispatch, which happens before the store
    /// update; a sink failure never rolls back the append.
    pub fn track_event(
        &mut self,
        category: EventCategory,
        action: impl Into<String>,
        payload: EventPayload,
    ) {
        let action = action.into();
        if action.is_empty() {
            warn!(category = %category, "Dropping event with empty action");
            return;
        }

        let event = Event {
            category,
            action,
            payload,
            timestamp: Utc::now(),
            session_id: self.session.session_id.clone(),
            user_id: self.session.user_id.clone(),
            page: self.navigation.current_path().to_string(),
            user_agent: self.context.user_agent.clone(),
        };

        let beacon = SinkBeacon {
            action: event.action.clone(),
            category: event.category.as_str().to_string(),
            label: Some(event.page.clone()),
            value: None,
            session_tag: self.session.session_id.clone(),
        };

        self.events.push(event);
        self.stats.record_event();

        match self.sink.dispatch(&beacon) {
            Ok(()) => self.stats.record_sink_delivery(),
            Err(e) => {
                debug!(error = %e, action = %beacon.action, "Sink dispatch failed");
                self.stats.record_sink_failure();
            }
        }

        if category == EventCategory::Engagement {
            self.store.update_analytics(AnalyticsUpdate {
                last_interaction: Utc::now(),
            });
        }
    }

    /// Record a conversion, and when the kind is a funnel step, its
    /// completion with the zero-based step index. Conversions outside the
    /// funnel sequence produce no funnel event.
    pub fn track_conversion(&mut self, kind: &str) {
        let payload = EventPayload::Conversion {
            kind: kind.to_string(),
            referrer: self.context.referrer.clone(),
        };
        self.track_event(EventCategory::Conversion, kind, payload);

        if let Some(index) = self.config.funnel_index(kind) {
            self.stats.record_funnel_step();
            self.track_event(
                EventCategory::Funnel,
                "step_completion",
                EventPayload::FunnelStep {
                    step: kind.to_string(),
                    index,
                },
            );
        }
    }

    /// Stable A/B variant assignment. A stored variant is returned unchanged
    /// while it remains a member of `variants`; otherwise a fresh uniform
    /// pick is made, persisted, and announced as an event. Returns `None`
    /// only for an empty variant list. Store failures are logged, never
    /// surfaced.
    pub fn assign_ab_test_variant(&mut self, test: &str, variants: &[String]) -> Option<String> {
        if variants.is_empty() {
            warn!(test, "A/B test has no variants to assign");
            return None;
        }

        match self.variants.get(test) {
            Ok(Some(stored)) if variants.contains(&stored) => return Some(stored),
            Ok(_) => {}
            Err(e) => warn!(error = %e, test, "Variant lookup failed; reassigning"),
        }

        let pick = variants[rand::thread_rng().gen_range(0..variants.len())].clone();
        if let Err(e) = self.variants.set(test, &pick) {
            warn!(error = %e, test, "Variant persistence failed");
        }

        self.track_event(
            EventCategory::AbTest,
            "variant_assigned",
            EventPayload::VariantAssigned {
                test: test.to_string(),
                variant: pick.clone(),
            },
        );

        Some(pick)
    }

    /// Record an A/B conversion. The caller is responsible for passing the
    /// variant it was assigned; no re-validation happens here.
    pub fn track_ab_test_conversion(&mut self, test: &str, variant: &str, conversion: &str) {
        self.track_event(
            EventCategory::AbTest,
            "conversion",
            EventPayload::AbConversion {
                test: test.to_string(),
                variant: variant.to_string(),
                conversion: conversion.to_string(),
            },
        );
    }

    /// Sample an element for the heat map: bounding-box center in viewport
    /// coordinates plus the last observed viewport size. Explicit API;
    /// callers opt in per element.
    pub fn collect_heat_map_data(&mut self, bounds: &ElementBounds, kind: HeatMapKind) {
        let (viewport_width, viewport_height) = self.interaction.viewport().unwrap_or((0.0, 0.0));
        self.track_event(
            EventCategory::Heatmap,
            kind.as_str(),
            EventPayload::HeatMap {
                x: bounds.x + bounds.width / 2.0,
                y: bounds.y + bounds.height / 2.0,
                viewport_width,
                viewport_height,
            },
        );
    }

    /// Export the session in the requested format. The one operation whose
    /// errors surface to the caller.
    pub fn export_data(&self, format: ExportFormat) -> Result<String, ExportError> {
        let out = match format {
            ExportFormat::Json => export::export_json(&self.session, &self.events)?,
            ExportFormat::Csv => export::export_csv(&self.events),
        };
        self.stats.record_export();
        Ok(out)
    }

    /// Computed summary over the current event log.
    pub fn summary(&self) -> SessionSummary {
        export::build_summary(&self.session, &self.events)
    }

    /// Dispatch one browser signal to the matching observer. Never fails;
    /// malformed input degrades to a warning at worst.
    pub fn handle_signal(&mut self, signal: BrowserSignal) {
        match signal {
            BrowserSignal::Paint {
                name,
                start_time_ms,
            } => {
                if let Some(update) = self.performance.record_paint(&name, start_time_ms) {
                    self.push_performance(update);
                }
            }
            BrowserSignal::LargestContentfulPaint { start_time_ms } => {
                if let Some(update) = self.performance.record_lcp(start_time_ms) {
                    self.push_performance(update);
                }
            }
            BrowserSignal::FirstInput {
                start_time_ms,
                processing_start_ms,
            } => {
                if let Some(update) = self
                    .performance
                    .record_first_input(start_time_ms, processing_start_ms)
                {
                    self.push_performance(update);
                }
            }
            BrowserSignal::LayoutShift {
                value,
                had_recent_input,
            } => {
                if let Some(update) = self.performance.record_layout_shift(value, had_recent_input)
                {
                    self.push_performance(update);
                }
            }
            BrowserSignal::NavigationTiming {
                fetch_start_ms,
                response_start_ms,
            } => {
                if let Some(update) = self
                    .performance
                    .record_navigation_timing(fetch_start_ms, response_start_ms)
                {
                    self.push_performance(update);
                }
            }
            BrowserSignal::ResourceTimings { entries } => {
                let threshold = self.config.slow_resource_threshold_ms;
                if let Some(resources) = self.performance.scan_resources(&entries, threshold) {
                    self.track_event(
                        EventCategory::Performance,
                        "slow_resources",
                        EventPayload::SlowResources {
                            count: resources.len(),
                            resources,
                        },
                    );
                }
            }
            BrowserSignal::Click { target, x, y } => {
                let element = self.interaction.resolve_selector(&target);
                let value = self.interaction.truncate_value(target.text.as_deref());
                self.track_event(
                    EventCategory::Interaction,
                    "click",
                    EventPayload::Click {
                        element,
                        x,
                        y,
                        value,
                    },
                );
            }
            BrowserSignal::FocusIn { target } => {
                // Only form fields are of interest
                if !matches!(target.tag.to_lowercase().as_str(), "input" | "textarea") {
                    return;
                }
                let element = self.interaction.resolve_selector(&target);
                let value = self.interaction.truncate_value(target.text.as_deref());
                self.track_event(
                    EventCategory::Interaction,
                    "form_focus",
                    EventPayload::FormFocus { element, value },
                );
            }
            BrowserSignal::Scroll {
                scroll_y,
                viewport_width,
                viewport_height,
                document_height,
            } => {
                let crossed = self.interaction.record_scroll(
                    scroll_y,
                    viewport_width,
                    viewport_height,
                    document_height,
                );
                for threshold in crossed {
                    self.track_event(
                        EventCategory::Engagement,
                        "scroll_depth",
                        EventPayload::ScrollDepth { percent: threshold },
                    );
                }
            }
            BrowserSignal::RouteChange { path } | BrowserSignal::HistoryPop { path } => {
                if let Some((from, to)) = self.navigation.record_route(&path) {
                    self.track_event(
                        EventCategory::Navigation,
                        "page_view",
                        EventPayload::PageView { from, to },
                    );
                }
            }
            BrowserSignal::ScriptError {
                message,
                source,
                line,
                column,
                stack,
            } => {
                // Malformed error events still get captured
                let message = message.unwrap_or_else(|| "unknown".to_string());
                self.track_event(
                    EventCategory::Error,
                    "javascript_error",
                    EventPayload::ScriptError {
                        message,
                        source,
                        line,
                        column,
                        stack,
                    },
                );
            }
            BrowserSignal::PromiseRejection { reason } => {
                self.track_event(
                    EventCategory::Error,
                    "promise_rejection",
                    EventPayload::PromiseRejection { reason },
                );
            }
            BrowserSignal::PageUnload => {
                if self.destroyed {
                    return;
                }
                let duration_ms = self.session.duration_ms();
                self.track_event(
                    EventCategory::Engagement,
                    "time_on_page",
                    EventPayload::TimeOnPage { duration_ms },
                );
                self.destroy();
            }
        }
    }

    /// Flush the session: stop performance observation and emit the final
    /// session-end event. Idempotent; later calls are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.performance.disconnect();

        let duration_ms = self.session.duration_ms();
        let event_count = self.events.len();
        self.track_event(
            EventCategory::Session,
            "end",
            EventPayload::SessionEnd {
                duration_ms,
                event_count,
            },
        );
        self.destroyed = true;
    }

    /// Whether the session has been flushed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn push_performance(&self, update: PerformanceUpdate) {
        self.store.update_performance(update);
    }
}
