//! Sitepulse - session telemetry engine for marketing-site analytics.
//!
//! This library captures browser-observable signals for one page session,
//! normalizes them into a typed event envelope, forwards them to an external
//! analytics sink, and exports the session as JSON or CSV.
//!
//! # Guarantees
//!
//! - **Append-only log**: events are never mutated after capture
//! - **Fire-and-forget forwarding**: sink failures never reach tracking callers
//! - **Failure isolation**: signal handling never panics; malformed input
//!   degrades to a warning
//! - **Stable experiments**: A/B variants persist per test name across sessions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Telemetry Engine                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │   Signals   │──▶│  Observers  │──▶│  Event log  │        │
//! │  │   (host)    │   │ (perf/nav/…)│   │ (append)    │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                           │                  │              │
//! │                           ▼                  ▼              │
//! │                    ┌─────────────┐   ┌─────────────┐        │
//! │                    │  App store  │   │  Sink +     │        │
//! │                    │  (vitals)   │   │  export     │        │
//! │                    └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sitepulse::{
//!     abtest::MemoryVariantStore,
//!     config::Config,
//!     engine::{ClientContext, ExportFormat, TelemetryEngine},
//!     signal::BrowserSignal,
//!     sink::NullSink,
//!     store::SharedAppState,
//! };
//!
//! let mut engine = TelemetryEngine::new(
//!     Config::default(),
//!     ClientContext::default(),
//!     Arc::new(NullSink),
//!     SharedAppState::shared(),
//!     Box::new(MemoryVariantStore::new()),
//! );
//!
//! engine.handle_signal(BrowserSignal::RouteChange { path: "/portfolio".into() });
//! engine.track_conversion("portfolio_view");
//!
//! let csv = engine.export_data(ExportFormat::Csv).unwrap();
//! assert!(csv.starts_with("timestamp,category,action,page,element,value"));
//! ```

pub mod abtest;
pub mod config;
pub mod engine;
pub mod event;
pub mod signal;
pub mod sink;
pub mod stats;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use abtest::{FileVariantStore, MemoryVariantStore, VariantStore};
pub use config::Config;
pub use engine::{
    ClientContext, ElementBounds, ExportError, ExportFormat, HeatMapKind, Session,
    SessionSummary, TelemetryEngine,
};
pub use event::{Event, EventCategory, EventPayload};
pub use signal::{signal_channel, BrowserSignal, ElementRef, SignalReceiver, SignalSender};
pub use sink::{AnalyticsSink, NullSink, SinkBeacon, SinkError};
pub use stats::{EngineStats, SharedStats, StatsSnapshot};
pub use store::{AppStateStore, PerformanceUpdate, SharedAppState};

// HTTP sink re-exports (when enabled)
#[cfg(feature = "sink-http")]
pub use sink::{BlockingHttpSink, HttpSinkClient, SinkConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
