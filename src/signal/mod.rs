//! Browser signal intake for the telemetry engine.
//!
//! The engine never wraps global browser hooks. Instead the host integration
//! layer - a page-side shim, the ingest server, or the replay tool - delivers
//! typed [`BrowserSignal`] values, and the engine dispatches them to its
//! internal observers.

pub mod channel;
pub mod types;

// Re-export commonly used types
pub use channel::{signal_channel, SignalReceiver, SignalSender};
pub use types::{BrowserSignal, ElementRef, ResourceTiming};
