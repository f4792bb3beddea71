//! Demonstration of a full telemetry session.
//!
//! This example shows how to:
//! 1. Construct an engine with injected collaborators
//! 2. Feed it browser signals through the signal channel
//! 3. Track conversions and A/B assignments
//! 4. Export the session and read back the app state
//!
//! Run with: cargo run --example session_demo

use std::sync::Arc;
use std::time::Duration;

use sitepulse::{
    abtest::MemoryVariantStore,
    config::Config,
    engine::{ClientContext, ExportFormat, TelemetryEngine},
    signal::{signal_channel, BrowserSignal, ElementRef, ResourceTiming},
    sink::NullSink,
    store::SharedAppState,
};

fn main() {
    println!("Sitepulse - Session Demo");
    println!("========================");
    println!();

    let store = SharedAppState::shared();
    let mut engine = TelemetryEngine::new(
        Config::default(),
        ClientContext {
            user_agent: "session-demo".to_string(),
            initial_path: "/".to_string(),
            referrer: Some("https://search.example/q=builders".to_string()),
        },
        Arc::new(NullSink),
        store.clone(),
        Box::new(MemoryVariantStore::new()),
    );

    println!("Session ID: {}", engine.session().session_id);
    println!();

    // A host thread would normally produce these; here we script a visit.
    let (tx, rx) = signal_channel();
    std::thread::spawn(move || {
        let visit = vec![
            BrowserSignal::Paint {
                name: "first-contentful-paint".to_string(),
                start_time_ms: 410.0,
            },
            BrowserSignal::LargestContentfulPaint {
                start_time_ms: 1150.0,
            },
            BrowserSignal::NavigationTiming {
                fetch_start_ms: 2.0,
                response_start_ms: 180.0,
            },
            BrowserSignal::ResourceTimings {
                entries: vec![ResourceTiming {
                    name: "/img/showcase-tower.jpg".to_string(),
                    duration_ms: 1800.0,
                }],
            },
            BrowserSignal::RouteChange {
                path: "/portfolio".to_string(),
            },
            BrowserSignal::Scroll {
                scroll_y: 1200.0,
                viewport_width: 1440.0,
                viewport_height: 900.0,
                document_height: 3300.0,
            },
            BrowserSignal::Click {
                target: ElementRef::with_id("button", "contact-cta"),
                x: 720.0,
                y: 410.0,
            },
            BrowserSignal::PageUnload,
        ];
        for signal in visit {
            if tx.send(signal).is_err() {
                break;
            }
        }
    });

    while let Ok(signal) = rx.recv_timeout(Duration::from_millis(200)) {
        engine.handle_signal(signal);
    }

    // Application-driven tracking
    let variant = engine
        .assign_ab_test_variant(
            "hero_copy",
            &["classic".to_string(), "bold".to_string()],
        )
        .expect("variant list is non-empty");
    println!("Assigned hero_copy variant: {variant}");

    engine.track_conversion("portfolio_view");

    println!();
    println!("Captured {} events", engine.event_count());

    let perf = store.performance();
    println!();
    println!("Core Web Vitals pushed to the app store:");
    println!("  FCP:  {:?}", perf.fcp);
    println!("  LCP:  {:?}", perf.lcp);
    println!("  TTFB: {:?}", perf.ttfb);

    println!();
    println!("CSV export:");
    match engine.export_data(ExportFormat::Csv) {
        Ok(csv) => {
            for line in csv.lines().take(10) {
                println!("  {line}");
            }
        }
        Err(e) => eprintln!("Export failed: {e}"),
    }

    println!();
    println!("{}", engine.stats().summary());
    println!();
    println!("Demo complete!");
}
