//! Sitepulse CLI
//!
//! Replays captured browser-signal logs through a telemetry engine and
//! exports or summarizes the resulting session.

use clap::{Parser, Subcommand};
use sitepulse::{
    abtest::{FileVariantStore, MemoryVariantStore, VariantStore},
    config::Config,
    engine::{ClientContext, ExportFormat, TelemetryEngine},
    signal::{signal_channel, BrowserSignal},
    sink::{AnalyticsSink, NullSink},
    store::SharedAppState,
    VERSION,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "sitepulse")]
#[command(version = VERSION)]
#[command(about = "Session telemetry engine for marketing-site analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured signal log through an engine and export the session
    Replay {
        /// Signal log file (one JSON signal per line)
        input: PathBuf,

        /// Export format (json or csv)
        #[arg(long, default_value = "json")]
        format: String,

        /// Write the export here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Initial page path of the session
        #[arg(long, default_value = "/")]
        page: String,

        /// User agent to stamp onto events
        #[arg(long, default_value = "sitepulse-replay")]
        user_agent: String,

        /// Collect endpoint host for beacon forwarding (requires sink-http feature)
        #[arg(long)]
        sink_host: Option<String>,

        /// Collect endpoint port
        #[arg(long, default_value = "8080")]
        sink_port: u16,

        /// Collect endpoint bearer token
        #[arg(long)]
        sink_token: Option<String>,
    },

    /// Replay a captured signal log and print session statistics
    Summary {
        /// Signal log file (one JSON signal per line)
        input: PathBuf,
    },

    /// Show configuration
    Config,

    /// Run the signal ingest server (requires server feature)
    #[cfg(feature = "server")]
    Serve {
        /// Port to bind to (0 for random)
        #[arg(long, default_value = "4317")]
        port: u16,

        /// Collect endpoint host for beacon forwarding
        #[arg(long)]
        sink_host: Option<String>,

        /// Collect endpoint port
        #[arg(long, default_value = "8080")]
        sink_port: u16,

        /// Collect endpoint bearer token
        #[arg(long)]
        sink_token: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            input,
            format,
            output,
            page,
            user_agent,
            sink_host,
            sink_port,
            sink_token,
        } => {
            cmd_replay(
                &input, &format, output, page, user_agent, sink_host, sink_port, sink_token,
            );
        }
        Commands::Summary { input } => {
            cmd_summary(&input);
        }
        Commands::Config => {
            cmd_config();
        }
        #[cfg(feature = "server")]
        Commands::Serve {
            port,
            sink_host,
            sink_port,
            sink_token,
        } => {
            cmd_serve(port, sink_host, sink_port, sink_token);
        }
    }
}

/// Build the sink from CLI flags.
#[allow(unused_variables)]
fn build_sink(
    sink_host: Option<String>,
    sink_port: u16,
    sink_token: Option<String>,
) -> Arc<dyn AnalyticsSink> {
    #[cfg(feature = "sink-http")]
    if let Some(host) = sink_host {
        let config = sitepulse::sink::SinkConfig::new(host, sink_port, sink_token);
        match sitepulse::sink::BlockingHttpSink::new(config) {
            Ok(sink) => {
                println!("  Beacon forwarding: enabled ({})", sink.client_id());
                return Arc::new(sink);
            }
            Err(e) => {
                eprintln!("Warning: Sink initialization failed: {e}");
                eprintln!("Continuing without beacon forwarding.");
            }
        }
    }

    #[cfg(not(feature = "sink-http"))]
    if sink_host.is_some() {
        eprintln!("Warning: --sink-host ignored (sink-http feature not enabled at compile time)");
    }

    Arc::new(NullSink)
}

/// Open the durable variant store, falling back to memory.
fn open_variant_store(config: &Config) -> Box<dyn VariantStore> {
    match FileVariantStore::open(FileVariantStore::default_path(&config.data_path)) {
        Ok(store) => Box::new(store),
        Err(e) => {
            eprintln!("Warning: Variant store unavailable, using in-memory: {e}");
            Box::new(MemoryVariantStore::new())
        }
    }
}

/// Feed every signal in the log file through the engine.
///
/// Signals stream through a bounded channel so replay behaves like live
/// capture; Ctrl+C stops the drain early.
fn replay_signals(engine: &mut TelemetryEngine, input: &PathBuf) -> Result<usize, String> {
    let file = std::fs::File::open(input).map_err(|e| format!("Cannot open {input:?}: {e}"))?;

    let (tx, rx) = signal_channel();
    let reader = thread::spawn(move || {
        let mut skipped = 0usize;
        for line in std::io::BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BrowserSignal>(&line) {
                Ok(signal) => {
                    if tx.send(signal).is_err() {
                        break;
                    }
                }
                Err(_) => skipped += 1,
            }
        }
        skipped
    });

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let mut processed = 0usize;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(signal) => {
                engine.handle_signal(signal);
                processed += 1;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if reader.is_finished() && rx.is_empty() {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Unblock the reader if it is still sending into a full channel
    drop(rx);
    let skipped = reader.join().unwrap_or(0);
    if skipped > 0 {
        eprintln!("Warning: Skipped {skipped} malformed signal lines");
    }

    Ok(processed)
}

#[allow(clippy::too_many_arguments)]
fn cmd_replay(
    input: &PathBuf,
    format: &str,
    output: Option<PathBuf>,
    page: String,
    user_agent: String,
    sink_host: Option<String>,
    sink_port: u16,
    sink_token: Option<String>,
) {
    let format: ExportFormat = match format.parse() {
        Ok(format) => format,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    println!("Sitepulse v{VERSION}");
    let sink = build_sink(sink_host, sink_port, sink_token);
    let variants = open_variant_store(&config);

    let context = ClientContext {
        user_agent,
        initial_path: page,
        referrer: None,
    };
    let mut engine = TelemetryEngine::new(config, context, sink, SharedAppState::shared(), variants);
    println!("Session ID: {}", engine.session().session_id);

    let processed = match replay_signals(&mut engine, input) {
        Ok(processed) => processed,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // A log without an unload still gets a closed session
    engine.destroy();

    println!(
        "Replayed {} signals into {} events",
        processed,
        engine.event_count()
    );

    let export = match engine.export_data(format) {
        Ok(export) => export,
        Err(e) => {
            eprintln!("Error: Export failed: {e}");
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, export) {
                eprintln!("Error: Could not write {path:?}: {e}");
                std::process::exit(1);
            }
            println!("Export written to {path:?}");
        }
        None => println!("{export}"),
    }
}

fn cmd_summary(input: &PathBuf) {
    let config = Config::load().unwrap_or_default();
    let mut engine = TelemetryEngine::new(
        config,
        ClientContext::default(),
        Arc::new(NullSink),
        SharedAppState::shared(),
        Box::new(MemoryVariantStore::new()),
    );

    if let Err(e) = replay_signals(&mut engine, input) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let summary = engine.summary();
    println!("{}", engine.stats().summary());
    println!();
    println!("Events by category:");
    for (category, count) in &summary.category_counts {
        println!("  {category}: {count}");
    }
    println!("Distinct pages visited: {}", summary.distinct_pages);
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration file: {:?}", Config::config_path());
    println!();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: Could not serialize config: {e}"),
    }
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16, sink_host: Option<String>, sink_port: u16, sink_token: Option<String>) {
    use sitepulse::server::{run, ServerConfig};
    use sitepulse::sink::SinkConfig;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let sink_config = sink_host.map(|host| SinkConfig::new(host, sink_port, sink_token));
    let server_config = ServerConfig::new(port, config, ClientContext::default(), sink_config);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: Could not create runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(async move {
        let (addr, _shutdown_tx) = match run(server_config).await {
            Ok(started) => started,
            Err(e) => {
                eprintln!("Error: Could not start server: {e}");
                std::process::exit(1);
            }
        };
        println!("Listening on http://{addr}");
        println!("Press Ctrl+C to stop");

        let _ = tokio::signal::ctrl_c().await;
        println!();
        println!("Shutting down.");
    });
}

fn ctrlc_handler(running: Arc<AtomicBool>) {
    if ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .is_err()
    {
        eprintln!("Warning: Could not install Ctrl+C handler");
    }
}
