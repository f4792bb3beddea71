//! HTTP server for receiving browser signals from a page-side shim.
//!
//! This module provides an HTTP server that:
//! - Accepts batches of browser signals via POST /signals
//! - Feeds them through a session telemetry engine
//! - Forwards the resulting beacons to the collect endpoint in the background
//!
//! # Architecture
//!
//! ```text
//! Page shim ──→ POST /signals ──→ telemetry engine ──→ collect endpoint
//!                                       ↓
//!                                 [event log / export]
//! ```

use crate::abtest::{FileVariantStore, MemoryVariantStore, VariantStore};
use crate::config::Config;
use crate::engine::{ClientContext, ExportFormat, TelemetryEngine};
use crate::signal::BrowserSignal;
use crate::sink::{AnalyticsSink, HttpSinkClient, NullSink, SinkBeacon, SinkConfig, SinkError};
use crate::stats::StatsSnapshot;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Engine configuration
    pub engine_config: Config,
    /// Page context reported by the shim
    pub context: ClientContext,
    /// Collect endpoint for beacon forwarding (None runs sinkless)
    pub sink_config: Option<SinkConfig>,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(
        port: u16,
        engine_config: Config,
        context: ClientContext,
        sink_config: Option<SinkConfig>,
    ) -> Self {
        Self {
            port,
            engine_config,
            context,
            sink_config,
        }
    }
}

/// Sink that hands beacons to a background forwarder task.
///
/// `dispatch` only enqueues, so the engine's tracking paths never wait on the
/// network.
struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkBeacon>,
}

impl AnalyticsSink for ChannelSink {
    fn dispatch(&self, beacon: &SinkBeacon) -> Result<(), SinkError> {
        self.tx
            .send(beacon.clone())
            .map_err(|_| SinkError::Config("forwarder task gone".to_string()))
    }
}

/// Shared server state
pub struct ServerState {
    /// The session engine fed by inbound signals
    engine: Mutex<TelemetryEngine>,
}

impl ServerState {
    /// Create new server state, wiring up the beacon forwarder when a sink
    /// endpoint is configured.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let sink: Arc<dyn AnalyticsSink> = match &config.sink_config {
            Some(sink_config) => {
                let client = HttpSinkClient::new(sink_config.clone())?;
                let (tx, mut rx) = mpsc::unbounded_channel::<SinkBeacon>();
                tokio::spawn(async move {
                    while let Some(beacon) = rx.recv().await {
                        if let Err(e) = client.dispatch_beacon(&beacon).await {
                            tracing::debug!("Beacon forwarding failed: {}", e);
                        }
                    }
                });
                Arc::new(ChannelSink { tx })
            }
            None => Arc::new(NullSink),
        };

        let variants: Box<dyn VariantStore> = match FileVariantStore::open(
            FileVariantStore::default_path(&config.engine_config.data_path),
        ) {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!("Variant store unavailable, using in-memory: {}", e);
                Box::new(MemoryVariantStore::new())
            }
        };

        let engine = TelemetryEngine::new(
            config.engine_config.clone(),
            config.context.clone(),
            sink,
            crate::store::SharedAppState::shared(),
            variants,
        );

        Ok(Self {
            engine: Mutex::new(engine),
        })
    }
}

/// Signal batch from the page shim
#[derive(Debug, Clone, Deserialize)]
pub struct SignalBatch {
    /// Signals in capture order
    pub signals: Vec<BrowserSignal>,
    /// Authenticated user identity, if known
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response from the signals endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SignalsResponse {
    pub status: String,
    pub accepted: usize,
    pub events_recorded: usize,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /signals
///
/// Accepts a batch of browser signals and feeds them through the engine in
/// capture order.
async fn signals(
    State(state): State<Arc<ServerState>>,
    Json(batch): Json<SignalBatch>,
) -> Json<SignalsResponse> {
    let mut engine = state.engine.lock().await;

    if let Some(user_id) = batch.user_id {
        engine.set_user_id(user_id);
    }

    let accepted = batch.signals.len();
    for signal in batch.signals {
        engine.handle_signal(signal);
    }

    Json(SignalsResponse {
        status: "ok".to_string(),
        accepted,
        events_recorded: engine.event_count(),
    })
}

/// GET /stats
async fn stats(State(state): State<Arc<ServerState>>) -> Json<StatsSnapshot> {
    let engine = state.engine.lock().await;
    Json(engine.stats().snapshot())
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

/// GET /export?format=json|csv
async fn export(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let format: ExportFormat = query
        .format
        .as_deref()
        .unwrap_or("json")
        .parse()
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("{e}"),
                    code: "BAD_FORMAT".to_string(),
                }),
            )
        })?;

    let engine = state.engine.lock().await;
    let body = engine.export_data(format).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("{e}"),
                code: "EXPORT_ERROR".to_string(),
            }),
        )
    })?;

    let content_type = match format {
        ExportFormat::Json => "application/json",
        ExportFormat::Csv => "text/csv",
    };

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config)?);

    let app = Router::new()
        .route("/health", get(health))
        .route("/signals", post(signals))
        .route("/stats", get(stats))
        .route("/export", get(export))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Telemetry ingest server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
