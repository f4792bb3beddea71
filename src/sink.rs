//! Analytics sink interface and the HTTP forwarding client.
//!
//! The engine forwards every captured event to a sink as a best-effort
//! beacon. Sinks may be entirely absent (ad-blocked, disabled); the engine
//! treats every dispatch as fire-and-forget and never propagates sink errors
//! to tracking callers.

use serde::{Deserialize, Serialize};

/// The generic beacon a sink accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkBeacon {
    /// Event action name.
    pub action: String,
    /// Event category wire name.
    pub category: String,
    /// Contextual label, usually the page path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional numeric value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// Session identifier tag.
    pub session_tag: String,
}

/// Sink error types.
#[derive(Debug)]
pub enum SinkError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Endpoint returned an error response
    Endpoint { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkError::Config(msg) => write!(f, "Sink config error: {msg}"),
            SinkError::Network(msg) => write!(f, "Sink network error: {msg}"),
            SinkError::Endpoint { status, message } => {
                write!(f, "Sink endpoint error ({status}): {message}")
            }
            SinkError::Serialization(msg) => write!(f, "Sink serialization error: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Destination for forwarded beacons.
///
/// Implementations must return quickly; the engine calls `dispatch` inline
/// from tracking paths and swallows any error it returns.
pub trait AnalyticsSink: Send + Sync {
    fn dispatch(&self, beacon: &SinkBeacon) -> Result<(), SinkError>;
}

/// The absent sink. Accepts every beacon by dropping it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn dispatch(&self, _beacon: &SinkBeacon) -> Result<(), SinkError> {
        Ok(())
    }
}

/// HTTP sink configuration.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Collect endpoint host
    pub host: String,
    /// Collect endpoint port
    pub port: u16,
    /// Optional bearer authentication token
    pub token: Option<String>,
}

impl SinkConfig {
    /// Create a new sink configuration.
    pub fn new(host: impl Into<String>, port: u16, token: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token,
        }
    }

    /// Get the base endpoint URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get the collect endpoint URL.
    pub fn collect_url(&self) -> String {
        format!("{}/v1/collect", self.url())
    }

    /// Get the health check endpoint URL.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.url())
    }
}

/// Beacon envelope posted to the collect endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BeaconEnvelope {
    /// The beacon being forwarded
    pub beacon: SinkBeacon,
    /// Client identifier
    pub client_id: String,
    /// Client timezone
    pub timezone: String,
    /// Sender name
    pub source: String,
    /// Sender version
    pub version: String,
    /// Send time (RFC3339)
    pub sent_at: String,
}

/// Async HTTP sink client.
#[cfg(feature = "sink-http")]
pub struct HttpSinkClient {
    config: SinkConfig,
    client: reqwest::Client,
    client_id: String,
}

#[cfg(feature = "sink-http")]
impl HttpSinkClient {
    /// Create a new HTTP sink client.
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| SinkError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Generate client ID from hostname + instance
        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let client_id = format!("pulse-{}-{}", host, &uuid::Uuid::new_v4().to_string()[..8]);

        Ok(Self {
            config,
            client,
            client_id,
        })
    }

    /// Test connection to the collect endpoint.
    pub async fn test_connection(&self) -> Result<bool, SinkError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Forward one beacon to the collect endpoint.
    pub async fn dispatch_beacon(&self, beacon: &SinkBeacon) -> Result<(), SinkError> {
        let envelope = BeaconEnvelope {
            beacon: beacon.clone(),
            client_id: self.client_id.clone(),
            timezone: chrono_tz::Tz::UTC.to_string(),
            source: "sitepulse".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sent_at: chrono::Utc::now().to_rfc3339(),
        };

        let mut request = self
            .client
            .post(self.config.collect_url())
            .header("Content-Type", "application/json")
            .json(&envelope);
        if let Some(ref token) = self.config.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SinkError::Endpoint {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Get the client ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// Blocking HTTP sink for synchronous hosts such as offline replay.
///
/// Each dispatch waits for the HTTP round trip. Live hosts should enqueue
/// beacons to a background forwarder instead of using this directly.
#[cfg(feature = "sink-http")]
pub struct BlockingHttpSink {
    inner: HttpSinkClient,
    runtime: tokio::runtime::Runtime,
}

#[cfg(feature = "sink-http")]
impl BlockingHttpSink {
    /// Create a new blocking HTTP sink.
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SinkError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: HttpSinkClient::new(config)?,
            runtime,
        })
    }

    /// Test connection to the collect endpoint.
    pub fn test_connection(&self) -> Result<bool, SinkError> {
        self.runtime.block_on(self.inner.test_connection())
    }

    /// Get the client ID.
    pub fn client_id(&self) -> &str {
        self.inner.client_id()
    }
}

#[cfg(feature = "sink-http")]
impl AnalyticsSink for BlockingHttpSink {
    fn dispatch(&self, beacon: &SinkBeacon) -> Result<(), SinkError> {
        self.runtime.block_on(self.inner.dispatch_beacon(beacon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_config_urls() {
        let config = SinkConfig::new("127.0.0.1", 8080, None);
        assert_eq!(config.url(), "http://127.0.0.1:8080");
        assert_eq!(config.collect_url(), "http://127.0.0.1:8080/v1/collect");
        assert_eq!(config.health_url(), "http://127.0.0.1:8080/health");
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullSink;
        let beacon = SinkBeacon {
            action: "click".to_string(),
            category: "interaction".to_string(),
            label: Some("/services".to_string()),
            value: None,
            session_tag: "123-abcdefghi".to_string(),
        };
        assert!(sink.dispatch(&beacon).is_ok());
    }

    #[test]
    fn test_beacon_serialization_skips_empty_fields() {
        let beacon = SinkBeacon {
            action: "page_view".to_string(),
            category: "navigation".to_string(),
            label: None,
            value: None,
            session_tag: "tag".to_string(),
        };
        let json = serde_json::to_string(&beacon).unwrap();
        assert!(!json.contains("label"));
        assert!(!json.contains("value"));
    }
}
