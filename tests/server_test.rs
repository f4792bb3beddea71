//! Integration tests for the signal ingest server

#[cfg(feature = "server")]
mod server_tests {
    use sitepulse::engine::ClientContext;
    use sitepulse::server::{run, ServerConfig};
    use std::time::Duration;

    fn test_config() -> sitepulse::config::Config {
        let mut config = sitepulse::config::Config::default();
        config.data_path = std::env::temp_dir().join("sitepulse-server-test");
        config
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let config = ServerConfig::new(0, test_config(), ClientContext::default(), None);

        // Start server with random port
        let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_signals_and_export_endpoints() {
        let config = ServerConfig::new(0, test_config(), ClientContext::default(), None);

        let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Post a small signal batch
        let batch = serde_json::json!({
            "signals": [
                {
                    "signal": "route_change",
                    "path": "/portfolio"
                },
                {
                    "signal": "click",
                    "target": { "id": "cta", "tag": "button" },
                    "x": 10.0,
                    "y": 20.0
                },
                {
                    "signal": "layout_shift",
                    "value": 0.5,
                    "had_recent_input": true
                }
            ]
        });

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/signals", addr))
            .json(&batch)
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["accepted"], 3);
        // The input-attributed layout shift records no event
        assert_eq!(body["events_recorded"], 2);

        // CSV export reflects the recorded events
        let response = client
            .get(format!("http://{}/export?format=csv", addr))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        let csv = response.text().await.expect("Failed to read body");
        assert!(csv.starts_with("timestamp,category,action,page,element,value"));
        assert_eq!(csv.split('\n').count(), 3); // header + 2 rows

        // Unknown format is rejected
        let response = client
            .get(format!("http://{}/export?format=xml", addr))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let config = ServerConfig::new(0, test_config(), ClientContext::default(), None);

        let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/stats", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["events_captured"], 0);

        let _ = shutdown_tx.send(());
    }
}
