//! Backend liveness.

use crate::catalog::Endpoint;
use crate::config::BackendConfig;
use crate::error::{BridgeError, Result, describe_transport_error};
use crate::record::ResultRecord;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;

/// Probes `GET /health` on the backend.
#[derive(Debug, Clone)]
pub struct HealthGate {
    client: Client,
    url: String,
    probe_timeout: Duration,
}

impl HealthGate {
    #[must_use]
    pub fn new(client: Client, config: &BackendConfig) -> Self {
        Self {
            client,
            url: config.url_for(Endpoint::HEALTH.path()),
            probe_timeout: config.probe_timeout,
        }
    }

    /// `true` only for an HTTP 200; every failure mode collapses to `false`.
    pub async fn probe(&self) -> bool {
        let probe = self.client.get(&self.url).timeout(self.probe_timeout);
        match probe.send().await {
            Ok(resp) if resp.status() == StatusCode::OK => true,
            Ok(resp) => {
                tracing::debug!(status = resp.status().as_u16(), "health probe rejected");
                false
            }
            Err(e) => {
                tracing::debug!(error = %describe_transport_error(&e), "health probe failed");
                false
            }
        }
    }

    /// Full status for the liveness tool: the backend's own health body, or an offline record.
    pub async fn status(&self) -> ResultRecord {
        match self.fetch().await {
            Ok(record) => record,
            Err(e) => {
                tracing::info!(error = %e, "backend offline");
                offline(&e)
            }
        }
    }

    async fn fetch(&self) -> Result<ResultRecord> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(BridgeError::BackendRequestFailed {
                status: status.as_u16(),
                body,
            });
        }
        ResultRecord::from_body(&body)
    }
}

fn offline(err: &BridgeError) -> ResultRecord {
    let mut map = Map::new();
    map.insert("status".to_string(), Value::String("offline".to_string()));
    map.insert("error".to_string(), Value::String(err.to_string()));
    map.insert(
        "message".to_string(),
        Value::String("R API server is not running".to_string()),
    );
    ResultRecord::from_backend(map)
}
