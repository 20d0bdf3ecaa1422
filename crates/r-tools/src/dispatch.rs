//! Sending requests to the R backend and normalising the outcome.
//!
//! Every dispatch runs the health gate first; nothing is sent to a backend that does not
//! answer `/health` with 200. The caller always gets a [`ResultRecord`] back, never an error.

use crate::catalog::Endpoint;
use crate::config::BackendConfig;
use crate::error::{BridgeError, Result};
use crate::health::HealthGate;
use crate::record::ResultRecord;
use reqwest::Client;
use serde_json::{Map, Value};

/// The process-wide outbound connection pool.
///
/// Created once at startup and released once when the owning [`Dispatcher`] is dropped.
#[derive(Debug)]
pub struct BackendPool {
    client: Client,
}

impl BackendPool {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed (e.g. TLS backend init).
    pub fn connect(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {e}")))?;
        tracing::debug!(
            timeout_ms = config.timeout.as_millis() as u64,
            connect_timeout_ms = config.connect_timeout.as_millis() as u64,
            "backend connection pool ready"
        );
        Ok(Self { client })
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl Drop for BackendPool {
    fn drop(&mut self) {
        tracing::info!("backend connection pool closed");
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    config: BackendConfig,
    health: HealthGate,
    pool: BackendPool,
}

impl Dispatcher {
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let pool = BackendPool::connect(&config)?;
        let health = HealthGate::new(pool.client().clone(), &config);
        Ok(Self {
            config,
            health,
            pool,
        })
    }

    #[must_use]
    pub fn health(&self) -> &HealthGate {
        &self.health
    }

    /// POST `payload` to `endpoint` and normalise whatever comes back.
    pub async fn dispatch(&self, endpoint: Endpoint, payload: &Map<String, Value>) -> ResultRecord {
        match self.send(endpoint, payload).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "dispatch failed");
                ResultRecord::from(e)
            }
        }
    }

    async fn send(&self, endpoint: Endpoint, payload: &Map<String, Value>) -> Result<ResultRecord> {
        if !self.health.probe().await {
            return Err(BridgeError::BackendUnreachable {
                hint: self.config.start_hint.clone(),
            });
        }

        let url = self.config.url_for(endpoint.path());
        let resp = self.pool.client().post(&url).json(payload).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "backend replied");

        if !status.is_success() {
            return Err(BridgeError::BackendRequestFailed {
                status: status.as_u16(),
                body,
            });
        }
        ResultRecord::from_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_bridge_test_support::{MockBackend, MockResponse, pick_unused_port};
    use serde_json::json;
    use std::time::Duration;

    fn dispatcher_for(base_url: &str) -> Dispatcher {
        Dispatcher::new(BackendConfig::parse(base_url).expect("config")).expect("dispatcher")
    }

    fn payload(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object payload")
    }

    fn error_of(record: &ResultRecord) -> &str {
        record
            .get("error")
            .and_then(Value::as_str)
            .expect("error string")
    }

    #[tokio::test]
    async fn success_body_passes_through_and_payload_is_posted() {
        let mock = MockBackend::builder()
            .healthy()
            .route("/api/add", MockResponse::json(200, &json!({"result": 3})))
            .start()
            .await
            .expect("mock");
        let d = dispatcher_for(mock.base_url());

        let record = d
            .dispatch(Endpoint::ADD, &payload(json!({"a": 1, "b": 2})))
            .await;
        assert_eq!(record.into_value(), json!({"result": 3}));
        assert_eq!(mock.last_body("/api/add"), Some(json!({"a": 1, "b": 2})));
        assert_eq!(mock.hits("/health"), 1);
    }

    #[tokio::test]
    async fn unhealthy_backend_receives_nothing() {
        let mock = MockBackend::builder()
            .route("/health", MockResponse::raw(503, "down"))
            .route("/api/add", MockResponse::json(200, &json!({"result": 3})))
            .start()
            .await
            .expect("mock");
        let d = dispatcher_for(mock.base_url());

        let record = d.dispatch(Endpoint::ADD, &payload(json!({"a": 1}))).await;
        assert_eq!(
            record.into_value(),
            json!({
                "success": false,
                "error": "backend unreachable",
                "hint": crate::config::DEFAULT_START_HINT,
            })
        );
        assert_eq!(mock.hits("/api/add"), 0);
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let port = pick_unused_port().expect("port");
        let d = dispatcher_for(&format!("http://127.0.0.1:{port}"));
        let record = d.dispatch(Endpoint::EXECUTE, &payload(json!({"code": "1"}))).await;
        assert!(record.is_failure());
        assert_eq!(error_of(&record), "backend unreachable");
    }

    #[tokio::test]
    async fn error_status_wraps_raw_body() {
        let mock = MockBackend::builder()
            .healthy()
            .route("/api/execute", MockResponse::raw(500, "bad formula"))
            .start()
            .await
            .expect("mock");
        let d = dispatcher_for(mock.base_url());
        let record = d.dispatch(Endpoint::EXECUTE, &payload(json!({"code": "x"}))).await;
        assert_eq!(
            record.into_value(),
            json!({"success": false, "error": "API error: bad formula"})
        );
    }

    #[tokio::test]
    async fn missing_route_is_api_error() {
        let mock = MockBackend::builder().healthy().start().await.expect("mock");
        let d = dispatcher_for(mock.base_url());
        let record = d.dispatch(Endpoint::CALL, &payload(json!({"func": "f"}))).await;
        assert!(error_of(&record).starts_with("API error: "));
    }

    #[tokio::test]
    async fn body_shapes_are_normalised() {
        let cases = [
            (MockResponse::raw(200, r#""{\"result\": 3}""#), json!({"result": 3})),
            (MockResponse::raw(200, "42"), json!({"data": 42})),
            (MockResponse::json(200, &json!([1, 2])), json!({"data": [1, 2]})),
            (MockResponse::json(200, &json!("hi")), json!({"data": "hi"})),
        ];
        for (response, expected) in cases {
            let mock = MockBackend::builder()
                .healthy()
                .route("/api/stats", response)
                .start()
                .await
                .expect("mock");
            let d = dispatcher_for(mock.base_url());
            let record = d.dispatch(Endpoint::STATS, &Map::new()).await;
            assert_eq!(record.into_value(), expected);
        }
    }

    #[tokio::test]
    async fn unparsable_success_body_is_malformed() {
        let mock = MockBackend::builder()
            .healthy()
            .route("/api/lm", MockResponse::raw(200, "<html>"))
            .start()
            .await
            .expect("mock");
        let d = dispatcher_for(mock.base_url());
        let record = d.dispatch(Endpoint::LM, &Map::new()).await;
        assert!(record.is_failure());
        assert!(error_of(&record).starts_with("malformed response"));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let mock = MockBackend::builder()
            .healthy()
            .route(
                "/api/execute",
                MockResponse::json(200, &json!({"ok": true})).with_delay(Duration::from_secs(5)),
            )
            .start()
            .await
            .expect("mock");
        let mut config = BackendConfig::parse(mock.base_url()).expect("config");
        config.timeout = Duration::from_millis(300);
        let d = Dispatcher::new(config).expect("dispatcher");

        let record = d.dispatch(Endpoint::EXECUTE, &payload(json!({"code": "Sys.sleep(5)"}))).await;
        assert!(record.is_failure());
        assert!(error_of(&record).contains("timed out"), "{record:?}");
    }

    #[tokio::test]
    async fn health_status_body_matrix() {
        let bodies = [
            MockResponse::json(200, &json!({"v": 1})),
            MockResponse::json(200, &json!("{\"v\": 1}")),
            MockResponse::raw(200, "not json"),
            MockResponse::raw(404, "nope"),
            MockResponse::raw(500, "err"),
        ];
        for healthy in [true, false] {
            for response in bodies.clone() {
                let builder = if healthy {
                    MockBackend::builder().healthy()
                } else {
                    MockBackend::builder().route("/health", MockResponse::raw(503, ""))
                };
                let mock = builder
                    .route("/api/dataframe", response.clone())
                    .start()
                    .await
                    .expect("mock");
                let d = dispatcher_for(mock.base_url());
                let record = d.dispatch(Endpoint::DATAFRAME, &Map::new()).await;

                if healthy {
                    assert_eq!(mock.hits("/api/dataframe"), 1);
                    if record.is_failure() {
                        assert!(record.get("error").is_some_and(Value::is_string));
                    } else {
                        assert_eq!(record.get("v"), Some(&json!(1)));
                    }
                } else {
                    assert_eq!(mock.hits("/api/dataframe"), 0);
                    assert_eq!(error_of(&record), "backend unreachable");
                }
            }
        }
    }

    #[tokio::test]
    async fn repeated_dispatch_is_stable() {
        let mock = MockBackend::builder()
            .healthy()
            .route("/api/hello", MockResponse::json(200, &json!({"message": "Hello, R!"})))
            .start()
            .await
            .expect("mock");
        let d = dispatcher_for(mock.base_url());
        let first = d.dispatch(Endpoint::HELLO, &Map::new()).await;
        let second = d.dispatch(Endpoint::HELLO, &Map::new()).await;
        assert_eq!(first, second);
        assert_eq!(mock.hits("/api/hello"), 2);
    }
}
