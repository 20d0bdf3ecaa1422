//! A scriptable stand-in for the R plumber API, plus small test helpers.

use anyhow::Context as _;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// A canned reply for one path.
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    body: String,
    content_type: &'static str,
    delay: Duration,
}

impl MockResponse {
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "application/json",
            delay: Duration::ZERO,
        }
    }

    /// A reply whose body is sent exactly as given.
    #[must_use]
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain",
            delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct Recorded {
    hits: HashMap<String, usize>,
    bodies: HashMap<String, Bytes>,
}

struct MockState {
    routes: HashMap<String, MockResponse>,
    recorded: Mutex<Recorded>,
}

#[derive(Debug, Default)]
pub struct MockBackendBuilder {
    routes: HashMap<String, MockResponse>,
}

impl MockBackendBuilder {
    /// Answer `GET /health` with `200 {"status":"ok"}`.
    #[must_use]
    pub fn healthy(self) -> Self {
        self.route(
            "/health",
            MockResponse::json(200, &serde_json::json!({"status": "ok"})),
        )
    }

    #[must_use]
    pub fn route(mut self, path: &str, response: MockResponse) -> Self {
        self.routes.insert(path.to_string(), response);
        self
    }

    /// Bind an ephemeral localhost port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(self) -> anyhow::Result<MockBackend> {
        let state = Arc::new(MockState {
            routes: self.routes,
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock backend")?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(MockBackend {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
        })
    }
}

/// A running mock backend; stops serving when dropped.
pub struct MockBackend {
    base_url: String,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    #[must_use]
    pub fn builder() -> MockBackendBuilder {
        MockBackendBuilder::default()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests received on `path` so far, any method.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        self.state.recorded.lock().hits.get(path).copied().unwrap_or(0)
    }

    /// The most recent request body on `path`, parsed as JSON.
    #[must_use]
    pub fn last_body(&self, path: &str) -> Option<Value> {
        let recorded = self.state.recorded.lock();
        let bytes = recorded.bodies.get(path)?;
        serde_json::from_slice(bytes).ok()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(State(state): State<Arc<MockState>>, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    {
        let mut recorded = state.recorded.lock();
        *recorded.hits.entry(path.clone()).or_insert(0) += 1;
        if !body.is_empty() {
            recorded.bodies.insert(path.clone(), body);
        }
    }

    let Some(route) = state.routes.get(&path).cloned() else {
        return (StatusCode::NOT_FOUND, format!("no route for {path}")).into_response();
    };
    if !route.delay.is_zero() {
        tokio::time::sleep(route.delay).await;
    }
    let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, route.content_type)], route.body).into_response()
}
