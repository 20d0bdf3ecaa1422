//! The tool-facing entry point: list tools, call tools.

use crate::catalog::{self, ToolDescriptor, ToolKind};
use crate::config::BackendConfig;
use crate::dispatch::Dispatcher;
use crate::error::{BridgeError, Result, TranslationError};
use crate::record::ResultRecord;
use crate::request;
use rmcp::model::Tool;
use serde_json::Value;
use std::time::Instant;

/// Owns the dispatcher (and through it the connection pool) for the life of the process.
#[derive(Debug)]
pub struct RBridge {
    dispatcher: Dispatcher,
}

impl RBridge {
    /// # Errors
    ///
    /// Returns an error if the outbound connection pool cannot be created.
    pub fn connect(config: BackendConfig) -> Result<Self> {
        tracing::info!(
            backend = %crate::error::redact_url(&config.base_url),
            "connecting R bridge"
        );
        Ok(Self {
            dispatcher: Dispatcher::new(config)?,
        })
    }

    /// MCP definitions for every tool, in catalog order.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        catalog::TOOLS.iter().map(ToolDescriptor::to_tool).collect()
    }

    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<&'static ToolDescriptor> {
        catalog::find(name)
    }

    /// Run one tool call to completion.
    ///
    /// Argument problems and backend failures both come back as a failure record; this never
    /// returns an error.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> ResultRecord {
        let started = Instant::now();
        let record = self.run(name, arguments).await;
        tracing::info!(
            tool = name,
            success = !record.is_failure(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool call finished"
        );
        record
    }

    async fn run(&self, name: &str, arguments: &Value) -> ResultRecord {
        let Some(tool) = self.descriptor(name) else {
            return translation_failure(name, TranslationError::UnknownTool(name.to_string()));
        };

        if tool.kind == ToolKind::Liveness {
            if let Err(e) = tool.bind(arguments) {
                return translation_failure(name, e);
            }
            return self.dispatcher.health().status().await;
        }

        let built = tool.bind(arguments).and_then(|args| request::build(tool, &args));
        match built {
            Ok(req) => {
                tracing::debug!(tool = name, endpoint = %req.endpoint, "dispatching");
                self.dispatcher.dispatch(req.endpoint, &req.payload).await
            }
            Err(e) => translation_failure(name, e),
        }
    }
}

fn translation_failure(tool: &str, err: TranslationError) -> ResultRecord {
    tracing::warn!(tool, error = %err, "rejected tool arguments");
    ResultRecord::from(BridgeError::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_bridge_test_support::{MockBackend, MockResponse};
    use serde_json::json;

    async fn bridge_for(mock: &MockBackend) -> RBridge {
        RBridge::connect(BackendConfig::parse(mock.base_url()).expect("config")).expect("bridge")
    }

    #[tokio::test]
    async fn lists_every_catalog_tool() {
        let mock = MockBackend::builder().start().await.expect("mock");
        let bridge = bridge_for(&mock).await;
        let names: Vec<_> = bridge.tools().into_iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names.len(), catalog::TOOLS.len());
        assert_eq!(names.first().map(String::as_str), Some("r_status"));
        assert!(names.iter().any(|n| n == "r_t_test"));
    }

    #[tokio::test]
    async fn templated_call_posts_generated_code() {
        let mock = MockBackend::builder()
            .healthy()
            .route(
                "/api/execute",
                MockResponse::json(200, &json!({"success": true, "result": ["t = 1.2"]})),
            )
            .start()
            .await
            .expect("mock");
        let bridge = bridge_for(&mock).await;

        let record = bridge
            .call_tool("r_t_test", &json!({"x": [1, 2, 3], "alternative": "less"}))
            .await;
        assert!(!record.is_failure());
        assert_eq!(
            mock.last_body("/api/execute"),
            Some(json!({"code": "x <- c(1, 2, 3)\nt.test(x, alternative = \"less\")"}))
        );
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_backend() {
        let mock = MockBackend::builder().healthy().start().await.expect("mock");
        let bridge = bridge_for(&mock).await;

        let record = bridge
            .call_tool("r_correlation", &json!({"x": [1, 2], "y": [1, 2], "method": "magic"}))
            .await;
        assert!(record.is_failure());
        assert_eq!(record.get("error_type"), Some(&json!("translation")));

        let record = bridge.call_tool("r_missing", &json!({})).await;
        assert_eq!(
            record.get("error"),
            Some(&json!("invalid arguments: unknown tool: r_missing"))
        );
        assert_eq!(mock.hits("/health"), 0);
    }

    #[tokio::test]
    async fn status_tool_reports_health_body() {
        let mock = MockBackend::builder().healthy().start().await.expect("mock");
        let bridge = bridge_for(&mock).await;
        let record = bridge.call_tool("r_status", &Value::Null).await;
        assert_eq!(record.into_value(), json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn pass_through_call_includes_defaults() {
        let mock = MockBackend::builder()
            .healthy()
            .route("/api/add", MockResponse::json(200, &json!({"result": 5})))
            .start()
            .await
            .expect("mock");
        let bridge = bridge_for(&mock).await;
        let record = bridge.call_tool("r_add", &json!({"a": 5})).await;
        assert_eq!(record.get("result"), Some(&json!(5)));
        assert_eq!(mock.last_body("/api/add"), Some(json!({"a": 5, "b": 0})));
    }
}
