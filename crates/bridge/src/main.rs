use anyhow::Context as _;
use clap::Parser as _;
use r_bridge_tools::RBridge;
use r_bridge_tools::error::redact_url;
use r_mcp_bridge::config::Config;
use r_mcp_bridge::server::ServeExit;
use r_mcp_bridge::{observability, server};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    observability::init_tracing(&config.log_level, config.log_format);

    let backend = config.backend_config()?;
    tracing::info!(
        backend = %redact_url(&backend.base_url),
        timeout_s = backend.timeout.as_secs(),
        "starting r-mcp-bridge on stdio"
    );

    let bridge = Arc::new(RBridge::connect(backend).context("create backend connection pool")?);
    tracing::info!(tools = bridge.tools().len(), "tools registered");

    let served = server::serve(
        bridge.clone(),
        tokio::io::stdin(),
        tokio::io::stdout(),
        async {
            shutdown_signal().await;
            tracing::info!("shutdown signal received");
        },
    )
    .await;

    // `serve` has dropped every clone it handed to tool calls, so this is the last handle.
    match Arc::try_unwrap(bridge) {
        Ok(bridge) => drop(bridge),
        Err(shared) => {
            tracing::warn!(
                handles = Arc::strong_count(&shared),
                "bridge still shared at shutdown"
            );
            drop(shared);
        }
    }
    tracing::info!("r-mcp-bridge stopped");

    match served {
        // tokio's stdin reader holds a blocking thread that would stall runtime shutdown.
        Ok(ServeExit::Shutdown) => std::process::exit(0),
        Ok(ServeExit::InputClosed) => Ok(()),
        Err(e) => Err(e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
