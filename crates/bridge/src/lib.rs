//! Stdio host for the R statistics MCP tools.

pub mod config;
pub mod observability;
pub mod server;
