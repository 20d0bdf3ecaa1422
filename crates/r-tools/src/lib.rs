//! Tools that expose an R statistics backend over MCP.
//!
//! A tool call flows through three stages:
//!
//! 1. [`catalog`] binds raw JSON arguments against a static [`catalog::ToolDescriptor`].
//! 2. [`request`] turns bound arguments into a backend endpoint and payload, rendering R source
//!    through [`codegen`] and [`templates`] for the generated-code tools.
//! 3. [`dispatch`] gates on [`health`], sends the request and folds the outcome into a
//!    [`record::ResultRecord`].
//!
//! [`bridge::RBridge`] ties the stages together for a tool host.

pub mod args;
pub mod bridge;
pub mod catalog;
pub mod codegen;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod record;
pub mod request;
pub mod semantics;
pub mod templates;

pub use bridge::RBridge;
pub use config::BackendConfig;
pub use error::{BridgeError, TranslationError};
pub use record::ResultRecord;
