//! Translate a tool call into a backend endpoint and JSON payload.
//!
//! Building is pure: the same tool and arguments always produce the same request, byte for
//! byte (object keys keep descriptor order).

use crate::args::ToolArgs;
use crate::catalog::{self, Endpoint, ToolDescriptor, ToolKind};
use crate::codegen;
use crate::error::TranslationError;
use crate::templates::Fragments;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub endpoint: Endpoint,
    pub payload: Map<String, Value>,
}

/// Build the backend request for already-bound arguments.
///
/// # Errors
///
/// Returns an error if a generated-code parameter cannot be rendered with its encoding.
pub fn build(tool: &ToolDescriptor, args: &ToolArgs) -> Result<BackendRequest, TranslationError> {
    let payload = match tool.kind {
        ToolKind::Liveness => Map::new(),
        ToolKind::PassThrough | ToolKind::RawCode => args.to_payload(),
        ToolKind::Templated(template) => {
            let mut fragments = Fragments::default();
            for (name, value) in args.iter() {
                let Some(encoding) = tool.param(name).and_then(|p| p.encoding) else {
                    return Err(TranslationError::Unsupported {
                        param: name.to_string(),
                        reason: format!("no R encoding declared for tool '{}'", tool.name),
                    });
                };
                fragments.insert(name, codegen::encode(name, value, encoding)?);
            }
            let mut payload = Map::new();
            payload.insert("code".to_string(), Value::String(template.render(&fragments)?));
            payload
        }
    };

    Ok(BackendRequest {
        endpoint: tool.endpoint,
        payload,
    })
}

/// Look up `tool_name`, bind `arguments` and build its request in one step.
///
/// # Errors
///
/// Returns an error for unknown tools and for any binding or rendering failure.
pub fn build_call(tool_name: &str, arguments: &Value) -> Result<BackendRequest, TranslationError> {
    let tool = catalog::find(tool_name)
        .ok_or_else(|| TranslationError::UnknownTool(tool_name.to_string()))?;
    let args = tool.bind(arguments)?;
    build(tool, &args)
}
