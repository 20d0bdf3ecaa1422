//! MCP tool annotations derived from what a tool can do on the R backend.

use crate::catalog::ToolKind;
use rmcp::model::ToolAnnotations;

/// Annotate a tool by kind.
///
/// Every tool talks to an external R process, so `openWorldHint` is always `true`. Fixed
/// templates and pass-through endpoints only compute; arbitrary code can touch the backend's
/// session and filesystem.
#[must_use]
pub fn annotations_for_kind(kind: ToolKind) -> ToolAnnotations {
    let open_world_hint = Some(true);

    match kind {
        ToolKind::Liveness | ToolKind::PassThrough | ToolKind::Templated(_) => ToolAnnotations {
            title: None,
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint,
        },
        ToolKind::RawCode => ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(true),
            idempotent_hint: Some(false),
            open_world_hint,
        },
    }
}
