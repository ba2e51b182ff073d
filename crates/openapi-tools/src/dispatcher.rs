//! Tool dispatch: list the catalog, and run one call through router -> uploader -> executor.

use crate::catalog::Catalog;
use crate::error::{HttpError, OpenApiToolsError, Result};
use crate::executor::RequestExecutor;
use crate::router;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Binds an immutable [`Catalog`] to a [`RequestExecutor`]. Cheap to clone and safe to share
/// across concurrent calls.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    catalog: Arc<Catalog>,
    executor: RequestExecutor,
}

impl ToolDispatcher {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, executor: RequestExecutor) -> Self {
        Self { catalog, executor }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Every tool in the catalog, in document order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.catalog.tools().iter().map(|t| t.to_tool()).collect()
    }

    /// Execute the tool `name` with `arguments`.
    ///
    /// Upstream HTTP errors are returned as a successful result whose text is
    /// `{"status":"error", ...}`; only caller or local faults are errors.
    ///
    /// # Errors
    ///
    /// - [`OpenApiToolsError::UnknownTool`] if `name` is not in the catalog.
    /// - File argument, request assembly and transport errors from the call itself.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult> {
        let op = self
            .catalog
            .operation(name)
            .ok_or_else(|| OpenApiToolsError::UnknownTool(name.to_string()))?;
        let args = arguments.unwrap_or_default();

        let request = router::route(op, self.catalog.base_url(), &args)?;
        let body = match self.executor.execute(request).await {
            Ok(resp) => resp.body,
            Err(OpenApiToolsError::Http(err)) => {
                tracing::warn!(tool = %name, status = err.status, "Tool call got an upstream error");
                error_payload(err)
            }
            Err(e) => return Err(e),
        };

        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string(&body)?,
        )]))
    }
}

/// `{"status":"error"}` merged with the upstream body's fields; a non-object body is kept under
/// `data`. A `status` field in the body replaces the marker.
fn error_payload(err: HttpError) -> Value {
    let mut out = Map::new();
    out.insert("status".to_string(), Value::String("error".to_string()));
    match err.body {
        Value::Object(fields) => out.extend(fields),
        Value::Null => {}
        Value::String(s) if s.is_empty() => {}
        other => {
            out.insert("data".to_string(), other);
        }
    }
    Value::Object(out)
}
