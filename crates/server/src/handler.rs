//! MCP server surface: the tool dispatcher behind rmcp's `ServerHandler`.

use openapi_mcp_tools::{OpenApiToolsError, ToolDispatcher};
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorCode, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer};

#[derive(Clone)]
pub struct ProxyServer {
    dispatcher: ToolDispatcher,
    name: String,
}

impl ProxyServer {
    #[must_use]
    pub fn new(dispatcher: ToolDispatcher, name: impl Into<String>) -> Self {
        Self {
            dispatcher,
            name: name.into(),
        }
    }
}

impl ServerHandler for ProxyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: None,
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.dispatcher.list_tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatcher
            .call_tool(&request.name, request.arguments)
            .await
            .map_err(|e| {
                tracing::error!(tool = %request.name, "Tool call failed: {e}");
                to_mcp_error(&e)
            })
    }
}

/// Map library errors onto JSON-RPC error codes.
fn to_mcp_error(err: &OpenApiToolsError) -> McpError {
    let code = match err {
        OpenApiToolsError::UnknownTool(_) => ErrorCode::METHOD_NOT_FOUND,
        e if e.is_file_argument() => ErrorCode::INVALID_PARAMS,
        OpenApiToolsError::InvalidRequest(_) => ErrorCode::INVALID_PARAMS,
        _ => ErrorCode::INTERNAL_ERROR,
    };
    McpError::new(code, err.to_string(), None)
}
