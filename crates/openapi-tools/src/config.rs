use std::collections::BTreeMap;

/// Runtime configuration for an `OpenAPI` tool proxy.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Override base URL from spec.
    pub base_url: Option<String>,

    /// Static headers sent with every outbound request.
    pub headers: BTreeMap<String, String>,

    /// `User-Agent` sent with every outbound request (unless overridden in `headers`).
    pub user_agent: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: BTreeMap::new(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("openapi-mcp-server/{}", env!("CARGO_PKG_VERSION"))
}
