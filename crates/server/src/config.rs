//! Command line / environment configuration.

use clap::{Parser, ValueEnum};
use openapi_mcp_tools::ProxyConfig;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "openapi-mcp-server")]
#[command(version, about = "Expose an OpenAPI-described REST API as MCP tools over stdio")]
pub struct Args {
    /// OpenAPI document: file path or http(s) URL
    #[arg(long, env = "OPENAPI_MCP_SPEC")]
    pub spec: String,

    /// Base URL of the API (overrides `servers[0].url`)
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// JSON object of headers sent with every request, e.g. '{"Authorization":"Bearer x"}'
    #[arg(long, env = "OPENAPI_MCP_HEADERS")]
    pub headers: Option<String>,

    /// Server name reported to MCP clients
    #[arg(long, env = "OPENAPI_MCP_NAME", default_value = "openapi-mcp-server")]
    pub name: String,

    /// Default log filter (`RUST_LOG` takes precedence)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    /// Library configuration; must run after logging is set up so header errors are reported.
    #[must_use]
    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            base_url: self.base_url.clone(),
            headers: self
                .headers
                .as_deref()
                .map(parse_headers_json)
                .unwrap_or_default(),
            ..ProxyConfig::default()
        }
    }
}

/// Parse the static headers object. Anything unusable is logged and ignored.
pub fn parse_headers_json(raw: &str) -> BTreeMap<String, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return BTreeMap::new();
    }

    let parsed: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Failed to parse OPENAPI_MCP_HEADERS: {e}");
            return BTreeMap::new();
        }
    };
    let Value::Object(map) = parsed else {
        tracing::error!("OPENAPI_MCP_HEADERS must be a JSON object");
        return BTreeMap::new();
    };

    map.into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(s) => Some((name, s)),
            Value::Number(n) => Some((name, n.to_string())),
            Value::Bool(b) => Some((name, b.to_string())),
            other => {
                tracing::warn!(header = %name, "Ignoring non-scalar header value {other}");
                None
            }
        })
        .collect()
}
