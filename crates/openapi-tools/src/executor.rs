//! Sends routed requests and normalizes upstream responses.
//!
//! A response with status >= 400 becomes [`HttpError`] (status, decoded body, headers); a request
//! that got no response at all surfaces as [`OpenApiToolsError::Transport`] with the original
//! `reqwest` error.

use crate::config::ProxyConfig;
use crate::error::{HttpError, OpenApiToolsError, Result};
use crate::router::{RequestBody, RequestSpec};
use base64::Engine as _;
use mime::Mime;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::{Value, json};

/// A successful (status < 400) upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
    pub headers: Vec<(String, String)>,
}

/// Issues HTTP requests over one shared client.
///
/// Every request carries `Accept: application/json`, the configured `User-Agent` and the
/// configured static headers; per-call headers override them.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
}

impl RequestExecutor {
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::InvalidRequest`] if a configured header is not a valid HTTP
    /// header, or a transport error if the client cannot be built.
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, header_value(USER_AGENT.as_str(), &config.user_agent)?);
        for (name, value) in &config.headers {
            headers.insert(header_name(name)?, header_value(name, value)?);
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }

    /// Send `request` and decode the response body.
    ///
    /// # Errors
    ///
    /// - [`OpenApiToolsError::Http`] when the upstream answers with status >= 400.
    /// - [`OpenApiToolsError::Transport`] when no response is received.
    /// - [`OpenApiToolsError::FileAccess`] when an upload file cannot be opened.
    /// - [`OpenApiToolsError::InvalidRequest`] for an invalid per-call header.
    pub async fn execute(&self, request: RequestSpec) -> Result<UpstreamResponse> {
        let multipart = request.is_multipart();
        let method = request.method.clone();
        let url = request.url.to_string();

        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(header_name(name)?, header_value(name, value)?);
        }
        builder = match request.body {
            RequestBody::None => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(payload) => builder.multipart(payload.into_form().await?),
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers: Vec<(String, String)> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = resp.bytes().await?;
        let body = decode_body(&bytes, content_type.as_deref(), multipart);

        if status >= 400 {
            tracing::warn!(%method, %url, status, "Upstream API returned an error status");
            return Err(HttpError {
                status,
                body,
                headers,
            }
            .into());
        }

        tracing::debug!(%method, %url, status, "Upstream API call succeeded");
        Ok(UpstreamResponse {
            status,
            body,
            headers,
        })
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| OpenApiToolsError::InvalidRequest(format!("Invalid header name '{name}': {e}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        OpenApiToolsError::InvalidRequest(format!("Invalid value for header '{name}': {e}"))
    })
}

fn decode_body(bytes: &[u8], content_type: Option<&str>, multipart: bool) -> Value {
    if bytes.is_empty() {
        return Value::String(String::new());
    }
    if multipart && is_binary_content_type(content_type) {
        return Value::String(encode_binary_body(bytes));
    }
    if content_type.is_none_or(is_json_content_type)
        && let Ok(v) = serde_json::from_slice::<Value>(bytes)
    {
        return v;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => json!({
            "encoding": "base64",
            "mimeType": content_type,
            "data": encode_binary_body(bytes),
        }),
    }
}

/// Base64-encode a binary response body so it can travel in a text content block.
#[must_use]
pub fn encode_binary_body(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .parse::<Mime>()
        .is_ok_and(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
}

fn is_binary_content_type(content_type: Option<&str>) -> bool {
    let Some(m) = content_type.and_then(|ct| ct.parse::<Mime>().ok()) else {
        return false;
    };
    let textual = m.type_() == mime::TEXT
        || m.subtype() == mime::JSON
        || m.subtype() == mime::XML
        || m.suffix() == Some(mime::JSON)
        || m.suffix() == Some(mime::XML)
        || m.subtype() == mime::WWW_FORM_URLENCODED
        || m.subtype() == mime::JAVASCRIPT;
    !textual
}
