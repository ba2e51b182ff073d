//! Parameter routing: one flat argument object -> one HTTP request description.
//!
//! Each argument is consumed at most once, in this order: path, query, header parameters, then
//! (for multipart uploads) file parameters and form fields, else the body policy, else the query
//! string. Cookie parameters are never forwarded. A `null` argument counts as absent.

use crate::catalog::{OperationRecord, ParamLocation, QuerySerialization};
use crate::error::{OpenApiToolsError, Result};
use crate::upload::{self, MultipartPayload};
use openapiv3::QueryStyle;
use reqwest::Method;
use rmcp::model::JsonObject;
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// A fully assembled, not yet sent, HTTP request.
#[derive(Debug)]
pub struct RequestSpec {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestSpec {
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        matches!(self.body, RequestBody::Multipart(_))
    }
}

#[derive(Debug)]
pub enum RequestBody {
    None,
    Json(Value),
    Multipart(MultipartPayload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QueryPair {
    key: String,
    value: String,
    allow_reserved: bool,
}

/// Route `args` for `op` against `base_url`.
///
/// # Errors
///
/// - [`OpenApiToolsError::MissingFile`] / [`OpenApiToolsError::UnsupportedValue`] for bad file
///   arguments on a multipart upload.
/// - [`OpenApiToolsError::InvalidRequest`] if a path parameter is missing or the URL is invalid.
pub fn route(op: &OperationRecord, base_url: &str, args: &JsonObject) -> Result<RequestSpec> {
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut path = op.path.clone();
    let mut query: Vec<QueryPair> = Vec::new();
    let mut headers: Vec<(String, String)> = Vec::new();

    for param in &op.parameters {
        let value = present(args, &param.name);
        match param.location {
            ParamLocation::Path => {
                let Some(value) = value else {
                    return Err(OpenApiToolsError::InvalidRequest(format!(
                        "Missing required path parameter '{}'",
                        param.name
                    )));
                };
                path = path.replace(
                    &format!("{{{}}}", param.name),
                    &encode_uri_component(&value_to_string(value)),
                );
            }
            ParamLocation::Query => {
                if let Some(value) = value {
                    query.extend(serialize_query_param(
                        &param.name,
                        value,
                        param.required,
                        param.query.as_ref(),
                    ));
                }
            }
            ParamLocation::Header => {
                if let Some(value) = value {
                    headers.push((param.name.clone(), value_to_string(value)));
                }
            }
            ParamLocation::Cookie => {
                if value.is_some() {
                    tracing::debug!(param = %param.name, "Dropping cookie parameter argument");
                }
            }
        }
        if value.is_some() {
            consumed.insert(param.name.as_str());
        }
    }

    let remaining: JsonObject = args
        .iter()
        .filter(|(k, v)| !consumed.contains(k.as_str()) && !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let file_params = op.file_params();
    let body = if !file_params.is_empty() {
        RequestBody::Multipart(upload::encode(file_params, &remaining)?)
    } else if op.request_body.is_some() {
        match fold_remaining_into_body(remaining) {
            Some(body) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                RequestBody::Json(body)
            }
            None => RequestBody::None,
        }
    } else {
        for (name, value) in &remaining {
            query.extend(serialize_query_param(name, value, false, None));
        }
        RequestBody::None
    };

    let url = build_url(base_url, &path, &query)?;
    tracing::debug!(method = %op.method, %url, "Routed tool arguments");

    Ok(RequestSpec {
        method: op.method.clone(),
        url,
        headers,
        body,
    })
}

/// Body policy for operations with a JSON request body.
///
/// An explicit truthy `body` argument is the whole body and any other leftovers are dropped. Without
/// it, the leftovers are assumed to mirror the body schema's top-level properties and are sent
/// as one object. The folded object is not validated against the declared schema.
fn fold_remaining_into_body(mut remaining: JsonObject) -> Option<Value> {
    // A falsy `body` stays in the folded object like any other leftover.
    if remaining.get("body").is_some_and(is_truthy)
        && let Some(body) = remaining.remove("body")
    {
        if !remaining.is_empty() {
            let ignored: Vec<&str> = remaining.keys().map(String::as_str).collect();
            tracing::warn!(?ignored, "Explicit 'body' argument given; ignoring other arguments");
        }
        return Some(body);
    }

    if remaining.is_empty() {
        None
    } else {
        Some(Value::Object(remaining))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn present<'a>(args: &'a JsonObject, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|v| !v.is_null())
}

fn build_url(base_url: &str, path: &str, query: &[QueryPair]) -> Result<Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut url = Url::parse(&raw)
        .map_err(|e| OpenApiToolsError::InvalidRequest(format!("Invalid URL '{raw}': {e}")))?;

    if !query.is_empty() {
        let encoded: Vec<String> = query
            .iter()
            .map(|p| {
                format!(
                    "{}={}",
                    encode_query_component(&p.key, false),
                    encode_query_component(&p.value, p.allow_reserved)
                )
            })
            .collect();
        url.set_query(Some(&encoded.join("&")));
    }

    Ok(url)
}

fn serialize_query_param(
    name: &str,
    value: &Value,
    required: bool,
    ser: Option<&QuerySerialization>,
) -> Vec<QueryPair> {
    let default = QuerySerialization::default();
    let ser = ser.unwrap_or(&default);
    let allow_reserved = ser.allow_reserved;

    let pair = |key: String, value: String| QueryPair {
        key,
        value,
        allow_reserved,
    };

    if query_value_is_empty(value) {
        // An empty optional value is simply left out.
        return if required {
            vec![pair(name.to_string(), String::new())]
        } else {
            Vec::new()
        };
    }

    match value {
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(value_to_string).collect();
            match (&ser.style, ser.explode) {
                (QueryStyle::Form, true) => items
                    .into_iter()
                    .map(|v| pair(name.to_string(), v))
                    .collect(),
                (QueryStyle::SpaceDelimited, _) => vec![pair(name.to_string(), items.join(" "))],
                (QueryStyle::PipeDelimited, _) => vec![pair(name.to_string(), items.join("|"))],
                (QueryStyle::Form | QueryStyle::DeepObject, _) => {
                    vec![pair(name.to_string(), items.join(","))]
                }
            }
        }
        Value::Object(map) => match (&ser.style, ser.explode) {
            (QueryStyle::DeepObject, _) => map
                .iter()
                .map(|(k, v)| pair(format!("{name}[{k}]"), value_to_string(v)))
                .collect(),
            (QueryStyle::Form, true) => map
                .iter()
                .map(|(k, v)| pair(k.clone(), value_to_string(v)))
                .collect(),
            (QueryStyle::Form, false) => {
                let parts: Vec<String> = map
                    .iter()
                    .flat_map(|(k, v)| [k.clone(), value_to_string(v)])
                    .collect();
                vec![pair(name.to_string(), parts.join(","))]
            }
            (QueryStyle::SpaceDelimited | QueryStyle::PipeDelimited, _) => {
                vec![pair(name.to_string(), Value::Object(map.clone()).to_string())]
            }
        },
        _ => vec![pair(name.to_string(), value_to_string(value))],
    }
}

fn query_value_is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Null => true,
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Convert a JSON value to its string form for URL and header positions.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn push_percent_encoded(out: &mut String, b: u8) {
    out.push('%');
    out.push(HEX[(b >> 4) as usize] as char);
    out.push(HEX[(b & 0x0F) as usize] as char);
}

/// Percent-encode a path segment value. Leaves unreserved characters and `!'()*` raw, so `/`,
/// `?`, `#` and `%` inside a value can never change the URL structure.
fn encode_uri_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) || matches!(b, b'!' | b'\'' | b'(' | b')' | b'*') {
            out.push(b as char);
        } else {
            push_percent_encoded(&mut out, b);
        }
    }
    out
}

/// Percent-encode a query key or value. `&`, `=` and `#` are always encoded, even with
/// `allowReserved`, since they would corrupt the joined query string.
fn encode_query_component(s: &str, allow_reserved: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        let keep = is_unreserved(b)
            || (allow_reserved
                && matches!(
                    b,
                    b':' | b'/' | b'?' | b'[' | b']' | b'@' | b'!' | b'$' | b'\'' | b'(' | b')'
                        | b'*' | b'+' | b',' | b';'
                ));
        if keep {
            out.push(b as char);
        } else {
            push_percent_encoded(&mut out, b);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}
