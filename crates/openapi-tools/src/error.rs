//! Error types for `openapi-mcp-tools`.

use serde_json::Value;
use thiserror::Error;

/// An upstream API answered, but with an error status (>= 400).
///
/// Unlike a transport failure this carries a structured body that is worth relaying to the
/// invoking client.
#[derive(Error, Debug, Clone)]
#[error("upstream returned HTTP {status}")]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Decoded response body (JSON when parseable, otherwise a string).
    pub body: Value,
    /// Response headers, in wire order.
    pub headers: Vec<(String, String)>,
}

/// Main error type for `OpenAPI` tooling.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// Malformed `OpenAPI` document or missing base URL.
    #[error("OpenAPI error: {0}")]
    Spec(String),

    #[error("OpenAPI error: failed to read spec file '{path}': {source}")]
    SpecReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenAPI error: failed to fetch spec from '{url}': {message}")]
    SpecFetch { url: String, message: String },

    #[error("OpenAPI error: failed to parse OpenAPI spec from '{location}': {source}")]
    SpecParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The call names a tool that is not in the catalog.
    #[error("Method {0} not found")]
    UnknownTool(String),

    /// A file-designated parameter has no value.
    #[error("File path must be provided for parameter: {param}")]
    MissingFile { param: String },

    /// A file-designated parameter is neither a path nor a list of paths.
    #[error("Unsupported file value for parameter '{param}': expected a path or list of paths, got {found}")]
    UnsupportedValue { param: String, found: &'static str },

    /// A file named by a file parameter could not be opened.
    #[error("Failed to read file at {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The request could not be assembled (bad URL, bad header name/value).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The upstream API responded with an error status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// No response was received (DNS, connection refused, timeout, ...).
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OpenApiToolsError {
    /// `true` when the upstream API produced a response carrying an error status.
    #[must_use]
    pub fn is_upstream_http(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// `true` for errors caused by malformed file arguments of an upload operation.
    #[must_use]
    pub fn is_file_argument(&self) -> bool {
        matches!(
            self,
            Self::MissingFile { .. } | Self::UnsupportedValue { .. } | Self::FileAccess { .. }
        )
    }
}

/// Result type alias for `OpenAPI` tooling operations.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
