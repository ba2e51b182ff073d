//! Loading an `OpenAPI` document from a file path or an http(s) URL.

use crate::error::{OpenApiToolsError, Result};
use openapiv3::OpenAPI;
use reqwest::Client;
use url::Url;

/// `true` when `location` names a remote document rather than a file.
#[must_use]
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Load and parse an `OpenAPI` document.
///
/// JSON is a valid subset of YAML, so `serde_yaml` handles both encodings.
///
/// # Errors
///
/// Returns an error if the document cannot be read/fetched or does not parse as `OpenAPI` 3.x.
pub async fn load_document(location: &str, client: &Client) -> Result<OpenAPI> {
    let content = if is_remote(location) {
        tracing::info!("Fetching OpenAPI spec from {location}");
        let url = Url::parse(location).map_err(|e| {
            OpenApiToolsError::Spec(format!("Invalid OpenAPI spec URL '{location}': {e}"))
        })?;
        let resp = client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| OpenApiToolsError::SpecFetch {
                url: location.to_string(),
                message: e.to_string(),
            })?;
        resp.text().await.map_err(|e| OpenApiToolsError::SpecFetch {
            url: location.to_string(),
            message: e.to_string(),
        })?
    } else {
        tracing::info!("Loading OpenAPI spec from {location}");
        tokio::fs::read_to_string(location)
            .await
            .map_err(|e| OpenApiToolsError::SpecReadFile {
                path: location.to_string(),
                source: e,
            })?
    };

    parse_document(location, &content)
}

/// Parse an `OpenAPI` document from text.
///
/// # Errors
///
/// Returns an error if the text is not a structurally valid `OpenAPI` 3.x document.
pub fn parse_document(location: &str, content: &str) -> Result<OpenAPI> {
    let spec: OpenAPI =
        serde_yaml::from_str(content).map_err(|e| OpenApiToolsError::SpecParse {
            location: location.to_string(),
            source: e,
        })?;

    if !spec.openapi.starts_with("3.") {
        return Err(OpenApiToolsError::Spec(format!(
            "Unsupported OpenAPI version '{}' in '{location}' (expected 3.x)",
            spec.openapi
        )));
    }

    Ok(spec)
}
