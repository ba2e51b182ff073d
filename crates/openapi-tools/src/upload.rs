//! Multipart encoding for operations with file-designated parameters.
//!
//! Argument validation ([`encode`]) is synchronous and happens while routing. Files are only
//! opened when the payload is turned into a `reqwest` form, and are streamed from disk.

use crate::error::{OpenApiToolsError, Result};
use crate::router::value_to_string;
use reqwest::multipart::{Form, Part};
use rmcp::model::JsonObject;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub path: PathBuf,
}

/// Validated multipart content: file parts by path plus plain form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    pub files: Vec<FilePart>,
    pub fields: Vec<(String, String)>,
}

/// Split `args` into file parts (for `file_params`) and plain fields (everything else).
///
/// # Errors
///
/// - [`OpenApiToolsError::MissingFile`] if a file parameter is absent, `null`, `""` or `[]`.
/// - [`OpenApiToolsError::UnsupportedValue`] if it is neither a path string nor an array of them.
pub fn encode(file_params: &[String], args: &JsonObject) -> Result<MultipartPayload> {
    let mut payload = MultipartPayload::default();

    for param in file_params {
        let missing = || OpenApiToolsError::MissingFile {
            param: param.clone(),
        };
        match args.get(param) {
            None | Some(Value::Null) => return Err(missing()),
            Some(Value::String(path)) if path.is_empty() => return Err(missing()),
            Some(Value::String(path)) => payload.files.push(FilePart {
                field: param.clone(),
                path: PathBuf::from(path),
            }),
            Some(Value::Array(items)) if items.is_empty() => return Err(missing()),
            Some(Value::Array(items)) => {
                for item in items {
                    let Value::String(path) = item else {
                        return Err(unsupported(param, item));
                    };
                    payload.files.push(FilePart {
                        field: param.clone(),
                        path: PathBuf::from(path),
                    });
                }
            }
            Some(other) => return Err(unsupported(param, other)),
        }
    }

    for (name, value) in args {
        if file_params.contains(name) {
            continue;
        }
        payload.fields.push((name.clone(), value_to_string(value)));
    }

    Ok(payload)
}

fn unsupported(param: &str, value: &Value) -> OpenApiToolsError {
    OpenApiToolsError::UnsupportedValue {
        param: param.to_string(),
        found: json_type_name(value),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl MultipartPayload {
    /// Open every file and build the streaming form.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::FileAccess`] naming the first path that cannot be opened.
    pub async fn into_form(self) -> Result<Form> {
        let mut form = Form::new();

        for file in self.files {
            let part = file_part(&file.path).await?;
            form = form.part(file.field, part);
        }
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        Ok(form)
    }
}

async fn file_part(path: &Path) -> Result<Part> {
    let file_access = |source| OpenApiToolsError::FileAccess {
        path: path.display().to_string(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(file_access)?;
    let meta = file.metadata().await.map_err(file_access)?;
    if !meta.is_file() {
        return Err(file_access(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    let len = meta.len();
    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

    let mut part = Part::stream_with_length(body, len).mime_str("application/octet-stream")?;
    if let Some(name) = path.file_name() {
        part = part.file_name(name.to_string_lossy().into_owned());
    }
    Ok(part)
}
