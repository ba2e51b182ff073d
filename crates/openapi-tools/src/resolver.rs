//! `OpenAPI` `$ref` resolver.
//!
//! The `openapiv3` crate models `$ref`s using `ReferenceOr<T>` but does not resolve them.
//! Catalog building is a pure function of one document, so only local refs (`#/...`) are
//! supported here; anything pointing at another file or URL is reported as a spec error.

use crate::error::{OpenApiToolsError, Result};
use openapiv3::{OpenAPI, Parameter, PathItem, ReferenceOr, RequestBody, Schema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug)]
pub struct LocalResolver {
    root: Value,
}

impl LocalResolver {
    /// Create a resolver over a parsed document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be converted into JSON for pointer lookups.
    pub fn new(spec: &OpenAPI) -> Result<Self> {
        let root = serde_json::to_value(spec).map_err(|e| OpenApiToolsError::Spec(e.to_string()))?;
        Ok(Self { root })
    }

    /// # Errors
    ///
    /// Returns an error if the reference is non-local, dangling, cyclic, or of the wrong shape.
    pub fn parameter(&self, param: &ReferenceOr<Parameter>) -> Result<Parameter> {
        self.resolve(param)
    }

    /// # Errors
    ///
    /// Returns an error if the reference is non-local, dangling, cyclic, or of the wrong shape.
    pub fn request_body(&self, body: &ReferenceOr<RequestBody>) -> Result<RequestBody> {
        self.resolve(body)
    }

    /// # Errors
    ///
    /// Returns an error if the reference is non-local, dangling, cyclic, or of the wrong shape.
    pub fn schema(&self, schema: &ReferenceOr<Schema>) -> Result<Schema> {
        self.resolve(schema)
    }

    /// Same as [`Self::schema`] for boxed schema refs (object properties, array items).
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is non-local, dangling, cyclic, or of the wrong shape.
    pub fn boxed_schema(&self, schema: &ReferenceOr<Box<Schema>>) -> Result<Schema> {
        match schema {
            ReferenceOr::Item(s) => Ok(s.as_ref().clone()),
            ReferenceOr::Reference { reference } => self.resolve(&ReferenceOr::<Schema>::Reference {
                reference: reference.clone(),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the reference is non-local, dangling, cyclic, or of the wrong shape.
    pub fn path_item(&self, item: &ReferenceOr<PathItem>) -> Result<PathItem> {
        self.resolve(item)
    }

    fn resolve<T>(&self, r: &ReferenceOr<T>) -> Result<T>
    where
        T: Clone + DeserializeOwned,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut cur: ReferenceOr<T> = r.clone();

        loop {
            match cur {
                ReferenceOr::Item(item) => return Ok(item),
                ReferenceOr::Reference { reference } => {
                    if !seen.insert(reference.clone()) {
                        return Err(OpenApiToolsError::Spec(format!(
                            "Cyclic $ref detected while resolving: {reference}",
                        )));
                    }
                    let value = self.lookup(&reference)?;
                    cur = serde_json::from_value(value).map_err(|e| {
                        OpenApiToolsError::Spec(format!(
                            "Failed to deserialize referenced value '{reference}' as expected type: {e}",
                        ))
                    })?;
                }
            }
        }
    }

    fn lookup(&self, reference: &str) -> Result<Value> {
        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(OpenApiToolsError::Spec(format!(
                "Unsupported $ref '{reference}': only local references (#/...) are supported",
            )));
        };
        if !pointer.starts_with('/') {
            return Err(OpenApiToolsError::Spec(format!(
                "Unsupported $ref fragment (expected JSON pointer starting with '/'): {reference}",
            )));
        }
        self.root.pointer(pointer).cloned().ok_or_else(|| {
            OpenApiToolsError::Spec(format!("Unresolved $ref '{reference}'"))
        })
    }
}
