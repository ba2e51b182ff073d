//! `OpenAPI` schema -> JSON Schema conversion for tool input schemas.

use crate::error::Result;
use crate::resolver::LocalResolver;
use openapiv3::{
    ReferenceOr, Schema, SchemaKind, StringFormat, Type, VariantOrUnknownOrEmpty,
};
use serde_json::{Map, Value, json};

/// Nested `$ref`s deeper than this are advertised as an unconstrained schema.
const MAX_REF_DEPTH: usize = 8;

/// Converts `OpenAPI` schemas into self-contained JSON Schema values (local refs inlined).
pub struct SchemaConverter<'a> {
    resolver: &'a LocalResolver,
}

impl<'a> SchemaConverter<'a> {
    #[must_use]
    pub fn new(resolver: &'a LocalResolver) -> Self {
        Self { resolver }
    }

    /// # Errors
    ///
    /// Returns an error if a local `$ref` cannot be resolved.
    pub fn convert_ref(&self, schema: &ReferenceOr<Schema>) -> Result<Value> {
        self.convert_ref_at(schema, 0)
    }

    /// # Errors
    ///
    /// Returns an error if a nested local `$ref` cannot be resolved.
    pub fn convert(&self, schema: &Schema) -> Result<Value> {
        self.convert_at(schema, 0)
    }

    fn convert_ref_at(&self, schema: &ReferenceOr<Schema>, depth: usize) -> Result<Value> {
        match schema {
            ReferenceOr::Item(s) => self.convert_at(s, depth),
            ReferenceOr::Reference { .. } if depth >= MAX_REF_DEPTH => Ok(json!({})),
            ReferenceOr::Reference { .. } => {
                let resolved = self.resolver.schema(schema)?;
                self.convert_at(&resolved, depth + 1)
            }
        }
    }

    fn convert_boxed_at(&self, schema: &ReferenceOr<Box<Schema>>, depth: usize) -> Result<Value> {
        match schema {
            ReferenceOr::Item(s) => self.convert_at(s, depth),
            ReferenceOr::Reference { .. } if depth >= MAX_REF_DEPTH => Ok(json!({})),
            ReferenceOr::Reference { .. } => {
                let resolved = self.resolver.boxed_schema(schema)?;
                self.convert_at(&resolved, depth + 1)
            }
        }
    }

    fn convert_at(&self, schema: &Schema, depth: usize) -> Result<Value> {
        let mut result = Map::new();

        if let Some(desc) = &schema.schema_data.description {
            result.insert("description".to_string(), json!(desc));
        }
        if let Some(default) = &schema.schema_data.default {
            result.insert("default".to_string(), default.clone());
        }

        match &schema.schema_kind {
            SchemaKind::Type(t) => self.convert_type(t, depth, &mut result)?,
            SchemaKind::OneOf { one_of } => {
                result.insert("oneOf".to_string(), self.convert_all(one_of, depth)?);
            }
            SchemaKind::AnyOf { any_of } => {
                result.insert("anyOf".to_string(), self.convert_all(any_of, depth)?);
            }
            SchemaKind::AllOf { all_of } => {
                result.insert("allOf".to_string(), self.convert_all(all_of, depth)?);
            }
            SchemaKind::Not { .. } | SchemaKind::Any(_) => {}
        }

        Ok(Value::Object(result))
    }

    fn convert_all(&self, schemas: &[ReferenceOr<Schema>], depth: usize) -> Result<Value> {
        let mut out = Vec::with_capacity(schemas.len());
        for s in schemas {
            out.push(self.convert_ref_at(s, depth)?);
        }
        Ok(Value::Array(out))
    }

    fn convert_type(&self, t: &Type, depth: usize, result: &mut Map<String, Value>) -> Result<()> {
        match t {
            Type::String(s) => {
                result.insert("type".to_string(), json!("string"));
                if let Some(format) = string_format_name(&s.format) {
                    result.insert("format".to_string(), json!(format));
                }
                if !s.enumeration.is_empty() {
                    let values: Vec<_> = s.enumeration.iter().filter_map(Clone::clone).collect();
                    result.insert("enum".to_string(), json!(values));
                }
            }
            Type::Number(n) => {
                result.insert("type".to_string(), json!("number"));
                if !n.enumeration.is_empty() {
                    let values: Vec<_> = n.enumeration.iter().filter_map(|v| *v).collect();
                    result.insert("enum".to_string(), json!(values));
                }
            }
            Type::Integer(i) => {
                result.insert("type".to_string(), json!("integer"));
                if !i.enumeration.is_empty() {
                    let values: Vec<_> = i.enumeration.iter().filter_map(|v| *v).collect();
                    result.insert("enum".to_string(), json!(values));
                }
            }
            Type::Boolean(_) => {
                result.insert("type".to_string(), json!("boolean"));
            }
            Type::Array(a) => {
                result.insert("type".to_string(), json!("array"));
                if let Some(items) = &a.items {
                    result.insert("items".to_string(), self.convert_boxed_at(items, depth)?);
                }
            }
            Type::Object(o) => {
                result.insert("type".to_string(), json!("object"));
                let mut properties = Map::new();
                for (name, prop) in &o.properties {
                    properties.insert(name.clone(), self.convert_boxed_at(prop, depth)?);
                }
                if !properties.is_empty() {
                    result.insert("properties".to_string(), Value::Object(properties));
                }
                if !o.required.is_empty() {
                    result.insert("required".to_string(), json!(o.required));
                }
            }
        }
        Ok(())
    }
}

fn string_format_name(format: &VariantOrUnknownOrEmpty<StringFormat>) -> Option<String> {
    match format {
        VariantOrUnknownOrEmpty::Item(f) => Some(
            match f {
                StringFormat::Date => "date",
                StringFormat::DateTime => "date-time",
                StringFormat::Password => "password",
                StringFormat::Byte => "byte",
                StringFormat::Binary => "binary",
            }
            .to_string(),
        ),
        VariantOrUnknownOrEmpty::Unknown(s) => Some(s.clone()),
        VariantOrUnknownOrEmpty::Empty => None,
    }
}

/// How a multipart property carries file content, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileShape {
    Single,
    Many,
}

/// Classify a multipart body property: `string/binary` is one file, an array of those is many.
///
/// # Errors
///
/// Returns an error if a local `$ref` cannot be resolved.
pub fn file_shape(resolver: &LocalResolver, prop: &ReferenceOr<Box<Schema>>) -> Result<Option<FileShape>> {
    let schema = resolver.boxed_schema(prop)?;
    if is_binary_string(&schema) {
        return Ok(Some(FileShape::Single));
    }
    if let SchemaKind::Type(Type::Array(a)) = &schema.schema_kind
        && let Some(items) = &a.items
        && is_binary_string(&resolver.boxed_schema(items)?)
    {
        return Ok(Some(FileShape::Many));
    }
    Ok(None)
}

fn is_binary_string(schema: &Schema) -> bool {
    matches!(
        &schema.schema_kind,
        SchemaKind::Type(Type::String(s))
            if matches!(s.format, VariantOrUnknownOrEmpty::Item(StringFormat::Binary))
    )
}

/// Input-schema fragment advertised for a file parameter: callers pass local paths.
#[must_use]
pub fn file_path_schema(shape: FileShape, description: Option<&str>) -> Value {
    let desc = description.map_or_else(
        || "Absolute path to a local file to upload".to_string(),
        |d| format!("{d} (absolute path to a local file to upload)"),
    );
    match shape {
        FileShape::Single => json!({ "type": "string", "description": desc }),
        FileShape::Many => json!({
            "type": "array",
            "items": { "type": "string" },
            "description": desc,
        }),
    }
}
