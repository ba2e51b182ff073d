//! Operation catalog: `OpenAPI` operations converted into MCP tool descriptors.
//!
//! The catalog is built once from one document and is read-only afterwards. Every tool name is
//! unique within the catalog and at most [`MAX_TOOL_NAME_LEN`] characters long; uniqueness is
//! decided on the final (post-truncation) name.

use crate::error::{OpenApiToolsError, Result};
use crate::loader::is_remote;
use crate::resolver::LocalResolver;
use crate::schema::{SchemaConverter, file_path_schema, file_shape};
use crate::semantics::annotations_for_method;
use openapiv3::{
    MediaType, OpenAPI, Operation, Parameter, ParameterSchemaOrContent, PathItem, QueryStyle,
    ReferenceOr, RequestBody, SchemaKind, Server, Type,
};
use reqwest::Method;
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// MCP clients reject tool names longer than this.
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Where an argument travels in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    /// Recognized, never forwarded: server-side calls carry no user cookie jar.
    Cookie,
}

impl ParamLocation {
    fn of(param: &Parameter) -> Self {
        match param {
            Parameter::Path { .. } => Self::Path,
            Parameter::Query { .. } => Self::Query,
            Parameter::Header { .. } => Self::Header,
            Parameter::Cookie { .. } => Self::Cookie,
        }
    }
}

/// Query serialization settings (OpenAPI `style`/`explode`/`allowReserved`).
#[derive(Debug, Clone)]
pub struct QuerySerialization {
    pub style: QueryStyle,
    pub explode: bool,
    pub allow_reserved: bool,
}

impl Default for QuerySerialization {
    fn default() -> Self {
        Self {
            style: QueryStyle::Form,
            explode: true,
            allow_reserved: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// Set for query parameters only.
    pub query: Option<QuerySerialization>,
}

/// How the request body is encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    /// `multipart/form-data` with the listed file-designated fields.
    Multipart { file_params: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct RequestBodySpec {
    pub required: bool,
    pub encoding: BodyEncoding,
}

/// One `OpenAPI` operation, as needed to route a tool call.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub operation_id: Option<String>,
    pub method: Method,
    /// Path template, e.g. `/pet/{petId}`.
    pub path: String,
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
}

impl OperationRecord {
    /// Names of file-designated parameters (empty unless the body is a multipart upload).
    #[must_use]
    pub fn file_params(&self) -> &[String] {
        match self.request_body.as_ref().map(|b| &b.encoding) {
            Some(BodyEncoding::Multipart { file_params }) => file_params,
            _ => &[],
        }
    }
}

/// Protocol-facing description of one tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<JsonObject>,
    pub annotations: ToolAnnotations,
}

impl ToolDescriptor {
    /// Convert into an MCP `Tool`, re-truncating the name to [`MAX_TOOL_NAME_LEN`].
    #[must_use]
    pub fn to_tool(&self) -> Tool {
        let mut tool = Tool::new(
            truncate_chars(&self.name, MAX_TOOL_NAME_LEN),
            self.description.clone(),
            Arc::clone(&self.input_schema),
        );
        tool.annotations = Some(self.annotations.clone());
        tool
    }
}

/// Inputs to [`Catalog::build`] besides the document itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogOptions<'a> {
    /// Base URL override (wins over `servers[0].url`).
    pub base_url: Option<&'a str>,
    /// Where the document was loaded from; relative server URLs resolve against it.
    pub document_location: Option<&'a str>,
}

/// Immutable mapping from tool name to operation, plus the descriptors in document order.
#[derive(Debug, Clone)]
pub struct Catalog {
    base_url: String,
    tools: Vec<ToolDescriptor>,
    operations: HashMap<String, OperationRecord>,
}

impl Catalog {
    /// Build the catalog for every path x method pair in `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::Spec`] if no base URL can be determined or the document is
    /// structurally invalid (dangling/non-local refs, unsupported shapes).
    pub fn build(spec: &OpenAPI, options: CatalogOptions<'_>) -> Result<Self> {
        let base_url = resolve_base_url(spec, options)?;
        let resolver = LocalResolver::new(spec)?;
        let converter = SchemaConverter::new(&resolver);

        let mut names: HashSet<String> = HashSet::new();
        let mut tools = Vec::new();
        let mut operations = HashMap::new();

        for (path, item_ref) in &spec.paths.paths {
            let item = resolver.path_item(item_ref).map_err(|e| {
                OpenApiToolsError::Spec(format!("Invalid path item '{path}': {e}"))
            })?;

            for (method, op) in path_item_operations(&item) {
                let built = build_operation(&resolver, &converter, path, method, op, &item)
                    .map_err(|e| {
                        OpenApiToolsError::Spec(format!(
                            "Invalid operation {} {path}: {e}",
                            method.to_uppercase()
                        ))
                    })?;

                let name = reserve_unique_tool_name(&mut names, &base_tool_name(op, method, path));
                tools.push(ToolDescriptor {
                    name: name.clone(),
                    description: tool_description(op, method, path),
                    input_schema: Arc::new(built.input_schema),
                    annotations: annotations_for_method(&built.record.method),
                });
                operations.insert(name, built.record);
            }
        }

        tracing::info!(
            "Built catalog of {} tools from OpenAPI spec '{}' (base URL {base_url})",
            tools.len(),
            spec.info.title,
        );

        Ok(Self {
            base_url,
            tools,
            operations,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    #[must_use]
    pub fn operation(&self, tool_name: &str) -> Option<&OperationRecord> {
        self.operations.get(tool_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

struct BuiltOperation {
    record: OperationRecord,
    input_schema: JsonObject,
}

fn path_item_operations(item: &PathItem) -> impl Iterator<Item = (&'static str, &Operation)> {
    [
        ("get", &item.get),
        ("put", &item.put),
        ("post", &item.post),
        ("delete", &item.delete),
        ("options", &item.options),
        ("head", &item.head),
        ("patch", &item.patch),
        ("trace", &item.trace),
    ]
    .into_iter()
    .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
}

fn build_operation(
    resolver: &LocalResolver,
    converter: &SchemaConverter<'_>,
    path: &str,
    method: &str,
    op: &Operation,
    item: &PathItem,
) -> Result<BuiltOperation> {
    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();
    let mut parameters = Vec::new();

    for param in merge_parameters(resolver, &item.parameters, &op.parameters)? {
        let location = ParamLocation::of(&param);
        let data = param.parameter_data_ref();
        let is_required = location == ParamLocation::Path || data.required;

        let query = match &param {
            Parameter::Query {
                style,
                allow_reserved,
                ..
            } => Some(QuerySerialization {
                style: style.clone(),
                explode: data.explode.unwrap_or_else(|| default_query_explode(style)),
                allow_reserved: *allow_reserved,
            }),
            _ => None,
        };

        parameters.push(ParameterSpec {
            name: data.name.clone(),
            location,
            required: is_required,
            query,
        });

        if location == ParamLocation::Cookie {
            continue;
        }

        let mut schema = match &data.format {
            ParameterSchemaOrContent::Schema(s) => converter.convert_ref(s)?,
            ParameterSchemaOrContent::Content(_) => json!({ "type": "string" }),
        };
        if let Some(obj) = schema.as_object_mut()
            && !obj.contains_key("description")
            && let Some(desc) = &data.description
        {
            obj.insert("description".to_string(), Value::String(desc.clone()));
        }
        properties.insert(data.name.clone(), schema);
        if is_required {
            required.push(data.name.clone());
        }
    }

    let request_body = match &op.request_body {
        Some(body_ref) => {
            let body = resolver.request_body(body_ref)?;
            Some(collect_body_properties(
                resolver,
                converter,
                &body,
                &mut properties,
                &mut required,
            )?)
        }
        None => None,
    };

    let mut input_schema = Map::new();
    input_schema.insert("type".to_string(), json!("object"));
    input_schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        input_schema.insert("required".to_string(), json!(required));
    }

    Ok(BuiltOperation {
        record: OperationRecord {
            operation_id: op.operation_id.clone(),
            method: resolve_http_method(method)?,
            path: path.to_string(),
            parameters,
            request_body,
        },
        input_schema,
    })
}

/// Path-item parameters first, operation parameters override on (location, name).
fn merge_parameters(
    resolver: &LocalResolver,
    path_item_params: &[ReferenceOr<Parameter>],
    operation_params: &[ReferenceOr<Parameter>],
) -> Result<Vec<Parameter>> {
    let mut merged: Vec<Parameter> = Vec::new();
    let mut index: HashMap<(ParamLocation, String), usize> = HashMap::new();

    for p in path_item_params.iter().chain(operation_params) {
        let rp = resolver.parameter(p)?;
        let key = (ParamLocation::of(&rp), rp.parameter_data_ref().name.clone());
        if let Some(i) = index.get(&key).copied() {
            merged[i] = rp;
        } else {
            index.insert(key, merged.len());
            merged.push(rp);
        }
    }

    Ok(merged)
}

/// Pick the body media type: a multipart upload when it declares file fields, JSON otherwise.
fn select_media_type(body: &RequestBody) -> Option<(&str, &MediaType)> {
    let multipart = body
        .content
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("multipart/form-data"));
    let json = body.content.get("application/json").map(|v| ("application/json", v)).or_else(|| {
        body.content
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase().contains("json"))
            .map(|(k, v)| (k.as_str(), v))
    });

    match (multipart, json) {
        (Some((k, v)), None) => Some((k.as_str(), v)),
        (_, Some(j)) => Some(j),
        (None, None) => body.content.iter().next().map(|(k, v)| (k.as_str(), v)),
    }
}

fn collect_body_properties(
    resolver: &LocalResolver,
    converter: &SchemaConverter<'_>,
    body: &RequestBody,
    properties: &mut Map<String, Value>,
    required: &mut Vec<String>,
) -> Result<RequestBodySpec> {
    // Multipart wins whenever it declares file fields: that is how uploads are expressed.
    let multipart_schema = body
        .content
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("multipart/form-data"))
        .and_then(|(_, mt)| mt.schema.as_ref());
    if let Some(schema_ref) = multipart_schema {
        let schema = resolver.schema(schema_ref)?;
        if let SchemaKind::Type(Type::Object(obj)) = &schema.schema_kind {
            let mut file_params = Vec::new();
            for (name, prop) in &obj.properties {
                if let Some(shape) = file_shape(resolver, prop)? {
                    file_params.push((name.clone(), shape));
                }
            }
            if !file_params.is_empty() {
                for (name, prop) in &obj.properties {
                    if properties.contains_key(name) {
                        tracing::debug!("Body field '{name}' shadowed by a parameter of the same name");
                        continue;
                    }
                    let value = match file_params.iter().find(|(n, _)| n == name) {
                        Some((_, shape)) => {
                            let desc = resolver.boxed_schema(prop)?.schema_data.description;
                            file_path_schema(*shape, desc.as_deref())
                        }
                        None => converter.convert(&resolver.boxed_schema(prop)?)?,
                    };
                    properties.insert(name.clone(), value);
                    if body.required && obj.required.contains(name) {
                        required.push(name.clone());
                    }
                }
                return Ok(RequestBodySpec {
                    required: body.required,
                    encoding: BodyEncoding::Multipart {
                        file_params: file_params.into_iter().map(|(n, _)| n).collect(),
                    },
                });
            }
        }
    }

    let spec = RequestBodySpec {
        required: body.required,
        encoding: BodyEncoding::Json,
    };

    let Some(schema_ref) = select_media_type(body).and_then(|(_, mt)| mt.schema.as_ref()) else {
        insert_body_property(properties, required, json!({}), body.required);
        return Ok(spec);
    };

    let schema = resolver.schema(schema_ref)?;
    if let SchemaKind::Type(Type::Object(obj)) = &schema.schema_kind
        && !obj.properties.is_empty()
    {
        for (name, prop) in &obj.properties {
            if properties.contains_key(name) {
                tracing::debug!("Body field '{name}' shadowed by a parameter of the same name");
                continue;
            }
            properties.insert(name.clone(), converter.convert(&resolver.boxed_schema(prop)?)?);
            // A flattened field is only required if the body itself is.
            if body.required && obj.required.contains(name) {
                required.push(name.clone());
            }
        }
    } else {
        insert_body_property(properties, required, converter.convert(&schema)?, body.required);
    }

    Ok(spec)
}

fn insert_body_property(
    properties: &mut Map<String, Value>,
    required: &mut Vec<String>,
    schema: Value,
    is_required: bool,
) {
    if properties.contains_key("body") {
        tracing::debug!("Request body argument 'body' shadowed by a parameter of the same name");
        return;
    }
    properties.insert("body".to_string(), schema);
    if is_required {
        required.push("body".to_string());
    }
}

fn resolve_base_url(spec: &OpenAPI, options: CatalogOptions<'_>) -> Result<String> {
    let raw = match options.base_url {
        Some(url) => url.to_string(),
        None => spec
            .servers
            .first()
            .map(server_url_with_defaults)
            .ok_or_else(|| OpenApiToolsError::Spec("No base URL found in OpenAPI spec".to_string()))?,
    };

    let resolved = if is_remote(&raw) {
        raw
    } else if let Some(doc) = options.document_location.filter(|d| is_remote(d)) {
        // OpenAPI allows relative server URLs (e.g. "/api/v3"): resolve against the document URL.
        let doc_url = Url::parse(doc).map_err(|e| {
            OpenApiToolsError::Spec(format!("Invalid OpenAPI spec URL '{doc}': {e}"))
        })?;
        doc_url
            .join(&raw)
            .map_err(|e| OpenApiToolsError::Spec(format!("Invalid base URL '{raw}': {e}")))?
            .to_string()
    } else {
        return Err(OpenApiToolsError::Spec(format!(
            "Invalid base URL '{raw}': must be an absolute http(s) URL (set a base URL explicitly)",
        )));
    };

    Url::parse(&resolved)
        .map_err(|e| OpenApiToolsError::Spec(format!("Invalid base URL '{resolved}': {e}")))?;
    Ok(resolved.trim_end_matches('/').to_string())
}

fn server_url_with_defaults(server: &Server) -> String {
    let mut url = server.url.clone();
    if let Some(vars) = &server.variables {
        for (name, var) in vars {
            url = url.replace(&format!("{{{name}}}"), &var.default);
        }
    }
    url
}

fn base_tool_name(operation: &Operation, method: &str, path: &str) -> String {
    operation
        .operation_id
        .as_deref()
        .map(sanitize_tool_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| generate_canonical_name(method, path))
}

fn tool_description(operation: &Operation, method: &str, path: &str) -> String {
    operation
        .summary
        .clone()
        .or_else(|| operation.description.clone())
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Calls {} {}", method.to_uppercase(), path))
}

/// Keep `[A-Za-z0-9_-]`, replace everything else with `_`.
fn sanitize_tool_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generate a canonical tool name from method and path (`get /pet/{petId}` -> `get_pet_petId`).
fn generate_canonical_name(method: &str, path: &str) -> String {
    let raw = format!("{}_{}", method.to_lowercase(), path);
    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && name.ends_with('_') {
            continue;
        }
        name.push(c);
    }
    name.trim_matches('_').to_string()
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Reserve a unique, length-bounded name. Suffix width is reserved before truncating so two
/// names that only differ past the limit still end up distinct.
fn reserve_unique_tool_name(tool_names: &mut HashSet<String>, base: &str) -> String {
    let first = truncate_chars(base, MAX_TOOL_NAME_LEN);
    if tool_names.insert(first.clone()) {
        return first;
    }

    let mut counter = 1usize;
    loop {
        let suffix = format!("_{counter}");
        let stem = truncate_chars(base, MAX_TOOL_NAME_LEN - suffix.len());
        let candidate = format!("{stem}{suffix}");
        if tool_names.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn resolve_http_method(method: &str) -> Result<Method> {
    method.to_uppercase().parse().map_err(|_| {
        OpenApiToolsError::Spec(format!("Unsupported HTTP method: {method}"))
    })
}

fn default_query_explode(style: &QueryStyle) -> bool {
    matches!(style, QueryStyle::Form | QueryStyle::DeepObject)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(yaml: &str) -> Result<Catalog> {
        let spec: OpenAPI = serde_yaml::from_str(yaml).expect("valid spec");
        Catalog::build(&spec, CatalogOptions::default())
    }

    fn props(catalog: &Catalog, tool: &str) -> Map<String, Value> {
        let t = catalog
            .tools()
            .iter()
            .find(|t| t.name == tool)
            .unwrap_or_else(|| panic!("tool {tool}"));
        t.input_schema["properties"].as_object().cloned().unwrap()
    }

    fn required(catalog: &Catalog, tool: &str) -> Vec<String> {
        let t = catalog.tools().iter().find(|t| t.name == tool).unwrap();
        t.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }

    const COINS: &str = r#"
openapi: "3.0.0"
info: { title: coins, version: "1" }
servers:
  - url: https://api.example.com/v3/
paths:
  /coins/{id}:
    parameters:
      - name: id
        in: path
        required: true
        description: Coin id
        schema: { type: string }
    get:
      operationId: getCoin
      summary: Get a coin
      parameters:
        - name: vs_currency
          in: query
          schema: { type: string }
        - name: X-Trace
          in: header
          schema: { type: string }
        - name: session
          in: cookie
          schema: { type: string }
      responses:
        "200": { description: ok }
    delete:
      responses:
        "204": { description: gone }
"#;

    #[test]
    fn test_generate_canonical_name() {
        assert_eq!(generate_canonical_name("get", "/pet/{petId}"), "get_pet_petId");
        assert_eq!(generate_canonical_name("post", "/store/order"), "post_store_order");
        assert_eq!(
            generate_canonical_name("get", "/user/{username}/repos"),
            "get_user_username_repos"
        );
        assert_eq!(generate_canonical_name("get", "/"), "get");
    }

    #[test]
    fn test_sanitize_tool_name() {
        assert_eq!(sanitize_tool_name("pets.list v2"), "pets_list_v2");
        assert_eq!(sanitize_tool_name("get-pet_by_id"), "get-pet_by_id");
    }

    #[test]
    fn builds_tools_with_parameters_and_fallback_names() {
        let catalog = build(COINS).unwrap();
        assert_eq!(catalog.base_url(), "https://api.example.com/v3");
        assert_eq!(catalog.len(), 2);

        let p = props(&catalog, "getCoin");
        assert_eq!(p["id"]["description"], "Coin id");
        assert!(p.contains_key("vs_currency"));
        assert!(p.contains_key("X-Trace"));
        assert!(!p.contains_key("session"), "cookie params are not advertised");
        assert_eq!(required(&catalog, "getCoin"), vec!["id".to_string()]);

        let op = catalog.operation("delete_coins_id").expect("fallback name");
        assert_eq!(op.method, Method::DELETE);
        assert_eq!(op.path, "/coins/{id}");
        assert!(op.parameters.iter().any(|p| p.name == "id"));

        let tool = catalog.tools()[0].to_tool();
        assert_eq!(tool.description.as_deref(), Some("Get a coin"));
        assert_eq!(
            catalog.tools()[1].description,
            "Calls DELETE /coins/{id}".to_string()
        );
    }

    #[test]
    fn cookie_parameters_are_recorded_but_not_advertised() {
        let catalog = build(COINS).unwrap();
        let op = catalog.operation("getCoin").unwrap();
        let cookie = op.parameters.iter().find(|p| p.name == "session").unwrap();
        assert_eq!(cookie.location, ParamLocation::Cookie);
    }

    #[test]
    fn duplicate_operation_ids_get_distinct_names() {
        let catalog = build(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
servers: [{ url: "https://x.test" }]
paths:
  /a:
    get: { operationId: list, responses: { "200": { description: ok } } }
  /b:
    get: { operationId: list, responses: { "200": { description: ok } } }
  /c:
    get: { operationId: list, responses: { "200": { description: ok } } }
"#,
        )
        .unwrap();
        let names: Vec<_> = catalog.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["list", "list_1", "list_2"]);
    }

    #[test]
    fn long_names_stay_unique_after_truncation() {
        let shared = "a".repeat(70);
        let yaml = format!(
            r#"
openapi: "3.0.0"
info: {{ title: t, version: "1" }}
servers: [{{ url: "https://x.test" }}]
paths:
  /one:
    get: {{ operationId: {shared}_one, responses: {{ "200": {{ description: ok }} }} }}
  /two:
    get: {{ operationId: {shared}_two, responses: {{ "200": {{ description: ok }} }} }}
  /three:
    get: {{ operationId: {shared}_three, responses: {{ "200": {{ description: ok }} }} }}
"#
        );
        let catalog = build(&yaml).unwrap();
        let names: HashSet<_> = catalog.tools().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names.len(), 3);
        for name in &names {
            assert!(name.len() <= MAX_TOOL_NAME_LEN, "{name} is too long");
            assert!(catalog.operation(name).is_some());
        }
    }

    #[test]
    fn reserve_unique_tool_name_checks_final_names() {
        let mut names = HashSet::new();
        let base = "x".repeat(MAX_TOOL_NAME_LEN);
        let a = reserve_unique_tool_name(&mut names, &base);
        let b = reserve_unique_tool_name(&mut names, &format!("{base}y"));
        let c = reserve_unique_tool_name(&mut names, &format!("{base}z"));
        assert_eq!(a, base);
        assert_eq!(b.len(), MAX_TOOL_NAME_LEN);
        assert!(b.ends_with("_1"));
        assert!(c.ends_with("_2"));
    }

    #[test]
    fn object_body_is_flattened_and_required_only_when_body_is() {
        let catalog = build(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
servers: [{ url: "https://x.test" }]
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: { type: string }
        tag: { type: string }
        id: { type: integer }
paths:
  /pets/{id}:
    put:
      operationId: updatePet
      parameters:
        - { name: id, in: path, required: true, schema: { type: string } }
      requestBody:
        required: true
        content:
          application/json:
            schema: { $ref: '#/components/schemas/Pet' }
      responses: { "200": { description: ok } }
    post:
      operationId: patchPet
      parameters:
        - { name: id, in: path, required: true, schema: { type: string } }
      requestBody:
        content:
          application/json:
            schema: { $ref: '#/components/schemas/Pet' }
      responses: { "200": { description: ok } }
"#,
        )
        .unwrap();

        let p = props(&catalog, "updatePet");
        assert_eq!(p["id"]["type"], "string", "path parameter wins over body field");
        assert!(p.contains_key("name") && p.contains_key("tag"));
        let req = required(&catalog, "updatePet");
        assert!(req.contains(&"name".to_string()));
        assert!(!req.contains(&"tag".to_string()));

        assert!(!required(&catalog, "patchPet").contains(&"name".to_string()));
        let op = catalog.operation("updatePet").unwrap();
        assert_eq!(op.request_body.as_ref().unwrap().encoding, BodyEncoding::Json);
    }

    #[test]
    fn non_object_body_becomes_single_body_property() {
        let catalog = build(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
servers: [{ url: "https://x.test" }]
paths:
  /tags:
    post:
      operationId: addTags
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: array
              items: { type: string }
      responses: { "200": { description: ok } }
"#,
        )
        .unwrap();
        let p = props(&catalog, "addTags");
        assert_eq!(p.len(), 1);
        assert_eq!(p["body"]["type"], "array");
        assert_eq!(required(&catalog, "addTags"), vec!["body".to_string()]);
    }

    #[test]
    fn multipart_binary_fields_are_file_params() {
        let catalog = build(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
servers: [{ url: "https://x.test" }]
paths:
  /upload:
    post:
      operationId: upload
      requestBody:
        required: true
        content:
          multipart/form-data:
            schema:
              type: object
              required: [file]
              properties:
                file: { type: string, format: binary }
                attachments:
                  type: array
                  items: { type: string, format: binary }
                note: { type: string }
      responses: { "200": { description: ok } }
"#,
        )
        .unwrap();
        let op = catalog.operation("upload").unwrap();
        assert_eq!(op.file_params(), ["file".to_string(), "attachments".to_string()]);

        let p = props(&catalog, "upload");
        assert_eq!(p["file"]["type"], "string");
        assert!(p["file"].get("format").is_none());
        assert_eq!(p["attachments"]["type"], "array");
        assert_eq!(p["note"]["type"], "string");
        assert_eq!(required(&catalog, "upload"), vec!["file".to_string()]);
    }

    #[test]
    fn missing_base_url_is_a_spec_error() {
        let err = build(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
paths: {}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, OpenApiToolsError::Spec(_)));
        assert!(err.to_string().contains("No base URL"));
    }

    #[test]
    fn base_url_override_and_server_variables() {
        let spec: OpenAPI = serde_yaml::from_str(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
servers:
  - url: "https://{region}.example.com/{version}"
    variables:
      region: { default: eu }
      version: { default: v2 }
paths: {}
"#,
        )
        .unwrap();

        let catalog = Catalog::build(&spec, CatalogOptions::default()).unwrap();
        assert_eq!(catalog.base_url(), "https://eu.example.com/v2");

        let catalog = Catalog::build(
            &spec,
            CatalogOptions {
                base_url: Some("http://localhost:8080/"),
                document_location: None,
            },
        )
        .unwrap();
        assert_eq!(catalog.base_url(), "http://localhost:8080");
    }

    #[test]
    fn relative_server_url_resolves_against_document_url() {
        let spec: OpenAPI = serde_yaml::from_str(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
servers: [{ url: /api/v3 }]
paths: {}
"#,
        )
        .unwrap();

        let catalog = Catalog::build(
            &spec,
            CatalogOptions {
                base_url: None,
                document_location: Some("https://petstore3.swagger.io/api/v3/openapi.json"),
            },
        )
        .unwrap();
        assert_eq!(catalog.base_url(), "https://petstore3.swagger.io/api/v3");

        assert!(Catalog::build(&spec, CatalogOptions::default()).is_err());
    }

    #[test]
    fn dangling_parameter_ref_fails_the_whole_build() {
        let err = build(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
servers: [{ url: "https://x.test" }]
paths:
  /users:
    get:
      parameters:
        - $ref: '#/components/parameters/Missing'
      responses: { "200": { description: ok } }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("GET /users"));
    }

    #[test]
    fn query_serialization_is_captured() {
        let catalog = build(
            r#"
openapi: "3.0.0"
info: { title: t, version: "1" }
servers: [{ url: "https://x.test" }]
paths:
  /search:
    get:
      operationId: search
      parameters:
        - name: tags
          in: query
          style: pipeDelimited
          schema: { type: array, items: { type: string } }
      responses: { "200": { description: ok } }
"#,
        )
        .unwrap();
        let op = catalog.operation("search").unwrap();
        let q = op.parameters[0].query.as_ref().unwrap();
        assert!(matches!(q.style, QueryStyle::PipeDelimited));
        assert!(!q.explode);
    }
}
