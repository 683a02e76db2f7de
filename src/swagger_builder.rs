//! Swagger 2.0 document assembly.
//!
//! [`SwaggerBuilder`] walks a [`RouteTable`], parses every handler's documentation, completes
//! the declared fragment with inferred path/form parameters, declared responses and defaults,
//! and lifts embedded schemas into a flat, per-handler namespaced definition table.
//!
//! The builder only reads route and handler metadata, so concurrent assemblies over the same
//! table need no locking.

use crate::docstring::parse_docstring;
use crate::error::{Error, Result};
use crate::form::form_params;
use crate::route::{Endpoint, HandlerMeta, Login, Route, RouteTable};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Verbs that are never documented
const IGNORED_VERBS: [&str; 2] = ["HEAD", "OPTIONS"];

/// Operation fields copied verbatim from the fragment when present
const OPTIONAL_FIELDS: [&str; 8] = [
    "tags",
    "consumes",
    "produces",
    "schemes",
    "security",
    "deprecated",
    "operationId",
    "externalDocs",
];

/// Swagger Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub version: String,
    pub title: String,
}

/// Swagger Operation object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<Value>,
    /// Keyed by stringified status code
    pub responses: Map<String, Value>,
    /// Tags, security and the other optional fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Operations of one path, keyed by lower-case verb
pub type PathItem = BTreeMap<String, Operation>;

/// Complete Swagger 2.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwaggerDocument {
    pub swagger: String,
    pub info: Info,
    pub paths: BTreeMap<String, PathItem>,
    /// Flattened schemas keyed by `<namespace>:<id>`
    pub definitions: BTreeMap<String, Value>,
}

/// Swagger document builder
pub struct SwaggerBuilder {
    info: Info,
    paths: BTreeMap<String, PathItem>,
    definitions: BTreeMap<String, Value>,
}

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?:(?P<converter>[^<>]*):)?(?P<name>[^<>]*)>")
        .expect("Failed to compile path regex")
});

/// Replace `<converter:name>` placeholders with `{name}`
pub fn normalize_path(rule: &str) -> String {
    PLACEHOLDER_REGEX
        .replace_all(rule, "{${name}}")
        .into_owned()
}

/// Required path parameters declared by the placeholders of `rule`
pub fn path_params(rule: &str) -> Vec<Value> {
    PLACEHOLDER_REGEX
        .captures_iter(rule)
        .map(|caps| {
            let name = &caps["name"];
            let converter = caps
                .name("converter")
                .map(|m| m.as_str().split('(').next().unwrap_or_default().trim())
                .unwrap_or_default();
            let param_type = match converter {
                "int" => "integer",
                "float" => "number",
                _ => "string",
            };
            json!({
                "name": name,
                "type": param_type,
                "in": "path",
                "required": true,
                "description": name,
            })
        })
        .collect()
}

/// Reasonable default response for a lower-case verb
pub fn default_response(verb: &str) -> Map<String, Value> {
    let (status, description) = match verb {
        "post" => ("201", "success"),
        "patch" | "delete" | "put" => ("204", "success"),
        _ => ("200", "api result"),
    };
    let mut responses = Map::new();
    responses.insert(status.to_string(), json!({ "description": description }));
    responses
}

/// Handler answering a verb, with the tags of its owning view if any
struct VerbHandler {
    verb: String,
    handler: Arc<HandlerMeta>,
    view_tags: Option<Vec<String>>,
}

fn group_endpoints_by_verb(route: &Route) -> Vec<VerbHandler> {
    route
        .methods
        .iter()
        .filter(|m| !IGNORED_VERBS.contains(&m.as_str()))
        .filter_map(|method| {
            let verb = method.to_lowercase();
            match &route.endpoint {
                Endpoint::Function(handler) => Some(VerbHandler {
                    verb,
                    handler: Arc::clone(handler),
                    view_tags: None,
                }),
                Endpoint::Class(view) => match view.handler(&verb) {
                    Some(handler) => Some(VerbHandler {
                        handler: Arc::clone(handler),
                        view_tags: view.tags.clone(),
                        verb,
                    }),
                    None => {
                        debug!("View {} does not implement {}", view.name, verb);
                        None
                    }
                },
            }
        })
        .collect()
}

/// Definitions found inside array `items`
fn extract_array_defs(source: &mut Value, level: usize, namespace: &str) -> Vec<Value> {
    if source.get("type").and_then(Value::as_str) != Some("array") {
        return Vec::new();
    }
    match source.get_mut("items") {
        Some(items) if items.get("schema").is_some() => {
            extract_definitions(std::iter::once(items), level + 1, namespace)
        }
        _ => Vec::new(),
    }
}

/// Lifts identified schemas out of `items`, recursively.
///
/// Every `schema` carrying an `id` is replaced by a `$ref` to `<namespace>:<id>`. At the top
/// level the `schema` value becomes the reference; deeper down the reference is spliced into
/// the parent and `schema` is dropped.
///
/// # Arguments
///
/// * `items` - Response or property objects that may hold a `schema`
/// * `level` - Nesting depth, `0` for response objects
/// * `namespace` - Definition prefix, usually `<module>.<handler>`
///
/// # Returns
///
/// The lifted schemas, still carrying their `id`, innermost ones included.
pub fn extract_definitions<'a, I>(items: I, level: usize, namespace: &str) -> Vec<Value>
where
    I: IntoIterator<Item = &'a mut Value>,
{
    let mut defs = Vec::new();

    for item in items {
        let Some(obj) = item.as_object_mut() else {
            continue;
        };

        if let Some(mut schema) = obj.remove("schema") {
            if let Some(properties) = schema.get_mut("properties").and_then(Value::as_object_mut) {
                defs.extend(extract_definitions(
                    properties.values_mut(),
                    level + 1,
                    namespace,
                ));
            }
            defs.extend(extract_array_defs(&mut schema, level, namespace));

            match schema.get("id").and_then(Value::as_str).map(str::to_string) {
                Some(schema_id) => {
                    let reference =
                        Value::String(format!("#/definitions/{}:{}", namespace, schema_id));
                    if level == 0 {
                        obj.insert("schema".to_string(), json!({ "$ref": reference }));
                    } else {
                        obj.insert("$ref".to_string(), reference);
                    }
                    defs.push(schema);
                }
                None => {
                    obj.insert("schema".to_string(), schema);
                }
            }
        }

        defs.extend(extract_array_defs(item, level, namespace));
    }
    defs
}

/// Definitions declared by the fragment itself, as a list of `{schema}` items or a
/// `name -> schema` mapping
fn extract_fragment_definitions(declared: Value, namespace: &str) -> Result<Vec<Value>> {
    let mut items = match declared {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(named) => named
            .into_iter()
            .map(|(name, mut schema)| {
                if let Some(obj) = schema.as_object_mut() {
                    obj.entry("id").or_insert(Value::String(name));
                }
                json!({ "schema": schema })
            })
            .collect(),
        other => {
            return Err(Error::Fragment(format!(
                "definitions must be a list or a mapping, got {}",
                other
            )))
        }
    };
    Ok(extract_definitions(items.iter_mut(), 0, namespace))
}

impl SwaggerBuilder {
    /// Create a new SwaggerBuilder with default info
    pub fn new() -> Self {
        debug!("Initializing SwaggerBuilder");
        Self {
            info: Info {
                version: "0.0.1".to_string(),
                title: "swagger project".to_string(),
            },
            paths: BTreeMap::new(),
            definitions: BTreeMap::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String) -> Self {
        self.info = Info { version, title };
        self
    }

    /// Add every route of `table`
    pub fn add_table(&mut self, table: &dyn RouteTable) -> Result<()> {
        for route in table.routes() {
            self.add_route(&route, table)?;
        }
        Ok(())
    }

    /// Adds the documented verbs of one route to the document.
    ///
    /// Each verb's handler docstring becomes an operation. Tags, security, parameters and
    /// responses are completed from the handler metadata, and nested schemas are lifted into
    /// the definition table. Routes without any documented verb are skipped.
    ///
    /// # Arguments
    ///
    /// * `route` - The route to document
    /// * `table` - The route table, consulted for module tags
    ///
    /// # Errors
    ///
    /// Returns an error if a docstring fragment is not valid YAML or has the wrong shape.
    pub fn add_route(&mut self, route: &Route, table: &dyn RouteTable) -> Result<()> {
        debug!("Adding route: {}", route.rule);

        let mut operations = PathItem::new();
        for VerbHandler {
            verb,
            handler,
            view_tags,
        } in group_endpoints_by_verb(route)
        {
            let doc = parse_docstring(handler.doc.as_deref())?;
            let mut swag = match doc.fragment {
                Some(fragment) => fragment,
                None => {
                    debug!("Skipping undocumented {} {}", verb, route.rule);
                    continue;
                }
            };

            Self::complete_tags(&mut swag, &handler, view_tags, table);
            Self::complete_security(&mut swag, &handler);

            let namespace = handler.namespace();

            let mut params = match swag.remove("parameters") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(params)) => params,
                Some(other) => {
                    return Err(Error::Fragment(format!(
                        "parameters of {} must be a list, got {}",
                        namespace, other
                    )))
                }
            };
            Self::complete_params(&mut params, &handler, &route.rule);

            let declared = match swag.remove("responses") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(responses)) => responses,
                Some(other) => {
                    return Err(Error::Fragment(format!(
                        "responses of {} must be a mapping, got {}",
                        namespace, other
                    )))
                }
            };
            let mut responses = Self::complete_responses(declared, &handler, &verb);

            let mut defs = extract_fragment_definitions(
                swag.remove("definitions").unwrap_or(Value::Null),
                &namespace,
            )?;
            defs.extend(extract_definitions(params.iter_mut(), 0, &namespace));
            defs.extend(extract_definitions(responses.values_mut(), 0, &namespace));
            self.store_definitions(defs, &namespace);

            let extra = OPTIONAL_FIELDS
                .iter()
                .filter_map(|key| swag.get(*key).map(|v| (key.to_string(), v.clone())))
                .collect();

            debug!("Documented {} {} ({})", verb, route.rule, namespace);
            operations.insert(
                verb,
                Operation {
                    summary: doc.summary,
                    description: doc.description,
                    parameters: params,
                    responses,
                    extra,
                },
            );
        }

        if operations.is_empty() {
            debug!("No documented verbs for {}", route.rule);
            return Ok(());
        }
        self.paths
            .entry(normalize_path(&route.rule))
            .or_default()
            .extend(operations);
        Ok(())
    }

    fn complete_tags(
        swag: &mut Map<String, Value>,
        handler: &HandlerMeta,
        view_tags: Option<Vec<String>>,
        table: &dyn RouteTable,
    ) {
        if swag.contains_key("tags") {
            return;
        }
        let tags = view_tags
            .filter(|tags| !tags.is_empty())
            .or_else(|| table.module_tags(&handler.module))
            .filter(|tags| !tags.is_empty())
            .unwrap_or_else(|| vec![handler.module.clone()]);
        swag.insert("tags".to_string(), json!(tags));
    }

    fn complete_security(swag: &mut Map<String, Value>, handler: &HandlerMeta) {
        if !swag.contains_key("security") {
            swag.insert("security".to_string(), json!([]));
        }
        if matches!(handler.login, Login::Required | Login::Optional) {
            swag.insert("security".to_string(), json!([{ "Bearer": [] }]));
        }
    }

    fn complete_params(params: &mut Vec<Value>, handler: &HandlerMeta, rule: &str) {
        params.extend(path_params(rule));
        if let Some(form) = &handler.form {
            params.extend(form_params(form.spec()));
        }
    }

    fn complete_responses(
        mut responses: Map<String, Value>,
        handler: &HandlerMeta,
        verb: &str,
    ) -> Map<String, Value> {
        if let Some(attached) = &handler.responses {
            responses.extend(attached.clone());
        }
        if responses.is_empty() {
            return default_response(verb);
        }
        responses
    }

    fn store_definitions(&mut self, defs: Vec<Value>, namespace: &str) {
        for mut definition in defs {
            let Some(obj) = definition.as_object_mut() else {
                continue;
            };
            let def_id = match obj.remove("id") {
                Some(Value::String(id)) => id,
                Some(other) => other.to_string(),
                None => continue,
            };
            let key = format!("{}:{}", namespace, def_id);
            debug!("Storing definition {}", key);

            let entry = self
                .definitions
                .entry(key)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(existing) = entry.as_object_mut() {
                existing.extend(obj.clone());
            }
        }
    }

    /// Build the final Swagger document
    pub fn build(self) -> SwaggerDocument {
        debug!(
            "Building final Swagger document with {} paths and {} definitions",
            self.paths.len(),
            self.definitions.len()
        );
        SwaggerDocument {
            swagger: "2.0".to_string(),
            info: self.info,
            paths: self.paths,
            definitions: self.definitions,
        }
    }
}

impl Default for SwaggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assembles the Swagger document for every route of `table`.
///
/// The document carries the default info block; use [`SwaggerBuilder::with_info`] to set it.
///
/// # Arguments
///
/// * `table` - The application's route table
///
/// # Returns
///
/// A fresh [`SwaggerDocument`]. Response schemas are extracted when they are declared, so
/// repeated calls over the same table give equal documents.
///
/// # Errors
///
/// Returns an error if any handler's docstring fragment is invalid.
pub fn swagger(table: &dyn RouteTable) -> Result<SwaggerDocument> {
    let mut builder = SwaggerBuilder::new();
    builder.add_table(table)?;
    Ok(builder.build())
}
