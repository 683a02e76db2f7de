//! Declarative route table manifests.
//!
//! A manifest describes an application's routes, schemas and forms in YAML or JSON so the
//! Swagger document can be produced at build time:
//!
//! ```yaml
//! info:
//!   title: Shop API
//!   version: 1.0.0
//! modules:
//!   app.items:
//!     tags: [items]
//! schemas:
//!   Item:
//!     fields:
//!       id: integer
//!       title: string
//!       owner: { nested: User }
//! forms:
//!   PageForm:
//!     fields:
//!       page: { kind: int, source: args, required: false, default: 1, min: 1 }
//! routes:
//!   - rule: /items/<int:item_id>
//!     methods: [GET]
//!     handler:
//!       module: app.items
//!       name: get_item
//!       doc: |
//!         Get an item.
//!         ---
//!         tags: [items]
//!       responses:
//!         - { schema: Item, status: 200 }
//! ```
//!
//! Schemas and forms may refer to each other in any order within one manifest.

use crate::field::{Bounds, FieldSpec, LengthLimit, Source};
use crate::form::{FormBinding, FormDecl, FormSpec};
use crate::route::{ClassView, HandlerMeta, Login, Route, StaticRouteTable};
use crate::schema::{NestedTarget, NumType, SchemaDef, SchemaField, SchemaInstance};
use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

/// Parsed manifest file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub info: Option<InfoDecl>,
    pub modules: BTreeMap<String, ModuleDecl>,
    pub schemas: BTreeMap<String, SchemaDecl>,
    pub forms: BTreeMap<String, FormDeclaration>,
    pub routes: Vec<RouteDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfoDecl {
    pub title: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModuleDecl {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaDecl {
    /// Field declarations, in document order
    #[serde(deserialize_with = "ordered_map")]
    pub fields: Vec<(String, SchemaFieldDecl)>,
}

/// A schema field: a kind name such as `string`, `integer`, `list:integer` or
/// `computed:number`, or a nested schema reference
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaFieldDecl {
    Nested {
        nested: String,
        #[serde(default)]
        many: bool,
        #[serde(default)]
        only: Option<Vec<String>>,
    },
    Kind(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormDeclaration {
    pub extends: Vec<String>,
    #[serde(deserialize_with = "ordered_map")]
    pub fields: Vec<(String, FormFieldDecl)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormFieldDecl {
    /// `raw`, `int`, `float`, `string`, `basic_string`, `bool` or `csv`
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub source: String,
    pub name: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub exclusive_min: bool,
    #[serde(default)]
    pub exclusive_max: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub trim: Option<bool>,
    /// Element field of a `csv` list
    pub element: Option<Box<FormFieldDecl>>,
}

/// Deserialize a mapping into its entries, keeping document order
fn ordered_map<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of field declarations")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedVisitor(PhantomData))
}

fn default_kind() -> String {
    "raw".to_string()
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteDecl {
    pub rule: String,
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    pub handler: Option<HandlerDecl>,
    pub view: Option<ViewDecl>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HandlerDecl {
    pub module: String,
    pub name: String,
    pub doc: Option<String>,
    /// `required` or `optional`
    pub login: Option<String>,
    pub form: Option<String>,
    pub responses: Vec<ResponseDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseDecl {
    pub schema: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub many: bool,
    pub only: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewDecl {
    pub module: String,
    pub name: String,
    pub tags: Option<Vec<String>>,
    /// Handlers keyed by verb
    pub methods: BTreeMap<String, HandlerDecl>,
}

/// Parse a manifest, choosing JSON or YAML by file extension
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
    let manifest = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON manifest: {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML manifest: {}", path.display()))?
    };
    debug!("Loaded manifest {}", path.display());
    Ok(manifest)
}

/// Resolves the named schemas and forms of one manifest
struct Registry<'m> {
    manifest: &'m Manifest,
    schemas: HashMap<String, Arc<SchemaDef>>,
    forms: HashMap<String, Arc<FormSpec>>,
    resolving: Vec<String>,
}

impl<'m> Registry<'m> {
    fn new(manifest: &'m Manifest) -> Self {
        Self {
            manifest,
            schemas: HashMap::new(),
            forms: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    fn enter(&mut self, kind: &str, name: &str) -> Result<()> {
        let key = format!("{}:{}", kind, name);
        if self.resolving.contains(&key) {
            bail!("{} {} refers to itself through {:?}", kind, name, self.resolving);
        }
        self.resolving.push(key);
        Ok(())
    }

    fn schema(&mut self, name: &str) -> Result<Arc<SchemaDef>> {
        if let Some(schema) = self.schemas.get(name) {
            return Ok(Arc::clone(schema));
        }
        let manifest = self.manifest;
        let decl = manifest
            .schemas
            .get(name)
            .ok_or_else(|| anyhow!("Unknown schema: {}", name))?;

        self.enter("schema", name)?;
        let mut def = SchemaDef::new(name);
        for (key, field) in &decl.fields {
            let field = self
                .schema_field(name, field)
                .with_context(|| format!("Invalid field {} of schema {}", key, name))?;
            def = def.field(key, field);
        }
        self.resolving.pop();

        let def = def.build();
        self.schemas.insert(name.to_string(), Arc::clone(&def));
        Ok(def)
    }

    fn schema_field(&mut self, owner: &str, decl: &SchemaFieldDecl) -> Result<SchemaField> {
        match decl {
            SchemaFieldDecl::Nested { nested, many, only } => {
                let target = if nested == owner {
                    NestedTarget::SelfRef
                } else {
                    NestedTarget::Schema(self.schema(nested)?)
                };
                Ok(SchemaField::Nested {
                    target,
                    many: *many,
                    only: only.clone(),
                })
            }
            SchemaFieldDecl::Kind(kind) => Ok(parse_field_kind(kind)),
        }
    }

    fn form(&mut self, name: &str) -> Result<Arc<FormSpec>> {
        if let Some(form) = self.forms.get(name) {
            return Ok(Arc::clone(form));
        }
        let manifest = self.manifest;
        let decl = manifest
            .forms
            .get(name)
            .ok_or_else(|| anyhow!("Unknown form: {}", name))?;

        self.enter("form", name)?;
        let mut form = FormDecl::new(name);
        for parent in &decl.extends {
            form = form.extends(&self.form(parent)?);
        }
        for (key, field) in &decl.fields {
            let spec = field_spec(field)
                .with_context(|| format!("Invalid field {} of form {}", key, name))?;
            form = form.field(key, spec);
        }
        self.resolving.pop();

        let form = form.register();
        self.forms.insert(name.to_string(), Arc::clone(&form));
        Ok(form)
    }

    fn handler(&mut self, decl: &HandlerDecl) -> Result<HandlerMeta> {
        let mut handler = HandlerMeta::new(&decl.module, &decl.name);
        handler.doc = decl.doc.clone();
        handler.login = match decl.login.as_deref() {
            None | Some("") | Some("none") => Login::None,
            Some("required") => Login::Required,
            Some("optional") => Login::Optional,
            Some(other) => bail!("Unknown login requirement: {}", other),
        };
        if let Some(form) = &decl.form {
            handler.form = Some(FormBinding::new(self.form(form)?));
        }
        for response in &decl.responses {
            let only: Vec<&str> = response.only.iter().flatten().map(String::as_str).collect();
            let exclude: Vec<&str> = response.exclude.iter().map(String::as_str).collect();

            let mut instance = SchemaInstance::new(&self.schema(&response.schema)?)
                .exclude(&exclude)
                .many(response.many);
            if response.only.is_some() {
                instance = instance.only(&only);
            }
            handler = handler
                .with_response(instance, response.status)
                .with_context(|| format!("Invalid response schema {}", response.schema))?;
        }
        Ok(handler)
    }

    fn route(&mut self, decl: &RouteDecl) -> Result<Route> {
        let methods: Vec<&str> = decl.methods.iter().map(String::as_str).collect();
        match (&decl.handler, &decl.view) {
            (Some(handler), None) => Ok(Route::function(
                &decl.rule,
                &methods,
                self.handler(handler)?,
            )),
            (None, Some(view)) => {
                let mut class = ClassView::new(&view.module, &view.name);
                if let Some(tags) = &view.tags {
                    class = class.tags(tags.clone());
                }
                for (verb, handler) in &view.methods {
                    class = class.method(verb, self.handler(handler)?);
                }
                Ok(Route::class(&decl.rule, &methods, class))
            }
            _ => bail!(
                "Route {} must declare exactly one of handler or view",
                decl.rule
            ),
        }
    }
}

/// Schema field for a kind name; unknown kinds are kept by name and rejected at extraction
fn parse_field_kind(kind: &str) -> SchemaField {
    if let Some(inner) = kind.strip_prefix("list:") {
        return SchemaField::list(parse_field_kind(inner));
    }
    if kind == "computed" {
        return SchemaField::computed(None);
    }
    if let Some(inner) = kind.strip_prefix("computed:") {
        return SchemaField::computed(Some(parse_field_kind(inner)));
    }
    match kind {
        "string" => SchemaField::String,
        "date" => SchemaField::Date,
        "datetime" => SchemaField::DateTime,
        "boolean" => SchemaField::Boolean,
        "integer" => SchemaField::Number(NumType::Int),
        "float" | "number" => SchemaField::Number(NumType::Float),
        "decimal" => SchemaField::Number(NumType::Decimal),
        "dict" => SchemaField::Dict,
        other => SchemaField::Other(other.to_string()),
    }
}

fn field_spec(decl: &FormFieldDecl) -> Result<FieldSpec> {
    let source: Source = decl.source.parse()?;

    let mut spec = match decl.kind.as_str() {
        "raw" => FieldSpec::raw(source),
        "int" => FieldSpec::int(source),
        "float" => FieldSpec::float(source),
        "string" => FieldSpec::string(source),
        "basic_string" => FieldSpec::basic_string(source),
        "bool" => FieldSpec::bool(source),
        "csv" => {
            let element = match &decl.element {
                Some(element) => field_spec(element)?,
                None => FieldSpec::basic_string(source),
            };
            FieldSpec::csv(source, element)
        }
        other => bail!("Unknown field kind: {}", other),
    };

    if decl.min.is_some() || decl.max.is_some() {
        let mut bounds = Bounds::new();
        bounds.min = decl.min;
        bounds.max = decl.max;
        bounds.inc_min = !decl.exclusive_min;
        bounds.inc_max = !decl.exclusive_max;
        spec = spec.bounds(bounds);
    }
    if decl.min_length.is_some() || decl.max_length.is_some() || decl.trim.is_some() {
        spec = spec.length(LengthLimit {
            min: decl.min_length,
            max: decl.max_length,
            trim: decl.trim.unwrap_or(true),
        });
    }
    if let Some(name) = &decl.name {
        spec = spec.named(name);
    }
    if let Some(values) = &decl.enum_values {
        spec = spec.enum_values(values.clone());
    }
    Ok(spec
        .required(decl.required)
        .default_value(decl.default.clone())
        .description(&decl.description))
}

impl Manifest {
    /// Build the route table this manifest declares
    pub fn route_table(&self) -> Result<StaticRouteTable> {
        let mut registry = Registry::new(self);
        let mut table = StaticRouteTable::new();

        for (module, decl) in &self.modules {
            table.set_module_tags(module, decl.tags.clone());
        }
        for route in &self.routes {
            let route = registry
                .route(route)
                .with_context(|| format!("Invalid route {}", route.rule))?;
            table.add_route(route);
        }
        debug!("Manifest declares {} routes", table.len());
        Ok(table)
    }
}
