//! Mapping of declared data-model schemas to Swagger property descriptors.
//!
//! The model layer is described through a small introspection surface: a [`SchemaDef`] is the
//! declared "class" (a name plus ordered fields), and a [`SchemaInstance`] is a concrete use of it
//! with optional `only`/`exclude` filters and a `many` flag.
//!
//! Nested schemas are emitted as `{"schema": {..., "id": "<Name><hex>"}}` wrappers so that the
//! document assembler can lift them into the shared definition table. The random hex suffix keeps
//! repeated anonymous uses of the same class from colliding there.

use crate::error::{Error, Result};
use log::{debug, warn};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Numeric base type of a number field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumType {
    Int,
    Float,
    Decimal,
}

/// What a nested field points at
#[derive(Debug, Clone)]
pub enum NestedTarget {
    /// The schema that declares the field
    SelfRef,
    Schema(Arc<SchemaDef>),
}

/// Field kinds exposed by the model layer
#[derive(Debug, Clone)]
pub enum SchemaField {
    String,
    Date,
    DateTime,
    Boolean,
    Number(NumType),
    Dict,
    /// Derived value; documented through the typed field attached as metadata, if any
    Computed(Option<Box<SchemaField>>),
    Nested {
        target: NestedTarget,
        many: bool,
        only: Option<Vec<String>>,
    },
    List(Box<SchemaField>),
    /// Any kind without a Swagger counterpart, by type name
    Other(String),
}

impl SchemaField {
    pub fn nested(schema: &Arc<SchemaDef>) -> Self {
        SchemaField::Nested {
            target: NestedTarget::Schema(Arc::clone(schema)),
            many: false,
            only: None,
        }
    }

    pub fn nested_many(schema: &Arc<SchemaDef>) -> Self {
        SchemaField::Nested {
            target: NestedTarget::Schema(Arc::clone(schema)),
            many: true,
            only: None,
        }
    }

    /// Nesting of the declaring schema itself
    pub fn nested_self(many: bool) -> Self {
        SchemaField::Nested {
            target: NestedTarget::SelfRef,
            many,
            only: None,
        }
    }

    pub fn list(container: SchemaField) -> Self {
        SchemaField::List(Box::new(container))
    }

    pub fn computed(field: Option<SchemaField>) -> Self {
        SchemaField::Computed(field.map(Box::new))
    }

    fn type_name(&self) -> &str {
        match self {
            SchemaField::String => "String",
            SchemaField::Date => "Date",
            SchemaField::DateTime => "DateTime",
            SchemaField::Boolean => "Boolean",
            SchemaField::Number(_) => "Number",
            SchemaField::Dict => "Dict",
            SchemaField::Computed(_) => "Function",
            SchemaField::Nested { .. } => "Nested",
            SchemaField::List(_) => "List",
            SchemaField::Other(name) => name,
        }
    }
}

/// A declared schema class
#[derive(Debug, Clone)]
pub struct SchemaDef {
    name: String,
    fields: Vec<(String, SchemaField)>,
}

impl SchemaDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, key: &str, field: SchemaField) -> Self {
        self.fields.push((key.to_string(), field));
        self
    }

    pub fn build(self) -> Arc<SchemaDef> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_field(&self, key: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn declared_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

/// A use of a schema class, with its field filters
#[derive(Debug, Clone)]
pub struct SchemaInstance {
    class: Arc<SchemaDef>,
    only: Option<Vec<String>>,
    exclude: Vec<String>,
    many: bool,
}

impl SchemaInstance {
    pub fn new(class: &Arc<SchemaDef>) -> Self {
        Self {
            class: Arc::clone(class),
            only: None,
            exclude: Vec::new(),
            many: false,
        }
    }

    /// Restrict properties to `keys`; `exclude` still applies on top
    pub fn only(mut self, keys: &[&str]) -> Self {
        self.only = Some(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn exclude(mut self, keys: &[&str]) -> Self {
        self.exclude = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }

    pub fn class(&self) -> &Arc<SchemaDef> {
        &self.class
    }

    pub fn is_many(&self) -> bool {
        self.many
    }

    /// Top-level Swagger schema for this instance
    pub fn extract(&self) -> Result<Value> {
        extract_schema(self, self.many, false)
    }

    fn keys(&self) -> Vec<&str> {
        let candidates: Vec<&str> = match &self.only {
            Some(only) => only.iter().map(String::as_str).collect(),
            None => self.class.declared_keys().collect(),
        };
        candidates
            .into_iter()
            .filter(|k| !self.exclude.iter().any(|e| e == k))
            .collect()
    }
}

impl From<&Arc<SchemaDef>> for SchemaInstance {
    fn from(class: &Arc<SchemaDef>) -> Self {
        SchemaInstance::new(class)
    }
}

impl From<Arc<SchemaDef>> for SchemaInstance {
    fn from(class: Arc<SchemaDef>) -> Self {
        SchemaInstance::new(&class)
    }
}

/// Swagger scalar type of a single, non-nested field
pub fn extract_from_field(key: &str, field: &SchemaField) -> Result<&'static str> {
    match field {
        SchemaField::String | SchemaField::Date | SchemaField::DateTime => Ok("string"),
        SchemaField::Boolean => Ok("boolean"),
        SchemaField::Number(NumType::Int) => Ok("integer"),
        SchemaField::Number(NumType::Float | NumType::Decimal) => Ok("number"),
        SchemaField::Dict => Ok("object"),
        SchemaField::Computed(Some(inner)) => extract_from_field(key, inner),
        other => Err(Error::UnsupportedField(format!(
            "{}({})",
            other.type_name(),
            key
        ))),
    }
}

/// Property descriptors for the fields an instance exposes
pub fn schema_to_properties(schema: &SchemaInstance) -> Result<Map<String, Value>> {
    let mut result = Map::new();

    for key in schema.keys() {
        let mut field = match schema.class.declared_field(key) {
            Some(field) => field,
            None => {
                warn!("Schema {} has no field {}, skipping", schema.class.name, key);
                continue;
            }
        };
        while let SchemaField::Computed(inner) = field {
            match inner {
                Some(inner) => field = &**inner,
                None => break,
            }
        }

        let property = match field {
            SchemaField::Computed(None) => {
                debug!("Skipping computed field {} without type metadata", key);
                continue;
            }
            SchemaField::Nested { target, many, only } => {
                let (class, mut exclude) = match target {
                    // self nesting keeps the exclusions made so far so that it always terminates
                    NestedTarget::SelfRef => (Arc::clone(&schema.class), schema.exclude.clone()),
                    NestedTarget::Schema(class) => (Arc::clone(class), Vec::new()),
                };
                exclude.push(key.to_string());
                let nested = SchemaInstance {
                    class,
                    only: only.clone(),
                    exclude,
                    many: *many,
                };

                let mut extracted = extract_schema(&nested, *many, true)?;
                if *many {
                    extracted
                } else {
                    if let Some(props) = extracted
                        .get_mut("properties")
                        .and_then(Value::as_object_mut)
                    {
                        props.remove("id");
                    }
                    json!({ "schema": extracted })
                }
            }
            SchemaField::List(container) => json!({
                "type": "array",
                "items": { "type": extract_from_field(key, container)? },
            }),
            other => json!({ "type": extract_from_field(key, other)? }),
        };
        result.insert(key.to_string(), property);
    }
    Ok(result)
}

/// Schema object for an instance.
///
/// Single schemas become `{"properties", "id"}`; `many` wraps one into an array whose `items`
/// hold the nested schema. Nested identifiers get a random suffix.
pub fn extract_schema(schema: &SchemaInstance, many: bool, nested: bool) -> Result<Value> {
    if many {
        return Ok(json!({
            "type": "array",
            "items": { "schema": extract_schema(schema, false, true)? },
        }));
    }

    let properties = schema_to_properties(schema)?;
    let mut schema_id = schema.class.name.clone();
    if nested {
        schema_id.push_str(&Uuid::new_v4().simple().to_string());
    }
    Ok(json!({
        "properties": properties,
        "id": schema_id,
    }))
}
