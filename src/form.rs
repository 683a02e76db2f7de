//! Form registry and request-time form resolution.
//!
//! A form is declared once with [`FormDecl`] and registered into an immutable [`FormSpec`]:
//! an ordered, duplicate-free list of field keys with their descriptors. Inheritance copies the
//! parent's list before the form's own fields are appended. At request time a [`Form`] resolves
//! those fields against an explicit [`RequestContext`]; [`FormBinding`] ties a form to a handler
//! and runs an optional after-loading hook before the handler body.
//!
//! The same registry feeds [`form_params`], which turns the declared fields into Swagger
//! parameter objects.

use crate::error::{Error, Result};
use crate::field::{FieldSpec, Source, Step};
use crate::request::RequestContext;
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Declaration of a form type, before registration
#[derive(Debug, Clone)]
pub struct FormDecl {
    name: String,
    bases: Vec<Arc<FormSpec>>,
    own: Vec<(String, FieldSpec)>,
}

impl FormDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bases: Vec::new(),
            own: Vec::new(),
        }
    }

    /// Inherit every field of `parent`; parents are walked in the order they are added
    pub fn extends(mut self, parent: &Arc<FormSpec>) -> Self {
        self.bases.push(Arc::clone(parent));
        self
    }

    /// Declare a field under `key`
    pub fn field(mut self, key: &str, spec: FieldSpec) -> Self {
        self.own.push((key.to_string(), spec));
        self
    }

    /// Collect inherited and own fields into the immutable registry entry
    pub fn register(self) -> Arc<FormSpec> {
        let mut fields: Vec<(String, FieldSpec)> = Vec::new();

        let inherited = self
            .bases
            .iter()
            .flat_map(|base| base.fields.iter().cloned());
        for (key, mut spec) in inherited.chain(self.own) {
            spec.bind_name(&key);
            match fields.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = spec,
                None => fields.push((key, spec)),
            }
        }

        debug!(
            "Registered form {} with fields {:?}",
            self.name,
            fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>()
        );
        Arc::new(FormSpec {
            name: self.name,
            fields,
        })
    }
}

/// Registered form: ordered field keys and their descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct FormSpec {
    name: String,
    fields: Vec<(String, FieldSpec)>,
}

impl FormSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field keys in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, f)| (k.as_str(), f))
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A form being resolved for one request
pub struct Form<'r> {
    spec: &'r FormSpec,
    req: &'r dyn RequestContext,
    overrides: HashMap<String, Value>,
}

impl<'r> Form<'r> {
    pub fn new(spec: &'r FormSpec, req: &'r dyn RequestContext) -> Self {
        Self {
            spec,
            req,
            overrides: HashMap::new(),
        }
    }

    pub fn spec(&self) -> &FormSpec {
        self.spec
    }

    /// Resolve one field against the request
    pub fn get(&self, key: &str) -> Result<Value> {
        if let Some(value) = self.overrides.get(key) {
            return Ok(value.clone());
        }
        let field = self.spec.field(key).ok_or_else(|| {
            Error::validation(format!(
                "FIELD {} is not declared on form {}",
                key, self.spec.name
            ))
        })?;
        field.resolve(self.req)
    }

    /// Replace a field's value for the rest of this request
    pub fn set(&mut self, key: &str, value: Value) {
        self.overrides.insert(key.to_string(), value);
    }

    /// Resolve every field, failing on the first invalid one
    pub fn values(&self) -> Result<Map<String, Value>> {
        self.spec
            .names()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Resolve every field into a typed structure
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.values()?))?)
    }
}

type LoadingHook = dyn Fn(&mut Form<'_>) -> Result<()> + Send + Sync;

/// A form attached to a handler
#[derive(Clone)]
pub struct FormBinding {
    spec: Arc<FormSpec>,
    hook: Option<Arc<LoadingHook>>,
}

impl FormBinding {
    pub fn new(spec: Arc<FormSpec>) -> Self {
        Self { spec, hook: None }
    }

    /// Run `hook` once per request, after the form is activated and before the handler
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Form<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn spec(&self) -> &Arc<FormSpec> {
        &self.spec
    }

    /// Activate a fresh form for `req` and run `handler` with it
    pub fn invoke<R, H>(&self, req: &dyn RequestContext, handler: H) -> Result<R>
    where
        H: FnOnce(&Form<'_>) -> Result<R>,
    {
        let mut form = Form::new(&self.spec, req);
        if let Some(hook) = &self.hook {
            hook(&mut form)?;
        }
        handler(&form)
    }
}

impl fmt::Debug for FormBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormBinding")
            .field("spec", &self.spec)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Builds the Swagger parameter objects for the fields of a form.
///
/// Fields appear in form order, inherited ones first. Path-sourced fields are skipped since
/// the route template already yields them.
///
/// # Arguments
///
/// * `spec` - The registered form
///
/// # Returns
///
/// One parameter object per field, carrying `name`, `type`, `in`, `required` and, when
/// declared, `description`, `enum` and `default`.
pub fn form_params(spec: &FormSpec) -> Vec<Value> {
    spec.fields()
        .filter_map(|(_, field)| {
            let location = match field.source() {
                Source::Args => "query",
                Source::Form | Source::Json => "formData",
                Source::Path => return None,
            };
            let is_list = field.steps().iter().any(|s| matches!(s, Step::EachCsv(_)));
            let param_type = match field.primitive() {
                Some(p) if !is_list => p.swagger_type(),
                _ => "string",
            };

            let mut param = json!({
                "name": field.name(),
                "type": param_type,
                "in": location,
                "description": field.get_description(),
                "required": field.is_required(),
            });
            if is_truthy(field.default()) {
                param["default"] = field.default().clone();
            }
            if let Some(values) = field.get_enum_values().filter(|v| !v.is_empty()) {
                param["enum"] = Value::Array(values.to_vec());
            }
            Some(param)
        })
        .collect()
}
