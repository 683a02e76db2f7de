//! Declarative request field descriptors.
//!
//! A [`FieldSpec`] says where a value lives in the request ([`Source`]), whether it must be
//! present, what to fall back to when it is not, and how to turn the raw value into a checked,
//! typed one. The "how" is an ordered list of [`Step`]s run by a single generic runner, so a
//! bounded integer is simply `[Coerce(Int), Bounds(..)]` and a trimmed, length-limited string is
//! `[Coerce(Str), Length(..)]`.
//!
//! # Example
//!
//! ```
//! use swagger_from_routes::field::{Bounds, FieldSpec, Source};
//! use swagger_from_routes::request::SimpleRequest;
//!
//! let page = FieldSpec::int(Source::Args)
//!     .named("page")
//!     .bounds(Bounds::new().min(1.0))
//!     .optional()
//!     .default_value(serde_json::json!(1));
//!
//! let req = SimpleRequest::from_query("page=3");
//! assert_eq!(page.resolve(&req).unwrap(), serde_json::json!(3));
//! ```

use crate::error::{Error, Result};
use crate::request::RequestContext;
use log::debug;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The request location a field value is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Query string arguments
    Args,
    /// Form-encoded body
    Form,
    /// Structured (JSON) body
    Json,
    /// Path segment captured by the route
    Path,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Args => "args",
            Source::Form => "form",
            Source::Json => "json",
            Source::Path => "path",
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Json
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "args" => Ok(Source::Args),
            "form" => Ok(Source::Form),
            "json" => Ok(Source::Json),
            "path" => Ok(Source::Path),
            "" => Ok(Source::default()),
            other => Err(Error::InvalidSource(other.to_string())),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive type a field value is coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Float,
    Str,
    Bool,
}

impl Primitive {
    /// Name used in conversion error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Str => "str",
            Primitive::Bool => "bool",
        }
    }

    /// Swagger parameter type
    pub fn swagger_type(&self) -> &'static str {
        match self {
            Primitive::Int => "integer",
            Primitive::Float => "number",
            Primitive::Str => "string",
            Primitive::Bool => "boolean",
        }
    }
}

/// Numeric bounds, each edge independently inclusive or exclusive
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub inc_min: bool,
    pub inc_max: bool,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            inc_min: true,
            inc_max: true,
        }
    }
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn exclusive_min(mut self) -> Self {
        self.inc_min = false;
        self
    }

    pub fn exclusive_max(mut self) -> Self {
        self.inc_max = false;
        self
    }

    fn check(&self, name: &str, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }
        let n = value.as_f64().ok_or_else(|| conversion_error(name, "float"))?;

        if let Some(max) = self.max {
            let order = compare_bound(&value, n, max);
            let invalid = if self.inc_max {
                order == Ordering::Greater
            } else {
                order != Ordering::Less
            };
            if invalid {
                return Err(Error::validation(format!(
                    "FIELD {} is limited to max value {} but get {}",
                    name, max, value
                )));
            }
        }
        if let Some(min) = self.min {
            let order = compare_bound(&value, n, min);
            let invalid = if self.inc_min {
                order == Ordering::Less
            } else {
                order != Ordering::Greater
            };
            if invalid {
                return Err(Error::validation(format!(
                    "FIELD {} is limited to min value {} but get {}",
                    name, min, value
                )));
            }
        }
        Ok(value)
    }
}

// integers compare exactly against integral bounds, past the 2^53 limit of f64
fn compare_bound(value: &Value, n: f64, bound: f64) -> Ordering {
    match value.as_i64() {
        Some(i) if bound.fract() == 0.0 && bound.abs() <= i64::MAX as f64 => {
            i128::from(i).cmp(&(bound as i128))
        }
        _ => n.partial_cmp(&bound).unwrap_or(Ordering::Equal),
    }
}

/// Character length limits for string values
#[derive(Debug, Clone, PartialEq)]
pub struct LengthLimit {
    pub min: Option<usize>,
    pub max: Option<usize>,
    /// Strip surrounding whitespace before checking; the stripped value is kept
    pub trim: bool,
}

impl Default for LengthLimit {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            trim: true,
        }
    }
}

impl LengthLimit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    fn check(&self, name: &str, value: Value) -> Result<Value> {
        let s = match value {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => s,
            _ => return Err(conversion_error(name, "str")),
        };
        let s = if self.trim { s.trim().to_string() } else { s };
        let len = s.chars().count();

        if let Some(max) = self.max {
            if len > max {
                return Err(Error::validation(format!(
                    "FIELD {} is limited to max length {} but get {}",
                    name, max, len
                )));
            }
        }
        if let Some(min) = self.min {
            if len < min {
                return Err(Error::validation(format!(
                    "FIELD {} is limited to min length {} but get {}",
                    name, min, len
                )));
            }
        }
        Ok(Value::String(s))
    }
}

/// One stage of a field's processing pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Convert the raw value into a primitive type
    Coerce(Primitive),
    /// Check a numeric value against bounds
    Bounds(Bounds),
    /// Check (and optionally trim) a string's length
    Length(LengthLimit),
    /// Split a comma separated string and run every token through the element field
    EachCsv(Box<FieldSpec>),
}

impl Step {
    fn apply(&self, name: &str, value: Value) -> Result<Value> {
        match self {
            Step::Coerce(primitive) => coerce(name, *primitive, value),
            Step::Bounds(bounds) => bounds.check(name, value),
            Step::Length(limit) => limit.check(name, value),
            Step::EachCsv(element) => match value {
                Value::Null => Ok(Value::Null),
                Value::String(s) => s
                    .split(',')
                    .map(|token| element.process(Value::String(token.to_string())))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array),
                _ => Err(conversion_error(name, "list")),
            },
        }
    }
}

/// A declared request field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    source: Source,
    required: bool,
    default: Value,
    description: String,
    enum_values: Option<Vec<Value>>,
    steps: Vec<Step>,
}

/// Raw lookup result; `Absent` is distinct from an explicit JSON `null`
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Absent,
    Present(Value),
}

impl FieldSpec {
    /// A field with no processing steps
    pub fn raw(source: Source) -> Self {
        Self {
            name: String::new(),
            source,
            required: true,
            default: Value::Null,
            description: String::new(),
            enum_values: None,
            steps: Vec::new(),
        }
    }

    /// Integer field; attach limits with [`FieldSpec::bounds`]
    pub fn int(source: Source) -> Self {
        Self::raw(source).step(Step::Coerce(Primitive::Int))
    }

    /// Float field; attach limits with [`FieldSpec::bounds`]
    pub fn float(source: Source) -> Self {
        Self::raw(source).step(Step::Coerce(Primitive::Float))
    }

    /// String field without length checks or trimming
    pub fn basic_string(source: Source) -> Self {
        Self::raw(source).step(Step::Coerce(Primitive::Str))
    }

    /// String field, trimmed before an (initially unbounded) length check
    pub fn string(source: Source) -> Self {
        Self::basic_string(source).step(Step::Length(LengthLimit::default()))
    }

    pub fn bool(source: Source) -> Self {
        Self::raw(source).step(Step::Coerce(Primitive::Bool))
    }

    /// Comma separated list whose tokens are processed by `element`
    pub fn csv(source: Source, element: FieldSpec) -> Self {
        Self::raw(source).step(Step::EachCsv(Box::new(element)))
    }

    /// Append a processing step
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Set numeric bounds, replacing any bounds step already present
    pub fn bounds(mut self, bounds: Bounds) -> Self {
        match self.steps.iter_mut().find(|s| matches!(s, Step::Bounds(_))) {
            Some(step) => *step = Step::Bounds(bounds),
            None => self.steps.push(Step::Bounds(bounds)),
        }
        self
    }

    /// Set length limits, replacing any length step already present
    pub fn length(mut self, limit: LengthLimit) -> Self {
        match self.steps.iter_mut().find(|s| matches!(s, Step::Length(_))) {
            Some(step) => *step = Step::Length(limit),
            None => self.steps.push(Step::Length(limit)),
        }
        self
    }

    /// Explicit wire name; otherwise the registry key is used
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn optional(self) -> Self {
        self.required(false)
    }

    pub fn default_value(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn enum_values(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_enum_values(&self) -> Option<&[Value]> {
        self.enum_values.as_deref()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The primitive the field coerces into, if any
    pub fn primitive(&self) -> Option<Primitive> {
        self.steps.iter().find_map(|s| match s {
            Step::Coerce(p) => Some(*p),
            _ => None,
        })
    }

    /// Fill in the wire name from the registry key unless one was given explicitly.
    /// List elements without a name inherit the owning field's name.
    pub(crate) fn bind_name(&mut self, key: &str) {
        if self.name.is_empty() {
            self.name = key.to_string();
        }
        let owner = self.name.clone();
        for step in &mut self.steps {
            if let Step::EachCsv(element) = step {
                if element.name.is_empty() {
                    element.name = owner.clone();
                }
            }
        }
    }

    /// Reads, checks and converts this field from the active request.
    ///
    /// The raw value is fetched from the field's [`Source`]. An absent or empty value falls back
    /// to the default (an absent required field is an error); otherwise the value runs through
    /// the processing steps in order.
    ///
    /// # Arguments
    ///
    /// * `req` - The request being handled
    ///
    /// # Returns
    ///
    /// The processed value, the default, or `null` for an optional field without one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the field is required but missing, is supplied more
    /// than once, or fails conversion or a limit check.
    pub fn resolve(&self, req: &dyn RequestContext) -> Result<Value> {
        let raw = self.request_data(req)?;
        let data = match raw {
            RawValue::Present(Value::String(ref s)) if s.is_empty() => None,
            RawValue::Present(value) => Some(value),
            RawValue::Absent => None,
        };

        let data = match data {
            Some(data) => data,
            None => {
                if self.required {
                    return Err(Error::validation(format!("FIELD {} is required", self.name)));
                }
                debug!("Field {} absent, using default", self.name);
                return Ok(self.default.clone());
            }
        };

        let result = self.process(data)?;
        if let Some(allowed) = self.enum_values.as_ref().filter(|v| !v.is_empty()) {
            if self.required && !allowed.iter().any(|v| values_equal(v, &result)) {
                return Err(Error::validation(format!(
                    "FIELD {} must be a value of {}",
                    self.name,
                    Value::Array(allowed.clone())
                )));
            }
        }
        Ok(result)
    }

    /// Run the processing pipeline over an already fetched value
    pub fn process(&self, value: Value) -> Result<Value> {
        self.steps
            .iter()
            .try_fold(value, |value, step| step.apply(&self.name, value))
    }

    fn request_data(&self, req: &dyn RequestContext) -> Result<RawValue> {
        let source = match self.source {
            Source::Path => {
                return Ok(req
                    .view_arg(&self.name)
                    .map_or(RawValue::Absent, RawValue::Present));
            }
            Source::Json => match req.json() {
                Some(body) if !body.is_null() => {
                    return Ok(body
                        .get(&self.name)
                        .cloned()
                        .map_or(RawValue::Absent, RawValue::Present));
                }
                _ => Source::Form,
            },
            other => other,
        };

        let mut values = match source {
            Source::Args => req.args(&self.name),
            _ => req.form(&self.name),
        };
        match values.len() {
            0 => Ok(RawValue::Absent),
            1 => Ok(RawValue::Present(Value::String(values.remove(0)))),
            _ => Err(Error::validation(format!(
                "multi values form field {} is not to be supported!",
                self.name
            ))),
        }
    }
}

fn conversion_error(name: &str, type_name: &str) -> Error {
    Error::validation(format!("FIELD {} cannot be converted to {}", name, type_name))
}

fn coerce(name: &str, primitive: Primitive, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }
    let fail = || conversion_error(name, primitive.type_name());

    match primitive {
        Primitive::Int => {
            let n = match &value {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => i,
                    None => {
                        let f = n.as_f64().ok_or_else(fail)?;
                        if !f.is_finite() || f.abs() >= i64::MAX as f64 {
                            return Err(fail());
                        }
                        f.trunc() as i64
                    }
                },
                Value::String(s) => s.trim().parse::<i64>().map_err(|_| fail())?,
                _ => return Err(fail()),
            };
            Ok(Value::from(n))
        }
        Primitive::Float => {
            let f = match &value {
                Value::Number(n) => n.as_f64().ok_or_else(fail)?,
                Value::String(s) => s.trim().parse::<f64>().map_err(|_| fail())?,
                _ => return Err(fail()),
            };
            Number::from_f64(f).map(Value::Number).ok_or_else(fail)
        }
        Primitive::Str => Ok(match value {
            Value::String(s) => Value::String(s),
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => Value::String(other.to_string()),
        }),
        Primitive::Bool => {
            let b = match &value {
                Value::Bool(b) => *b,
                Value::Number(n) => match n.as_i64() {
                    Some(0) => false,
                    Some(1) => true,
                    _ => return Err(fail()),
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    _ => return Err(fail()),
                },
                _ => return Err(fail()),
            };
            Ok(Value::Bool(b))
        }
    }
}

/// Equality where `1` and `1.0` are the same number
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::SimpleRequest;
    use serde_json::json;

    fn bounded(bounds: Bounds) -> FieldSpec {
        FieldSpec::int(Source::Args).named("count").bounds(bounds)
    }

    fn resolve_arg(field: &FieldSpec, value: &str) -> Result<Value> {
        let req = SimpleRequest::new().arg(field.name(), value);
        field.resolve(&req)
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!("args".parse::<Source>().unwrap(), Source::Args);
        assert_eq!("".parse::<Source>().unwrap(), Source::Json);
        let err = "cookies".parse::<Source>().unwrap_err();
        assert!(matches!(err, Error::InvalidSource(ref s) if s == "cookies"));
    }

    #[test]
    fn test_inclusive_bounds_accept_edges() {
        let field = bounded(Bounds::new().min(1.0).max(10.0));
        assert_eq!(resolve_arg(&field, "1").unwrap(), json!(1));
        assert_eq!(resolve_arg(&field, "10").unwrap(), json!(10));
        assert_eq!(resolve_arg(&field, "5").unwrap(), json!(5));
    }

    #[test]
    fn test_exclusive_bounds_reject_edges() {
        let field = bounded(Bounds::new().min(1.0).max(10.0).exclusive_min().exclusive_max());

        let err = resolve_arg(&field, "10").unwrap_err();
        assert_eq!(err.to_string(), "FIELD count is limited to max value 10 but get 10");
        let err = resolve_arg(&field, "1").unwrap_err();
        assert_eq!(err.to_string(), "FIELD count is limited to min value 1 but get 1");

        assert_eq!(resolve_arg(&field, "9").unwrap(), json!(9));
        assert_eq!(resolve_arg(&field, "2").unwrap(), json!(2));
    }

    #[test]
    fn test_bounds_outside_range() {
        let field = bounded(Bounds::new().max(3.0));
        let err = resolve_arg(&field, "4").unwrap_err();
        assert!(err.to_string().contains("max value 3 but get 4"));
    }

    #[test]
    fn test_float_bounds() {
        let field = FieldSpec::float(Source::Args)
            .named("ratio")
            .bounds(Bounds::new().min(0.0).exclusive_min().max(1.0));
        assert_eq!(resolve_arg(&field, "0.5").unwrap(), json!(0.5));
        assert_eq!(resolve_arg(&field, "1").unwrap(), json!(1.0));
        assert!(resolve_arg(&field, "0").is_err());
    }

    #[test]
    fn test_trim_before_length_check() {
        let field = FieldSpec::string(Source::Args)
            .named("code")
            .length(LengthLimit::new().max(2));
        assert_eq!(resolve_arg(&field, "  ab  ").unwrap(), json!("ab"));

        let untrimmed = field.clone().length(LengthLimit::new().max(2).trim(false));
        let err = resolve_arg(&untrimmed, "  ab  ").unwrap_err();
        assert_eq!(err.to_string(), "FIELD code is limited to max length 2 but get 6");
    }

    #[test]
    fn test_min_length() {
        let field = FieldSpec::string(Source::Args)
            .named("name")
            .length(LengthLimit::new().min(3));
        let err = resolve_arg(&field, " ab ").unwrap_err();
        assert_eq!(err.to_string(), "FIELD name is limited to min length 3 but get 2");
    }

    #[test]
    fn test_required_absent_and_empty() {
        let field = FieldSpec::int(Source::Args).named("page");
        let err = field.resolve(&SimpleRequest::new()).unwrap_err();
        assert_eq!(err.to_string(), "FIELD page is required");
        let err = resolve_arg(&field, "").unwrap_err();
        assert_eq!(err.to_string(), "FIELD page is required");
    }

    #[test]
    fn test_optional_absent_and_empty_yield_default() {
        let field = FieldSpec::int(Source::Args)
            .named("page")
            .optional()
            .default_value(json!("unprocessed"));
        assert_eq!(field.resolve(&SimpleRequest::new()).unwrap(), json!("unprocessed"));
        assert_eq!(resolve_arg(&field, "").unwrap(), json!("unprocessed"));
    }

    #[test]
    fn test_csv_list() {
        let field = FieldSpec::csv(Source::Args, FieldSpec::int(Source::Args).named("id"))
            .named("ids");
        assert_eq!(resolve_arg(&field, "1,2,3").unwrap(), json!([1, 2, 3]));

        let err = resolve_arg(&field, "1,x,3").unwrap_err();
        assert_eq!(err.to_string(), "FIELD id cannot be converted to int");
    }

    #[test]
    fn test_csv_element_inherits_name() {
        let mut field = FieldSpec::csv(Source::Args, FieldSpec::int(Source::Args));
        field.bind_name("ids");
        let err = resolve_arg(&field, "a").unwrap_err();
        assert_eq!(err.to_string(), "FIELD ids cannot be converted to int");
    }

    #[test]
    fn test_multiple_query_values() {
        let field = FieldSpec::basic_string(Source::Args).named("tag");
        let req = SimpleRequest::from_query("tag=a&tag=b");
        let err = field.resolve(&req).unwrap_err();
        assert_eq!(err.to_string(), "multi values form field tag is not to be supported!");

        let req = SimpleRequest::from_query("tag=a");
        assert_eq!(field.resolve(&req).unwrap(), json!("a"));
    }

    #[test]
    fn test_large_integer_bounds() {
        let bounds = Bounds::new().max(9_007_199_254_740_992.0);
        assert!(bounds.check("big", json!(9_007_199_254_740_992_i64)).is_ok());
        assert!(bounds.check("big", json!(9_007_199_254_740_993_i64)).is_err());

        let bounds = Bounds::new().min(9_007_199_254_740_992.0).exclusive_min();
        assert!(bounds.check("big", json!(9_007_199_254_740_992_i64)).is_err());
        assert!(bounds.check("big", json!(9_007_199_254_740_993_i64)).is_ok());
    }

    #[test]
    fn test_encoded_query_value() {
        let field = FieldSpec::basic_string(Source::Args).named("q");
        let req = SimpleRequest::from_query("q=red%20shoes");
        assert_eq!(field.resolve(&req).unwrap(), json!("red shoes"));
    }

    #[test]
    fn test_json_body_falls_back_to_form() {
        let field = FieldSpec::int(Source::Json).named("age");
        let req = SimpleRequest::new().form_value("age", "31");
        assert_eq!(field.resolve(&req).unwrap(), json!(31));

        let req = SimpleRequest::new()
            .form_value("age", "31")
            .json_body(json!({"age": 42}));
        assert_eq!(field.resolve(&req).unwrap(), json!(42));
    }

    #[test]
    fn test_json_null_is_present() {
        let field = FieldSpec::int(Source::Json).named("age").optional().default_value(json!(5));
        let req = SimpleRequest::new().json_body(json!({"age": null}));
        assert_eq!(field.resolve(&req).unwrap(), Value::Null);

        let req = SimpleRequest::new().json_body(json!({"other": 1}));
        assert_eq!(field.resolve(&req).unwrap(), json!(5));
    }

    #[test]
    fn test_path_source() {
        let field = FieldSpec::int(Source::Path).named("item_id");
        let req = SimpleRequest::new().path_arg("item_id", json!(12));
        assert_eq!(field.resolve(&req).unwrap(), json!(12));
    }

    #[test]
    fn test_bool_is_not_an_integer() {
        let field = FieldSpec::int(Source::Json).named("count");
        let req = SimpleRequest::new().json_body(json!({"count": true}));
        let err = field.resolve(&req).unwrap_err();
        assert_eq!(err.to_string(), "FIELD count cannot be converted to int");
    }

    #[test]
    fn test_bool_coercion() {
        let field = FieldSpec::bool(Source::Args).named("active");
        assert_eq!(resolve_arg(&field, "true").unwrap(), json!(true));
        assert_eq!(resolve_arg(&field, "0").unwrap(), json!(false));
        assert!(resolve_arg(&field, "maybe").is_err());
    }

    #[test]
    fn test_int_coercion_from_float_and_whitespace() {
        let field = FieldSpec::int(Source::Json).named("n");
        let req = SimpleRequest::new().json_body(json!({"n": 3.9}));
        assert_eq!(field.resolve(&req).unwrap(), json!(3));

        let field = FieldSpec::int(Source::Args).named("n");
        assert_eq!(resolve_arg(&field, " 7 ").unwrap(), json!(7));
        assert!(resolve_arg(&field, "3.5").is_err());
    }

    #[test]
    fn test_string_coercion_of_numbers() {
        let field = FieldSpec::basic_string(Source::Json).named("code");
        let req = SimpleRequest::new().json_body(json!({"code": 42}));
        assert_eq!(field.resolve(&req).unwrap(), json!("42"));
    }

    #[test]
    fn test_enum_membership() {
        let field = FieldSpec::basic_string(Source::Args)
            .named("order")
            .enum_values(vec![json!("asc"), json!("desc")]);
        assert_eq!(resolve_arg(&field, "asc").unwrap(), json!("asc"));
        let err = resolve_arg(&field, "up").unwrap_err();
        assert_eq!(err.to_string(), r#"FIELD order must be a value of ["asc","desc"]"#);
    }

    #[test]
    fn test_enum_ignored_for_optional_fields() {
        let field = FieldSpec::basic_string(Source::Args)
            .named("order")
            .optional()
            .enum_values(vec![json!("asc")]);
        assert_eq!(resolve_arg(&field, "up").unwrap(), json!("up"));
    }

    #[test]
    fn test_enum_compares_numbers_numerically() {
        let field = FieldSpec::float(Source::Args)
            .named("scale")
            .enum_values(vec![json!(1), json!(2)]);
        assert_eq!(resolve_arg(&field, "2").unwrap(), json!(2.0));
    }

    #[test]
    fn test_bounds_replace_existing_step() {
        let field = FieldSpec::int(Source::Args)
            .bounds(Bounds::new().max(1.0))
            .bounds(Bounds::new().max(5.0));
        assert_eq!(field.steps().len(), 2);
        assert_eq!(field.primitive(), Some(Primitive::Int));
    }
}
