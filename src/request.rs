//! Read-only view of the request being handled.
//!
//! Field resolution never talks to a web framework directly. Instead the framework adapter
//! implements [`RequestContext`] for its request type, exposing query arguments, form-encoded
//! body values, the parsed structured body and the path segments captured by the matched route.
//! [`SimpleRequest`] is an in-memory implementation used by tests and by callers that already
//! hold decoded request data.

use serde_json::Value;
use url::form_urlencoded;

/// Access to the parts of an inbound request that fields can be sourced from.
pub trait RequestContext {
    /// All values supplied for `name` in the query string, in order of appearance
    fn args(&self, name: &str) -> Vec<String>;

    /// All values supplied for `name` in a form-encoded body, in order of appearance
    fn form(&self, name: &str) -> Vec<String>;

    /// The parsed structured (JSON) body, or `None` when the body is not parseable
    fn json(&self) -> Option<&Value>;

    /// The value captured for `name` by the matched route
    fn view_arg(&self, name: &str) -> Option<Value>;
}

/// In-memory request context
#[derive(Debug, Clone, Default)]
pub struct SimpleRequest {
    args: Vec<(String, String)>,
    form: Vec<(String, String)>,
    json: Option<Value>,
    view_args: Vec<(String, Value)>,
}

impl SimpleRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query string value
    pub fn arg(mut self, name: &str, value: &str) -> Self {
        self.args.push((name.to_string(), value.to_string()));
        self
    }

    /// Append a form-encoded body value
    pub fn form_value(mut self, name: &str, value: &str) -> Self {
        self.form.push((name.to_string(), value.to_string()));
        self
    }

    /// Set the parsed JSON body
    pub fn json_body(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Record a path segment captured by the route
    pub fn path_arg(mut self, name: &str, value: Value) -> Self {
        self.view_args.push((name.to_string(), value));
        self
    }

    /// Build a context from a raw query string such as `page=1&tag=a&tag=b`.
    ///
    /// Keys and values are percent-decoded and `+` reads as a space.
    pub fn from_query(query: &str) -> Self {
        let args = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self {
            args,
            ..Self::default()
        }
    }
}

fn lookup(pairs: &[(String, String)], name: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .collect()
}

impl RequestContext for SimpleRequest {
    fn args(&self, name: &str) -> Vec<String> {
        lookup(&self.args, name)
    }

    fn form(&self, name: &str) -> Vec<String> {
        lookup(&self.form, name)
    }

    fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    fn view_arg(&self, name: &str) -> Option<Value> {
        self.view_args
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }
}
