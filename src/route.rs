//! Read interface onto an application's route table.
//!
//! The assembler only needs to enumerate `(rule, methods, endpoint)` triples and read the
//! documentation metadata attached to each handler. Framework adapters implement
//! [`RouteTable`]; [`StaticRouteTable`] is a plain in-memory table.

use crate::error::Result;
use crate::form::FormBinding;
use crate::response::SwaggerResponse;
use crate::schema::SchemaInstance;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Login requirement flag attached to a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Login {
    #[default]
    None,
    Required,
    Optional,
}

/// Documentation metadata of a single handler
#[derive(Debug, Clone, Default)]
pub struct HandlerMeta {
    /// Module the handler is defined in
    pub module: String,
    /// Handler name, unique within its module
    pub name: String,
    /// Documentation text (summary, description, `---` fragment)
    pub doc: Option<String>,
    /// Form bound to the handler
    pub form: Option<FormBinding>,
    /// Responses attached by [`SwaggerResponse`], keyed by status code
    pub responses: Option<Map<String, Value>>,
    pub login: Login,
}

impl HandlerMeta {
    pub fn new(module: &str, name: &str) -> Self {
        Self {
            module: module.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn form(mut self, form: FormBinding) -> Self {
        self.form = Some(form);
        self
    }

    pub fn login(mut self, login: Login) -> Self {
        self.login = login;
        self
    }

    /// Attach a response schema for `status`; the schema is extracted immediately
    pub fn with_response<S: Into<SchemaInstance>>(mut self, schema: S, status: u16) -> Result<Self> {
        SwaggerResponse::new(schema, status).attach(&mut self)?;
        Ok(self)
    }

    /// Qualifier for this handler's schema definitions
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

/// Class-based view exposing one handler per verb
#[derive(Debug, Clone, Default)]
pub struct ClassView {
    pub module: String,
    pub name: String,
    pub tags: Option<Vec<String>>,
    methods: BTreeMap<String, Arc<HandlerMeta>>,
}

impl ClassView {
    pub fn new(module: &str, name: &str) -> Self {
        Self {
            module: module.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Register the handler for `verb`. Missing module/name are filled from the view.
    pub fn method(mut self, verb: &str, mut handler: HandlerMeta) -> Self {
        let verb = verb.to_lowercase();
        if handler.module.is_empty() {
            handler.module = self.module.clone();
        }
        if handler.name.is_empty() {
            handler.name = format!("{}.{}", self.name, verb);
        }
        self.methods.insert(verb, Arc::new(handler));
        self
    }

    /// Handler for a lower-case verb
    pub fn handler(&self, verb: &str) -> Option<&Arc<HandlerMeta>> {
        self.methods.get(verb)
    }
}

/// What a route dispatches to
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// A single handler answering every verb of the route
    Function(Arc<HandlerMeta>),
    Class(Arc<ClassView>),
}

/// A registered route
#[derive(Debug, Clone)]
pub struct Route {
    /// Rule with `<converter:name>` placeholders
    pub rule: String,
    /// Upper-case HTTP verbs
    pub methods: BTreeSet<String>,
    pub endpoint: Endpoint,
}

impl Route {
    pub fn new(rule: &str, methods: &[&str], endpoint: Endpoint) -> Self {
        Self {
            rule: rule.to_string(),
            methods: methods.iter().map(|m| m.to_uppercase()).collect(),
            endpoint,
        }
    }

    pub fn function(rule: &str, methods: &[&str], handler: HandlerMeta) -> Self {
        Self::new(rule, methods, Endpoint::Function(Arc::new(handler)))
    }

    pub fn class(rule: &str, methods: &[&str], view: ClassView) -> Self {
        Self::new(rule, methods, Endpoint::Class(Arc::new(view)))
    }
}

/// Enumerates the routes of an application
pub trait RouteTable {
    fn routes(&self) -> Vec<Route>;

    /// Tags declared at module level, used when neither the fragment nor the view has any
    fn module_tags(&self, _module: &str) -> Option<Vec<String>> {
        None
    }
}

/// In-memory route table
#[derive(Debug, Clone, Default)]
pub struct StaticRouteTable {
    routes: Vec<Route>,
    module_tags: HashMap<String, Vec<String>>,
}

impl StaticRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn set_module_tags(&mut self, module: &str, tags: Vec<String>) {
        self.module_tags.insert(module.to_string(), tags);
    }

    /// Append all routes and module tags of `other`
    pub fn merge(&mut self, other: StaticRouteTable) {
        self.routes.extend(other.routes);
        self.module_tags.extend(other.module_tags);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteTable for StaticRouteTable {
    fn routes(&self) -> Vec<Route> {
        self.routes.clone()
    }

    fn module_tags(&self, module: &str) -> Option<Vec<String>> {
        self.module_tags.get(module).cloned()
    }
}
